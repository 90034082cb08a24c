//! The random affine transformation on images and keypoints.

use super::{uniform, KeypointTransform};
use crate::{common::*, KeypointData};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RandomAffineInit {
    /// The maximum rotation angle in degrees.
    pub rotate_degrees: Option<R64>,
    /// The maximum translation in ratio of image size.
    pub translation: Option<R64>,
    /// The pair of minimum and maximum scaling ratio.
    pub scale: Option<(R64, R64)>,
    /// The maximum shear angle in degrees.
    pub shear_degrees: Option<R64>,
    #[serde(default)]
    pub horizontal_flip: bool,
    #[serde(default)]
    pub vertical_flip: bool,
    /// Enlarge the canvas so that the whole transformed image stays visible.
    #[serde(default)]
    pub fit_output: bool,
}

impl RandomAffineInit {
    pub fn build(self) -> Result<RandomAffine> {
        let Self {
            rotate_degrees,
            translation,
            scale,
            shear_degrees,
            horizontal_flip,
            vertical_flip,
            fit_output,
        } = self;

        let rotate_radians = rotate_degrees
            .map(|val| {
                ensure!(val >= 0.0, "rotate_degrees must be non-negative");
                Ok(val.raw().to_radians())
            })
            .transpose()?;
        let translation = translation
            .map(|val| {
                ensure!(val >= 0.0, "translation must be non-negative");
                Ok(val.raw())
            })
            .transpose()?;
        let scale = scale
            .map(|(lo, up)| {
                ensure!(lo > 0.0, "scale min must be positive");
                ensure!(up > 0.0, "scale max must be positive");
                ensure!(lo <= up, "scale min must not exceed scale max");
                Ok((lo.raw(), up.raw()))
            })
            .transpose()?;
        let shear_radians = shear_degrees
            .map(|val| {
                ensure!(
                    (0.0..90.0).contains(&val.raw()),
                    "shear_degrees must be within range [0.0, 90.0)"
                );
                Ok(val.raw().to_radians())
            })
            .transpose()?;

        Ok(RandomAffine {
            rotate_radians,
            translation,
            scale,
            shear_radians,
            horizontal_flip,
            vertical_flip,
            fit_output,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RandomAffine {
    rotate_radians: Option<f64>,
    translation: Option<f64>,
    scale: Option<(f64, f64)>,
    shear_radians: Option<f64>,
    horizontal_flip: bool,
    vertical_flip: bool,
    fit_output: bool,
}

impl RandomAffine {
    /// Samples a transform for an image of `width` by `height` pixels.
    pub fn sample_transform(&self, width: f64, height: f64, rng: &mut StdRng) -> Affine {
        let mut transform = Affine::identity();
        if self.horizontal_flip && rng.gen::<bool>() {
            transform = transform.then(&Affine::horizontal_flip(width));
        }
        if self.vertical_flip && rng.gen::<bool>() {
            transform = transform.then(&Affine::vertical_flip(height));
        }

        // scale, shear and rotate around the image center
        let mut linear = Affine::identity();
        if let Some((lower, upper)) = self.scale {
            let ratio = uniform(rng, (lower, upper));
            linear = linear.then(&Affine::scaling(ratio, ratio));
        }
        if let Some(max_shear) = self.shear_radians {
            let shear_x = uniform(rng, (-max_shear, max_shear));
            let shear_y = uniform(rng, (-max_shear, max_shear));
            linear = linear.then(&Affine::shear(shear_x, shear_y));
        }
        if let Some(max_radians) = self.rotate_radians {
            let angle = uniform(rng, (-max_radians, max_radians));
            linear = linear.then(&Affine::rotation(angle));
        }
        transform = transform.then(&linear.about(width / 2.0, height / 2.0));

        if let Some(max_translation) = self.translation {
            let tx = uniform(rng, (-max_translation, max_translation)) * width;
            let ty = uniform(rng, (-max_translation, max_translation)) * height;
            transform = transform.then(&Affine::translation(tx, ty));
        }

        transform
    }
}

impl KeypointTransform for RandomAffine {
    fn forward(&self, data: KeypointData, rng: &mut StdRng) -> Result<KeypointData> {
        let (width, height) = data.image.dimensions();
        ensure!(
            width > 0 && height > 0,
            "cannot apply affine transform on an empty image"
        );
        let transform = self.sample_transform(width as f64, height as f64, rng);

        let (transform, out_w, out_h) = if self.fit_output {
            fit_canvas(&transform, width as f64, height as f64)?
        } else {
            (transform, width, height)
        };

        let KeypointData {
            image,
            keypoints,
            box_mapping,
        } = data;
        let image = warp_affine(&image, &transform, out_w, out_h)?;
        let output = KeypointData {
            image,
            keypoints,
            box_mapping,
        }
        .map_keypoints(&transform);
        Ok(output)
    }
}

/// Moves the transformed image to the origin and computes the canvas size
/// enclosing it.
fn fit_canvas(transform: &Affine, width: f64, height: f64) -> Result<(Affine, u32, u32)> {
    let frame = Polygon::from(vec![[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]]);
    let (min, max) = transform
        .apply_polygon(&frame)
        .bounds()
        .ok_or_else(|| format_err!("the image frame has no corners"))?;

    let transform = transform.then(&Affine::translation(-min.x, -min.y));
    let out_w = ((max.x - min.x).round() as u32).max(1);
    let out_h = ((max.y - min.y).round() as u32).max(1);
    Ok((transform, out_w, out_h))
}

/// Resamples `image` under `transform` with bilinear interpolation.
///
/// Coordinates are continuous: pixel `(i, j)` covers `[i, i + 1) x [j, j + 1)`.
/// Samples falling outside the source image are black.
pub fn warp_affine(image: &RgbImage, transform: &Affine, out_w: u32, out_h: u32) -> Result<RgbImage> {
    let inverse = transform.inverse()?;
    let (width, height) = image.dimensions();
    let (width, height) = (width as i64, height as i64);

    let fetch = |x: i64, y: i64| -> [f64; 3] {
        if x < 0 || y < 0 || x >= width || y >= height {
            [0.0; 3]
        } else {
            image.get_pixel(x as u32, y as u32).0.map(|value| value as f64)
        }
    };

    let output = RgbImage::from_fn(out_w, out_h, |u, v| {
        let [src_x, src_y] = inverse.apply_xy(u as f64 + 0.5, v as f64 + 0.5);
        let (src_x, src_y) = (src_x - 0.5, src_y - 0.5);
        let x0 = src_x.floor();
        let y0 = src_y.floor();
        let fx = src_x - x0;
        let fy = src_y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let neighbors = [
            (fetch(x0, y0), (1.0 - fx) * (1.0 - fy)),
            (fetch(x0 + 1, y0), fx * (1.0 - fy)),
            (fetch(x0, y0 + 1), (1.0 - fx) * fy),
            (fetch(x0 + 1, y0 + 1), fx * fy),
        ];
        let mut pixel = [0.0; 3];
        neighbors.iter().for_each(|(value, weight)| {
            pixel
                .iter_mut()
                .zip(value)
                .for_each(|(out, value)| *out += value * weight);
        });
        Rgb(pixel.map(|value| value.round().clamp(0.0, 255.0) as u8))
    });

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::tests::{gradient_image, square_data};
    use approx::assert_abs_diff_eq;

    #[test]
    fn random_affine_without_params_is_identity() {
        let affine = RandomAffineInit::default().build().unwrap();
        let mut rng = StdRng::seed_from_u64(14);
        let input = square_data(20, 10);
        let output = affine.forward(input.clone(), &mut rng).unwrap();
        assert_eq!(output.image, input.image);
        izip!(&output.keypoints, &input.keypoints).for_each(|(lhs, rhs)| {
            assert_abs_diff_eq!(lhs.x, rhs.x, epsilon = 1e-9);
            assert_abs_diff_eq!(lhs.y, rhs.y, epsilon = 1e-9);
        });
    }

    #[test]
    fn random_affine_rejects_bad_params() {
        let init = RandomAffineInit {
            scale: Some((r64(1.2), r64(0.8))),
            ..Default::default()
        };
        assert!(init.build().is_err());
        let init = RandomAffineInit {
            rotate_degrees: Some(r64(-5.0)),
            ..Default::default()
        };
        assert!(init.build().is_err());
        let init = RandomAffineInit {
            shear_degrees: Some(r64(90.0)),
            ..Default::default()
        };
        assert!(init.build().is_err());
    }

    #[test]
    fn random_affine_keypoints_follow_pixels() {
        let mut image = RgbImage::new(9, 7);
        image.put_pixel(2, 1, Rgb([255, 255, 255]));
        let data = KeypointData::new(image, vec![Point::new(2.5, 1.5)], vec![0]).unwrap();

        let affine = RandomAffineInit {
            horizontal_flip: true,
            vertical_flip: true,
            ..Default::default()
        }
        .build()
        .unwrap();

        let mut rng = StdRng::seed_from_u64(15);
        (0..8).for_each(|_| {
            let output = affine.forward(data.clone(), &mut rng).unwrap();
            let point = output.keypoints[0];
            let pixel = output
                .image
                .get_pixel(point.x.floor() as u32, point.y.floor() as u32);
            assert_eq!(pixel, &Rgb([255, 255, 255]));
        });
    }

    #[test]
    fn fit_output_contains_rotated_image() {
        let affine = RandomAffineInit {
            rotate_degrees: Some(r64(30.0)),
            scale: Some((r64(0.5), r64(1.0))),
            fit_output: true,
            ..Default::default()
        }
        .build()
        .unwrap();

        let mut rng = StdRng::seed_from_u64(16);
        (0..8).for_each(|_| {
            let mut data = square_data(40, 20);
            data.keypoints = vec![
                Point::new(0.0, 0.0),
                Point::new(40.0, 0.0),
                Point::new(40.0, 20.0),
                Point::new(0.0, 20.0),
            ];
            let output = affine.forward(data, &mut rng).unwrap();
            let (width, height) = output.image.dimensions();
            output.keypoints.iter().for_each(|point| {
                assert!(point.x >= -1e-6 && point.x <= width as f64 + 0.5);
                assert!(point.y >= -1e-6 && point.y <= height as f64 + 0.5);
            });
        });
    }

    #[test]
    fn fit_canvas_encloses_rotated_frame() {
        let transform = Affine::rotation(std::f64::consts::FRAC_PI_2).about(20.0, 10.0);
        let (transform, out_w, out_h) = fit_canvas(&transform, 40.0, 20.0).unwrap();
        assert_eq!((out_w, out_h), (20, 40));
        let [x, y] = transform.apply_xy(0.0, 0.0);
        assert!((0.0..=20.0 + 1e-9).contains(&x));
        assert!((-1e-9..=40.0 + 1e-9).contains(&y));
    }

    #[test]
    fn warp_affine_translation() {
        let image = gradient_image(6, 4);
        let output = warp_affine(&image, &Affine::translation(1.0, 0.0), 6, 4).unwrap();
        assert_eq!(output.get_pixel(3, 2), image.get_pixel(2, 2));
        assert_eq!(output.get_pixel(0, 2), &Rgb([0, 0, 0]));
        assert!(warp_affine(&image, &Affine::scaling(0.0, 1.0), 6, 4).is_err());
    }
}
