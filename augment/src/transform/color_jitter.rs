//! The random color distortion algorithms in HSV space.

use super::{
    check_range, color::map_pixels, impl_keypoint_transform_for_image_transform, ImageTransform,
};
use crate::common::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ColorJitterInit {
    pub hue_shift: Option<R64>,
    pub saturation_shift: Option<R64>,
    pub value_shift: Option<R64>,
}

impl ColorJitterInit {
    pub fn build(self) -> Result<ColorJitter> {
        let Self {
            hue_shift,
            saturation_shift,
            value_shift,
        } = self;

        let check = |name: &str, value: Option<R64>| -> Result<_> {
            value
                .map(|value| {
                    ensure!(value >= 0.0, "{} must be non-negative", name);
                    Ok(value.raw())
                })
                .transpose()
        };

        Ok(ColorJitter {
            max_hue_shift: check("hue_shift", hue_shift)?,
            max_saturation_shift: check("saturation_shift", saturation_shift)?,
            max_value_shift: check("value_shift", value_shift)?,
        })
    }
}

/// Shifts hue, saturation and value by random offsets.
#[derive(Debug, Clone)]
pub struct ColorJitter {
    max_hue_shift: Option<f64>,
    max_saturation_shift: Option<f64>,
    max_value_shift: Option<f64>,
}

impl ImageTransform for ColorJitter {
    fn forward_image(&self, image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let mut shift = |max_shift: Option<f64>| match max_shift {
            Some(max_shift) if max_shift > 0.0 => rng.gen_range((-max_shift)..=max_shift),
            _ => 0.0,
        };
        let hue_shift = shift(self.max_hue_shift);
        let saturation_shift = shift(self.max_saturation_shift);
        let value_shift = shift(self.max_value_shift);

        Ok(map_pixels(image, |rgb| {
            let [hue, saturation, value] = rgb_to_hsv(rgb);
            let hue = (hue + hue_shift + 1.0).rem_euclid(1.0);
            let saturation = (saturation + saturation_shift).clamp(0.0, 1.0);
            let value = (value + value_shift).clamp(0.0, 1.0);
            hsv_to_rgb([hue, saturation, value])
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RandomDistortInit {
    pub hue_shift: Option<R64>,
    pub saturation_scale: Option<(R64, R64)>,
    pub value_scale: Option<(R64, R64)>,
}

impl RandomDistortInit {
    pub fn build(self) -> Result<RandomDistort> {
        let Self {
            hue_shift,
            saturation_scale,
            value_scale,
        } = self;

        let max_hue_shift = hue_shift
            .map(|val| {
                ensure!(val >= 0.0, "hue_shift must be non-negative");
                Ok(val.raw())
            })
            .transpose()?;
        let check_scale = |name: &str, scale: Option<(R64, R64)>| -> Result<_> {
            scale
                .map(|(lo, up)| {
                    ensure!(lo >= 0.0, "{} min must be non-negative", name);
                    check_range(name, (lo, up))
                })
                .transpose()
        };

        Ok(RandomDistort {
            max_hue_shift,
            saturation_scale: check_scale("saturation_scale", saturation_scale)?,
            value_scale: check_scale("value_scale", value_scale)?,
        })
    }
}

/// Shifts hue and scales saturation and value by random factors.
#[derive(Debug, Clone)]
pub struct RandomDistort {
    max_hue_shift: Option<f64>,
    saturation_scale: Option<(f64, f64)>,
    value_scale: Option<(f64, f64)>,
}

impl ImageTransform for RandomDistort {
    fn forward_image(&self, image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let hue_shift = match self.max_hue_shift {
            Some(max_shift) if max_shift > 0.0 => rng.gen_range((-max_shift)..=max_shift),
            _ => 0.0,
        };
        let saturation_scale = self
            .saturation_scale
            .map(|range| super::uniform(rng, range))
            .unwrap_or(1.0);
        let value_scale = self
            .value_scale
            .map(|range| super::uniform(rng, range))
            .unwrap_or(1.0);

        Ok(map_pixels(image, |rgb| {
            let [hue, saturation, value] = rgb_to_hsv(rgb);
            let hue = (hue + hue_shift).rem_euclid(1.0);
            let saturation = (saturation * saturation_scale).clamp(0.0, 1.0);
            let value = (value * value_scale).clamp(0.0, 1.0);
            hsv_to_rgb([hue, saturation, value])
        }))
    }
}

impl_keypoint_transform_for_image_transform!(ColorJitter, RandomDistort);

/// Converts RGB in `[0, 1]` to HSV with all components in `[0, 1]`.
pub fn rgb_to_hsv([r, g, b]: [f64; 3]) -> [f64; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta <= 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let saturation = if max <= 0.0 { 0.0 } else { delta / max };
    [hue, saturation, max]
}

/// Converts HSV in `[0, 1]` back to RGB in `[0, 1]`.
pub fn hsv_to_rgb([hue, saturation, value]: [f64; 3]) -> [f64; 3] {
    let chroma = value * saturation;
    let sector = hue.rem_euclid(1.0) * 6.0;
    let x = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let offset = value - chroma;

    let [r, g, b] = match sector as u32 {
        0 => [chroma, x, 0.0],
        1 => [x, chroma, 0.0],
        2 => [0.0, chroma, x],
        3 => [0.0, x, chroma],
        4 => [x, 0.0, chroma],
        _ => [chroma, 0.0, x],
    };
    [r + offset, g + offset, b + offset]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::tests::gradient_image;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hsv_round_trip() {
        let colors = [
            [1.0, 0.0, 0.0],
            [0.2, 0.6, 0.4],
            [0.9, 0.9, 0.1],
            [0.3, 0.1, 0.8],
            [0.5, 0.5, 0.5],
            [0.0, 0.0, 0.0],
        ];
        colors.iter().for_each(|&rgb| {
            let recovered = hsv_to_rgb(rgb_to_hsv(rgb));
            rgb.iter()
                .zip(recovered.iter())
                .for_each(|(lhs, rhs)| assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-9));
        });
    }

    #[test]
    fn color_jitter_without_shifts_preserves_image() {
        let jitter = ColorJitterInit::default().build().unwrap();
        let image = gradient_image(16, 8);
        let mut rng = StdRng::seed_from_u64(3);
        let output = jitter.forward_image(image.clone(), &mut rng).unwrap();
        assert_eq!(output, image);
    }

    #[test]
    fn random_distort_rejects_bad_ranges() {
        let init = RandomDistortInit {
            saturation_scale: Some((r64(1.5), r64(0.5))),
            ..Default::default()
        };
        assert!(init.build().is_err());

        let init = ColorJitterInit {
            value_shift: Some(r64(-0.1)),
            ..Default::default()
        };
        assert!(init.build().is_err());
    }
}
