//! Image quality degradations.

use super::{
    check_range,
    color_jitter::{hsv_to_rgb, rgb_to_hsv},
    impl_keypoint_transform_for_image_transform, standard_normal, uniform, ImageTransform,
};
use crate::common::*;
use image::imageops::FilterType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlurInit {
    pub sigma: (R64, R64),
}

impl Default for BlurInit {
    fn default() -> Self {
        Self {
            sigma: (r64(0.5), r64(1.5)),
        }
    }
}

impl BlurInit {
    pub fn build(self) -> Result<Blur> {
        let sigma = check_range("sigma", self.sigma)?;
        ensure!(sigma.0 > 0.0, "sigma must be positive");
        Ok(Blur { sigma })
    }
}

/// Gaussian blur with a random sigma.
#[derive(Debug, Clone)]
pub struct Blur {
    sigma: (f64, f64),
}

impl ImageTransform for Blur {
    fn forward_image(&self, image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let sigma = uniform(rng, self.sigma);
        Ok(imageops::blur(&image, sigma as f32))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownscaleInit {
    pub scale: (R64, R64),
}

impl Default for DownscaleInit {
    fn default() -> Self {
        Self {
            scale: (r64(0.25), r64(0.25)),
        }
    }
}

impl DownscaleInit {
    pub fn build(self) -> Result<Downscale> {
        let scale = check_range("scale", self.scale)?;
        ensure!(
            scale.0 > 0.0 && scale.1 < 1.0,
            "scale must be within range (0.0, 1.0)"
        );
        Ok(Downscale { scale })
    }
}

/// Shrinks the image and scales it back with linear interpolation.
#[derive(Debug, Clone)]
pub struct Downscale {
    scale: (f64, f64),
}

impl ImageTransform for Downscale {
    fn forward_image(&self, image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        let scale = uniform(rng, self.scale);
        let small_w = ((width as f64 * scale).round() as u32).max(1);
        let small_h = ((height as f64 * scale).round() as u32).max(1);
        let small = imageops::resize(&image, small_w, small_h, FilterType::Triangle);
        Ok(imageops::resize(&small, width, height, FilterType::Triangle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GaussNoiseInit {
    /// The range of noise variance in squared pixel levels.
    pub var_limit: (R64, R64),
}

impl Default for GaussNoiseInit {
    fn default() -> Self {
        Self {
            var_limit: (r64(10.0), r64(50.0)),
        }
    }
}

impl GaussNoiseInit {
    pub fn build(self) -> Result<GaussNoise> {
        let var_limit = check_range("var_limit", self.var_limit)?;
        ensure!(var_limit.0 >= 0.0, "var_limit must be non-negative");
        Ok(GaussNoise { var_limit })
    }
}

/// Adds per-channel gaussian noise.
#[derive(Debug, Clone)]
pub struct GaussNoise {
    var_limit: (f64, f64),
}

impl ImageTransform for GaussNoise {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let std = uniform(rng, self.var_limit).sqrt();
        image.pixels_mut().for_each(|pixel| {
            pixel.0 = pixel.0.map(|value| {
                let noisy = value as f64 + std * standard_normal(rng);
                noisy.round().clamp(0.0, 255.0) as u8
            });
        });
        Ok(image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaltAndPepperInit {
    /// The range of the fraction of corrupted pixels.
    pub amount: (R64, R64),
}

impl Default for SaltAndPepperInit {
    fn default() -> Self {
        Self {
            amount: (r64(0.05), r64(0.15)),
        }
    }
}

impl SaltAndPepperInit {
    pub fn build(self) -> Result<SaltAndPepper> {
        let amount = check_range("amount", self.amount)?;
        ensure!(
            amount.0 >= 0.0 && amount.1 <= 1.0,
            "amount must be within range [0.0, 1.0]"
        );
        Ok(SaltAndPepper { amount })
    }
}

/// Sets random pixels to pure black or white.
#[derive(Debug, Clone)]
pub struct SaltAndPepper {
    amount: (f64, f64),
}

impl ImageTransform for SaltAndPepper {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let amount = uniform(rng, self.amount);
        image.pixels_mut().for_each(|pixel| {
            if rng.gen::<f64>() < amount {
                let value = if rng.gen::<bool>() { 255 } else { 0 };
                *pixel = Rgb([value; 3]);
            }
        });
        Ok(image)
    }
}

/// Zeroes each pixel independently with probability `dropout_prob`.
#[derive(Debug, Clone)]
pub struct PixelDropout {
    pub dropout_prob: f64,
}

impl Default for PixelDropout {
    fn default() -> Self {
        Self { dropout_prob: 0.01 }
    }
}

impl ImageTransform for PixelDropout {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        image.pixels_mut().for_each(|pixel| {
            if rng.gen::<f64>() < self.dropout_prob {
                *pixel = Rgb([0; 3]);
            }
        });
        Ok(image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MedianBlurInit {
    /// The range of odd kernel sizes.
    pub blur_limit: (u32, u32),
}

impl Default for MedianBlurInit {
    fn default() -> Self {
        Self { blur_limit: (3, 7) }
    }
}

impl MedianBlurInit {
    pub fn build(self) -> Result<MedianBlur> {
        let (lo, hi) = self.blur_limit;
        ensure!(lo <= hi, "blur_limit min ({}) must not exceed max ({})", lo, hi);
        ensure!(
            lo >= 3 && lo % 2 == 1 && hi % 2 == 1,
            "blur_limit must be odd numbers not less than 3"
        );
        Ok(MedianBlur {
            kernel_sizes: (lo..=hi).step_by(2).collect(),
        })
    }
}

/// Replaces each channel value by the median of its square neighborhood.
#[derive(Debug, Clone)]
pub struct MedianBlur {
    kernel_sizes: Vec<u32>,
}

impl MedianBlur {
    pub fn blur(image: &RgbImage, kernel_size: u32) -> RgbImage {
        let (width, height) = image.dimensions();
        let radius = (kernel_size / 2) as i64;
        let clamp = |value: i64, size: u32| value.clamp(0, size as i64 - 1) as u32;
        let mut window = Vec::with_capacity((kernel_size * kernel_size) as usize);

        RgbImage::from_fn(width, height, |x, y| {
            let mut pixel = [0u8; 3];
            pixel.iter_mut().enumerate().for_each(|(channel, out)| {
                window.clear();
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        let sx = clamp(x as i64 + dx, width);
                        let sy = clamp(y as i64 + dy, height);
                        window.push(image.get_pixel(sx, sy).0[channel]);
                    }
                }
                window.sort_unstable();
                *out = window[window.len() / 2];
            });
            Rgb(pixel)
        })
    }
}

impl ImageTransform for MedianBlur {
    fn forward_image(&self, image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let kernel_size = match self.kernel_sizes.choose(rng) {
            Some(&kernel_size) => kernel_size,
            None => return Ok(image),
        };
        Ok(Self::blur(&image, kernel_size))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultiplicativeNoiseInit {
    /// The range of multipliers.
    pub multiplier: (R64, R64),
    /// Draw a multiplier for each value instead of one for the image.
    pub elementwise: bool,
}

impl Default for MultiplicativeNoiseInit {
    fn default() -> Self {
        Self {
            multiplier: (r64(0.9), r64(1.1)),
            elementwise: false,
        }
    }
}

impl MultiplicativeNoiseInit {
    pub fn build(self) -> Result<MultiplicativeNoise> {
        let multiplier = check_range("multiplier", self.multiplier)?;
        ensure!(multiplier.0 >= 0.0, "multiplier must be non-negative");
        Ok(MultiplicativeNoise {
            multiplier,
            elementwise: self.elementwise,
        })
    }
}

/// Multiplies channel values by random factors.
#[derive(Debug, Clone)]
pub struct MultiplicativeNoise {
    multiplier: (f64, f64),
    elementwise: bool,
}

impl ImageTransform for MultiplicativeNoise {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let global = uniform(rng, self.multiplier);
        image.pixels_mut().for_each(|pixel| {
            pixel.0 = pixel.0.map(|value| {
                let factor = if self.elementwise {
                    uniform(rng, self.multiplier)
                } else {
                    global
                };
                (value as f64 * factor).round().clamp(0.0, 255.0) as u8
            });
        });
        Ok(image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IsoNoiseInit {
    /// The range of hue noise scale.
    pub color_shift: (R64, R64),
    /// The range of overall noise strength.
    pub intensity: (R64, R64),
}

impl Default for IsoNoiseInit {
    fn default() -> Self {
        Self {
            color_shift: (r64(0.01), r64(0.05)),
            intensity: (r64(0.1), r64(0.5)),
        }
    }
}

impl IsoNoiseInit {
    pub fn build(self) -> Result<IsoNoise> {
        let color_shift = check_range("color_shift", self.color_shift)?;
        let intensity = check_range("intensity", self.intensity)?;
        ensure!(color_shift.0 >= 0.0, "color_shift must be non-negative");
        ensure!(intensity.0 >= 0.0, "intensity must be non-negative");
        Ok(IsoNoise {
            color_shift,
            intensity,
        })
    }
}

/// Camera sensor noise: gaussian hue jitter plus brightness noise scaled by
/// the spread of the image brightness.
#[derive(Debug, Clone)]
pub struct IsoNoise {
    color_shift: (f64, f64),
    intensity: (f64, f64),
}

impl ImageTransform for IsoNoise {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let num_pixels = (image.width() * image.height()) as f64;
        if num_pixels == 0.0 {
            return Ok(image);
        }
        let color_shift = uniform(rng, self.color_shift);
        let intensity = uniform(rng, self.intensity);

        let to_unit = |pixel: &Rgb<u8>| pixel.0.map(|value| value as f64 / 255.0);
        let mean = image.pixels().map(|pixel| rgb_to_hsv(to_unit(pixel))[2]).sum::<f64>() / num_pixels;
        let var = image
            .pixels()
            .map(|pixel| (rgb_to_hsv(to_unit(pixel))[2] - mean).powi(2))
            .sum::<f64>()
            / num_pixels;
        // poisson counts approximated by a normal of equal mean and variance
        let lambda = var.sqrt() * intensity * 255.0;

        image.pixels_mut().for_each(|pixel| {
            let [hue, saturation, value] = rgb_to_hsv(to_unit(pixel));
            let hue = hue + standard_normal(rng) * color_shift * intensity;
            let counts = (lambda + lambda.sqrt() * standard_normal(rng)).max(0.0);
            let value = (value + counts / 255.0 * (1.0 - value)).clamp(0.0, 1.0);
            let rgb = hsv_to_rgb([hue.rem_euclid(1.0), saturation, value]);
            *pixel = Rgb(rgb.map(|value| (value * 255.0).round().clamp(0.0, 255.0) as u8));
        });
        Ok(image)
    }
}

impl_keypoint_transform_for_image_transform!(
    Blur,
    Downscale,
    GaussNoise,
    SaltAndPepper,
    PixelDropout,
    MedianBlur,
    MultiplicativeNoise,
    IsoNoise,
);
