//! Pixel-wise color effects.

use super::{check_range, impl_keypoint_transform_for_image_transform, uniform, ImageTransform};
use crate::common::*;

/// Applies `f` on every pixel with channels scaled to `[0, 1]`.
pub(crate) fn map_pixels<F>(mut image: RgbImage, f: F) -> RgbImage
where
    F: Fn([f64; 3]) -> [f64; 3],
{
    image.pixels_mut().for_each(|pixel| {
        let Rgb([r, g, b]) = *pixel;
        let rgb = f([r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0]);
        *pixel = Rgb(rgb.map(to_u8));
    });
    image
}

/// Applies a lookup table on every channel value.
pub(crate) fn map_lut(mut image: RgbImage, lut: &[u8; 256]) -> RgbImage {
    image.pixels_mut().for_each(|pixel| {
        pixel.0 = pixel.0.map(|value| lut[value as usize]);
    });
    image
}

pub(crate) fn to_u8(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomBrightnessContrastInit {
    pub brightness_limit: R64,
    pub contrast_limit: R64,
}

impl Default for RandomBrightnessContrastInit {
    fn default() -> Self {
        Self {
            brightness_limit: r64(0.2),
            contrast_limit: r64(0.2),
        }
    }
}

impl RandomBrightnessContrastInit {
    pub fn build(self) -> Result<RandomBrightnessContrast> {
        let Self {
            brightness_limit,
            contrast_limit,
        } = self;
        ensure!(
            brightness_limit >= 0.0,
            "brightness_limit must be non-negative"
        );
        ensure!(contrast_limit >= 0.0, "contrast_limit must be non-negative");
        Ok(RandomBrightnessContrast {
            brightness_limit: brightness_limit.raw(),
            contrast_limit: contrast_limit.raw(),
        })
    }
}

/// Computes `alpha * pixel + beta` with random contrast `alpha` and brightness `beta`.
#[derive(Debug, Clone)]
pub struct RandomBrightnessContrast {
    brightness_limit: f64,
    contrast_limit: f64,
}

impl ImageTransform for RandomBrightnessContrast {
    fn forward_image(&self, image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let alpha = 1.0 + uniform(rng, (-self.contrast_limit, self.contrast_limit));
        let beta = uniform(rng, (-self.brightness_limit, self.brightness_limit));
        Ok(map_pixels(image, |rgb| rgb.map(|value| alpha * value + beta)))
    }
}

/// Inverts every channel value.
#[derive(Debug, Clone, Default)]
pub struct InvertImg;

impl ImageTransform for InvertImg {
    fn forward_image(&self, mut image: RgbImage, _rng: &mut StdRng) -> Result<RgbImage> {
        imageops::invert(&mut image);
        Ok(image)
    }
}

/// Replaces colors by their luma.
#[derive(Debug, Clone, Default)]
pub struct ToGray;

impl ImageTransform for ToGray {
    fn forward_image(&self, image: RgbImage, _rng: &mut StdRng) -> Result<RgbImage> {
        Ok(map_pixels(image, |[r, g, b]| {
            let luma = 0.299 * r + 0.587 * g + 0.114 * b;
            [luma; 3]
        }))
    }
}

/// Applies the classic sepia tone matrix.
#[derive(Debug, Clone, Default)]
pub struct ToSepia;

impl ImageTransform for ToSepia {
    fn forward_image(&self, image: RgbImage, _rng: &mut StdRng) -> Result<RgbImage> {
        Ok(map_pixels(image, |[r, g, b]| {
            [
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
            ]
        }))
    }
}

/// Inverts channel values at or above `threshold`.
#[derive(Debug, Clone)]
pub struct Solarize {
    pub threshold: u8,
}

impl Default for Solarize {
    fn default() -> Self {
        Self { threshold: 128 }
    }
}

impl ImageTransform for Solarize {
    fn forward_image(&self, image: RgbImage, _rng: &mut StdRng) -> Result<RgbImage> {
        let mut lut = [0u8; 256];
        lut.iter_mut().enumerate().for_each(|(value, out)| {
            let value = value as u8;
            *out = if value >= self.threshold {
                255 - value
            } else {
                value
            };
        });
        Ok(map_lut(image, &lut))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomGammaInit {
    /// The gamma range in percents.
    pub gamma_limit: (R64, R64),
}

impl Default for RandomGammaInit {
    fn default() -> Self {
        Self {
            gamma_limit: (r64(80.0), r64(120.0)),
        }
    }
}

impl RandomGammaInit {
    pub fn build(self) -> Result<RandomGamma> {
        let (lo, hi) = check_range("gamma_limit", self.gamma_limit)?;
        ensure!(lo > 0.0, "gamma_limit must be positive");
        Ok(RandomGamma {
            gamma_range: (lo / 100.0, hi / 100.0),
        })
    }
}

/// Raises normalized channel values to a random power.
#[derive(Debug, Clone)]
pub struct RandomGamma {
    gamma_range: (f64, f64),
}

impl ImageTransform for RandomGamma {
    fn forward_image(&self, image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let gamma = uniform(rng, self.gamma_range);
        let mut lut = [0u8; 256];
        lut.iter_mut().enumerate().for_each(|(value, out)| {
            *out = to_u8((value as f64 / 255.0).powf(gamma));
        });
        Ok(map_lut(image, &lut))
    }
}

/// Randomly permutes the RGB channels.
#[derive(Debug, Clone, Default)]
pub struct ChannelShuffle;

impl ImageTransform for ChannelShuffle {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let mut order = [0, 1, 2];
        order.shuffle(rng);
        image.pixels_mut().for_each(|pixel| {
            let channels = pixel.0;
            pixel.0 = order.map(|index| channels[index]);
        });
        Ok(image)
    }
}

/// Fills one random channel with `fill_value`.
#[derive(Debug, Clone, Default)]
pub struct ChannelDropout {
    pub fill_value: u8,
}

impl ImageTransform for ChannelDropout {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let channel = rng.gen_range(0..3);
        image
            .pixels_mut()
            .for_each(|pixel| pixel.0[channel] = self.fill_value);
        Ok(image)
    }
}

/// Equalizes the histogram of each channel.
#[derive(Debug, Clone, Default)]
pub struct Equalize;

impl ImageTransform for Equalize {
    fn forward_image(&self, mut image: RgbImage, _rng: &mut StdRng) -> Result<RgbImage> {
        let num_pixels = (image.width() * image.height()) as usize;
        if num_pixels == 0 {
            return Ok(image);
        }

        for channel in 0..3 {
            let mut histogram = [0usize; 256];
            image
                .pixels()
                .for_each(|pixel| histogram[pixel.0[channel] as usize] += 1);

            let cdf_min = histogram.iter().copied().find(|&count| count > 0).unwrap_or(0);
            let denom = num_pixels - cdf_min;
            if denom == 0 {
                continue;
            }

            let mut lut = [0u8; 256];
            let mut cdf = 0;
            histogram
                .iter()
                .zip(lut.iter_mut())
                .for_each(|(&count, out)| {
                    cdf += count;
                    let value = cdf.saturating_sub(cdf_min) as f64 / denom as f64;
                    *out = to_u8(value);
                });

            image
                .pixels_mut()
                .for_each(|pixel| pixel.0[channel] = lut[pixel.0[channel] as usize]);
        }

        Ok(image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbShiftInit {
    /// The maximum shift of the red channel in pixel levels.
    pub r_shift_limit: R64,
    pub g_shift_limit: R64,
    pub b_shift_limit: R64,
}

impl Default for RgbShiftInit {
    fn default() -> Self {
        Self {
            r_shift_limit: r64(20.0),
            g_shift_limit: r64(20.0),
            b_shift_limit: r64(20.0),
        }
    }
}

impl RgbShiftInit {
    pub fn build(self) -> Result<RgbShift> {
        let limits = [self.r_shift_limit, self.g_shift_limit, self.b_shift_limit];
        ensure!(
            limits.iter().all(|&limit| limit >= 0.0),
            "channel shift limits must be non-negative"
        );
        Ok(RgbShift {
            limits: limits.map(|limit| limit.raw()),
        })
    }
}

/// Adds a random offset to each channel.
#[derive(Debug, Clone)]
pub struct RgbShift {
    limits: [f64; 3],
}

impl ImageTransform for RgbShift {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let shifts = self.limits.map(|limit| uniform(rng, (-limit, limit)));
        let luts = shifts.map(|shift| {
            let mut lut = [0u8; 256];
            lut.iter_mut().enumerate().for_each(|(value, out)| {
                *out = (value as f64 + shift).round().clamp(0.0, 255.0) as u8;
            });
            lut
        });
        image.pixels_mut().for_each(|pixel| {
            izip!(pixel.0.iter_mut(), &luts).for_each(|(value, lut)| {
                *value = lut[*value as usize];
            });
        });
        Ok(image)
    }
}

impl_keypoint_transform_for_image_transform!(
    RandomBrightnessContrast,
    RgbShift,
    InvertImg,
    ToGray,
    ToSepia,
    Solarize,
    RandomGamma,
    ChannelShuffle,
    ChannelDropout,
    Equalize,
);
