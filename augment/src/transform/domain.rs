//! Domain adaptation against reference images.

use super::{check_range, impl_keypoint_transform_for_image_transform, uniform, ImageTransform};
use crate::common::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistogramMatchingInit {
    pub reference_images: Vec<PathBuf>,
    pub blend_ratio: (R64, R64),
}

impl HistogramMatchingInit {
    pub fn new(reference_images: Vec<PathBuf>) -> Self {
        Self {
            reference_images,
            blend_ratio: (r64(0.5), r64(1.0)),
        }
    }

    /// Loads the reference images and builds the transform.
    pub fn build(self) -> Result<HistogramMatching> {
        let Self {
            reference_images,
            blend_ratio,
        } = self;
        let references = reference_images
            .iter()
            .map(|path| -> Result<_> {
                let image = image::open(path)
                    .with_context(|| {
                        format!("failed to load reference image '{}'", path.display())
                    })?
                    .to_rgb8();
                Ok(image)
            })
            .collect::<Result<Vec<_>>>()?;
        info!("loaded {} reference images", references.len());
        HistogramMatching::new(references, blend_ratio)
    }
}

/// Matches the per-channel histogram of the image to a random reference image.
#[derive(Debug, Clone)]
pub struct HistogramMatching {
    references: Arc<Vec<[[f64; 256]; 3]>>,
    blend_ratio: (f64, f64),
}

impl HistogramMatching {
    pub fn new(references: Vec<RgbImage>, blend_ratio: (R64, R64)) -> Result<Self> {
        ensure!(
            !references.is_empty(),
            "at least one reference image is required"
        );
        let blend_ratio = check_range("blend_ratio", blend_ratio)?;
        ensure!(
            blend_ratio.0 >= 0.0 && blend_ratio.1 <= 1.0,
            "blend_ratio must be within range [0.0, 1.0]"
        );
        let references = references
            .iter()
            .map(channel_cdfs)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| format_err!("reference images must not be empty"))?;

        Ok(Self {
            references: Arc::new(references),
            blend_ratio,
        })
    }
}

impl ImageTransform for HistogramMatching {
    fn forward_image(&self, mut image: RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        let source_cdfs = match channel_cdfs(&image) {
            Some(cdfs) => cdfs,
            None => return Ok(image),
        };
        let reference = &self.references[rng.gen_range(0..self.references.len())];
        let blend = uniform(rng, self.blend_ratio);

        let luts: Vec<[u8; 256]> = izip!(&source_cdfs, reference)
            .map(|(source_cdf, reference_cdf)| {
                let mut lut = [0u8; 256];
                lut.iter_mut().enumerate().for_each(|(value, out)| {
                    let quantile = source_cdf[value];
                    let matched = reference_cdf
                        .iter()
                        .position(|&cdf| cdf >= quantile)
                        .unwrap_or(255);
                    let mixed = (1.0 - blend) * value as f64 + blend * matched as f64;
                    *out = mixed.round().clamp(0.0, 255.0) as u8;
                });
                lut
            })
            .collect();

        image.pixels_mut().for_each(|pixel| {
            pixel
                .0
                .iter_mut()
                .zip(&luts)
                .for_each(|(value, lut)| *value = lut[*value as usize]);
        });
        Ok(image)
    }
}

impl_keypoint_transform_for_image_transform!(HistogramMatching);

/// Cumulative distributions of the three channels, or `None` for an empty image.
fn channel_cdfs(image: &RgbImage) -> Option<[[f64; 256]; 3]> {
    let num_pixels = (image.width() * image.height()) as f64;
    if num_pixels == 0.0 {
        return None;
    }

    let mut histograms = [[0usize; 256]; 3];
    image.pixels().for_each(|pixel| {
        pixel
            .0
            .iter()
            .zip(histograms.iter_mut())
            .for_each(|(&value, histogram)| histogram[value as usize] += 1);
    });

    let cdfs = histograms.map(|histogram| {
        let mut cdf = [0.0; 256];
        let mut acc = 0;
        histogram
            .iter()
            .zip(cdf.iter_mut())
            .for_each(|(&count, out)| {
                acc += count;
                *out = acc as f64 / num_pixels;
            });
        cdf
    });
    Some(cdfs)
}
