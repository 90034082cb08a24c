//! The sample augmentation callable and its default pipeline.

use crate::{
    codec::{decode, encode},
    common::*,
    config::AugmentConfig,
    transform::*,
    Ratio,
};

/// Applies a keypoint transform on samples.
///
/// Each call encodes the sample into keypoints, runs the transform and
/// decodes the result into a new sample. The input sample is not modified.
#[derive(Debug)]
pub struct Augmentation {
    transform: Option<Box<dyn KeypointTransform>>,
}

impl Augmentation {
    pub fn new<T>(transform: T) -> Self
    where
        T: 'static + KeypointTransform,
    {
        Self {
            transform: Some(Box::new(transform)),
        }
    }

    /// An augmentation that returns a copy of its input.
    pub fn identity() -> Self {
        Self { transform: None }
    }

    /// Builds the default pipeline from a configuration.
    pub fn from_config(config: &AugmentConfig) -> Result<Self> {
        let AugmentConfig {
            enabled,
            ref background_images,
            ref domain_images,
            prob,
        } = *config;

        if !enabled {
            info!("augmentation is disabled");
            return Ok(Self::identity());
        }
        if !background_images.is_empty() {
            warn!(
                "{} background images are configured, but background compositing is not supported",
                background_images.len()
            );
        }

        let transform = default_transform(prob, domain_images)?;
        info!(
            "built default augmentation with {} blocks and probability {}",
            transform.len(),
            prob
        );
        Ok(Self::new(transform))
    }

    pub fn is_identity(&self) -> bool {
        self.transform.is_none()
    }

    /// Produces an augmented copy of `sample`.
    pub fn forward<C>(&self, sample: &Sample<C>, rng: &mut StdRng) -> Result<Sample<C>>
    where
        C: Clone,
    {
        let transform = match &self.transform {
            Some(transform) => transform,
            None => {
                sample.validate()?;
                return Ok(sample.clone());
            }
        };

        let inputs = encode(sample)?;
        let outputs = transform.forward(inputs, rng)?;
        let output = decode(sample, outputs)?;
        debug!(
            "augmented sample with {} boxes into {} boxes",
            sample.len(),
            output.len()
        );
        Ok(output)
    }
}

/// Builds the default augmentation pipeline.
///
/// It runs a color effect, a degradation and a geometric transform, each
/// picked from a list and applied with probability `prob`. When reference
/// images are given, a domain adaptation block is appended. Keypoints
/// leaving the image are kept.
pub fn default_transform(prob: Ratio, domain_images: &[PathBuf]) -> Result<Compose> {
    let color: Vec<Box<dyn KeypointTransform>> = vec![
        Box::new(RandomBrightnessContrastInit::default().build()?),
        Box::new(InvertImg),
        Box::new(ToGray),
        Box::new(Equalize),
        Box::new(ChannelDropout::default()),
        Box::new(ChannelShuffle),
        Box::new(Solarize::default()),
        Box::new(ToSepia),
        Box::new(
            ColorJitterInit {
                hue_shift: Some(r64(0.2)),
                saturation_shift: Some(r64(0.2)),
                value_shift: Some(r64(0.2)),
            }
            .build()?,
        ),
        Box::new(RandomGammaInit::default().build()?),
        Box::new(RgbShiftInit::default().build()?),
    ];

    let degrade: Vec<Box<dyn KeypointTransform>> = vec![
        Box::new(PixelDropout::default()),
        Box::new(DownscaleInit::default().build()?),
        Box::new(BlurInit::default().build()?),
        Box::new(GaussNoiseInit::default().build()?),
        Box::new(SaltAndPepperInit::default().build()?),
        Box::new(MedianBlurInit::default().build()?),
        Box::new(IsoNoiseInit::default().build()?),
        Box::new(MultiplicativeNoiseInit::default().build()?),
    ];

    let geometric: Vec<Box<dyn KeypointTransform>> = vec![
        Box::new(
            RandomAffineInit {
                rotate_degrees: Some(r64(30.0)),
                scale: Some((r64(0.4), r64(1.0))),
                fit_output: true,
                ..Default::default()
            }
            .build()?,
        ),
        Box::new(RandomRotate90),
        Box::new(Transpose),
    ];

    let mut blocks: Vec<Box<dyn KeypointTransform>> = vec![
        Box::new(OneOf::new(color, prob)),
        Box::new(OneOf::new(degrade, prob)),
        Box::new(OneOf::new(geometric, prob)),
    ];

    if !domain_images.is_empty() {
        let matching = HistogramMatchingInit::new(domain_images.to_vec()).build()?;
        let domain: Vec<Box<dyn KeypointTransform>> = vec![Box::new(matching)];
        blocks.push(Box::new(OneOf::new(domain, prob)));
    }

    Ok(Compose::new(
        blocks,
        KeypointParams {
            remove_invisible: false,
        },
    ))
}
