//! Keypoint transforms and their combinators.

use crate::{common::*, KeypointData, Ratio};

pub mod color;
pub mod color_jitter;
pub mod degrade;
pub mod domain;
pub mod geometric;
pub mod random_affine;

pub use color::*;
pub use color_jitter::*;
pub use degrade::*;
pub use domain::*;
pub use geometric::*;
pub use random_affine::*;

/// A random transform on an image and its keypoints.
pub trait KeypointTransform: Debug + Send + Sync {
    fn forward(&self, data: KeypointData, rng: &mut StdRng) -> Result<KeypointData>;
}

/// A random transform that only changes pixel values.
///
/// Keypoints pass through untouched.
pub trait ImageTransform: Debug + Send + Sync {
    fn forward_image(&self, image: RgbImage, rng: &mut StdRng) -> Result<RgbImage>;
}

macro_rules! impl_keypoint_transform_for_image_transform {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::transform::KeypointTransform for $ty {
                fn forward(
                    &self,
                    data: $crate::KeypointData,
                    rng: &mut ::rand::rngs::StdRng,
                ) -> ::anyhow::Result<$crate::KeypointData> {
                    let $crate::KeypointData {
                        image,
                        keypoints,
                        box_mapping,
                    } = data;
                    let image = $crate::transform::ImageTransform::forward_image(self, image, rng)?;
                    Ok($crate::KeypointData {
                        image,
                        keypoints,
                        box_mapping,
                    })
                }
            }
        )*
    };
}
pub(crate) use impl_keypoint_transform_for_image_transform;

impl<T> KeypointTransform for Box<T>
where
    T: KeypointTransform + ?Sized,
{
    fn forward(&self, data: KeypointData, rng: &mut StdRng) -> Result<KeypointData> {
        (**self).forward(data, rng)
    }
}

/// Returns the input unchanged.
#[derive(Debug, Clone, Default)]
pub struct Identity;

impl KeypointTransform for Identity {
    fn forward(&self, data: KeypointData, _rng: &mut StdRng) -> Result<KeypointData> {
        Ok(data)
    }
}

/// Post-processing options applied on keypoints after a [Compose].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeypointParams {
    /// Drop keypoints that land outside of the image.
    pub remove_invisible: bool,
}

/// Applies a list of transforms in order.
#[derive(Debug)]
pub struct Compose {
    transforms: Vec<Box<dyn KeypointTransform>>,
    params: KeypointParams,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn KeypointTransform>>, params: KeypointParams) -> Self {
        Self { transforms, params }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn params(&self) -> &KeypointParams {
        &self.params
    }
}

impl KeypointTransform for Compose {
    fn forward(&self, data: KeypointData, rng: &mut StdRng) -> Result<KeypointData> {
        let data = self
            .transforms
            .iter()
            .try_fold(data, |data, transform| -> Result<_> {
                let data = transform.forward(data, rng)?;
                data.validate()
                    .with_context(|| format!("invalid output from transform {:?}", transform))?;
                Ok(data)
            })?;

        let data = if self.params.remove_invisible {
            data.remove_invisible()
        } else {
            data
        };
        Ok(data)
    }
}

/// Picks one of the child transforms uniformly with probability `prob`.
#[derive(Debug)]
pub struct OneOf {
    transforms: Vec<Box<dyn KeypointTransform>>,
    prob: Ratio,
}

impl OneOf {
    pub fn new(transforms: Vec<Box<dyn KeypointTransform>>, prob: Ratio) -> Self {
        Self { transforms, prob }
    }
}

impl KeypointTransform for OneOf {
    fn forward(&self, data: KeypointData, rng: &mut StdRng) -> Result<KeypointData> {
        if self.transforms.is_empty() || !self.prob.sample(rng) {
            return Ok(data);
        }
        let index = rng.gen_range(0..self.transforms.len());
        self.transforms[index].forward(data, rng)
    }
}

/// Applies the child transform with probability `prob`.
#[derive(Debug)]
pub struct Sometimes {
    transform: Box<dyn KeypointTransform>,
    prob: Ratio,
}

impl Sometimes {
    pub fn new(transform: Box<dyn KeypointTransform>, prob: Ratio) -> Self {
        Self { transform, prob }
    }
}

impl KeypointTransform for Sometimes {
    fn forward(&self, data: KeypointData, rng: &mut StdRng) -> Result<KeypointData> {
        if self.prob.sample(rng) {
            self.transform.forward(data, rng)
        } else {
            Ok(data)
        }
    }
}

/// Samples a value uniformly from the closed interval `[lo, hi]`.
pub(crate) fn uniform<R>(rng: &mut R, (lo, hi): (f64, f64)) -> f64
where
    R: Rng + ?Sized,
{
    if lo >= hi {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

/// Draws a standard normal sample by the Box-Muller method.
pub(crate) fn standard_normal<R>(rng: &mut R) -> f64
where
    R: Rng + ?Sized,
{
    // gen::<f64>() is in [0, 1), so 1 - u lies in (0, 1]
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Ensures a `(min, max)` pair is ordered and finite.
pub(crate) fn check_range(name: &str, (lo, hi): (R64, R64)) -> Result<(f64, f64)> {
    ensure!(
        lo <= hi,
        "{} min ({}) must not exceed {} max ({})",
        name,
        lo,
        name,
        hi
    );
    Ok((lo.raw(), hi.raw()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn gradient_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) % 256) as u8,
            ])
        })
    }

    pub(crate) fn square_data(width: u32, height: u32) -> KeypointData {
        let (w, h) = (width as f64, height as f64);
        KeypointData::new(
            gradient_image(width, height),
            vec![
                Point::new(0.25 * w, 0.25 * h),
                Point::new(0.75 * w, 0.25 * h),
                Point::new(0.75 * w, 0.75 * h),
                Point::new(0.25 * w, 0.75 * h),
            ],
            vec![0, 0, 0, 0],
        )
        .unwrap()
    }

    #[derive(Debug)]
    struct ShiftRight(f64);

    impl KeypointTransform for ShiftRight {
        fn forward(&self, data: KeypointData, _rng: &mut StdRng) -> Result<KeypointData> {
            Ok(data.map_keypoints(&Affine::translation(self.0, 0.0)))
        }
    }

    #[test]
    fn compose_applies_in_order_and_removes_invisible() {
        let compose = Compose::new(
            vec![Box::new(ShiftRight(4.0)), Box::new(ShiftRight(4.0))],
            KeypointParams {
                remove_invisible: true,
            },
        );
        let mut rng = StdRng::seed_from_u64(0);
        let output = compose.forward(square_data(16, 16), &mut rng).unwrap();
        // the two right corners end up at x = 20 and get removed
        assert_eq!(output.keypoints.len(), 2);
        assert_eq!(output.box_mapping, vec![0, 0]);
        assert_eq!(output.keypoints[0], Point::new(12.0, 4.0));
    }

    #[test]
    fn one_of_and_sometimes_respect_probability() {
        let mut rng = StdRng::seed_from_u64(1);
        let never = OneOf::new(vec![Box::new(ShiftRight(1.0))], Ratio::zero());
        let input = square_data(8, 8);
        assert_eq!(never.forward(input.clone(), &mut rng).unwrap(), input);

        let always = Sometimes::new(Box::new(ShiftRight(1.0)), Ratio::one());
        let output = always.forward(input.clone(), &mut rng).unwrap();
        assert_eq!(output.keypoints[0], Point::new(3.0, 2.0));

        let empty = OneOf::new(vec![], Ratio::one());
        assert_eq!(empty.forward(input.clone(), &mut rng).unwrap(), input);
    }

    #[test]
    fn uniform_handles_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(uniform(&mut rng, (0.5, 0.5)), 0.5);
        let value = uniform(&mut rng, (-1.0, 1.0));
        assert!((-1.0..=1.0).contains(&value));
        assert!(check_range("scale", (r64(2.0), r64(1.0))).is_err());
    }

    #[test]
    fn standard_normal_moments() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples: Vec<f64> = (0..20000).map(|_| standard_normal(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }
}
