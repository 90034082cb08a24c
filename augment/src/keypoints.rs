//! The flattened keypoint form of a sample.

use crate::common::*;

/// An image with a flat list of pixel-space keypoints.
///
/// `box_mapping[i]` is the index of the polygon owning `keypoints[i]`.
/// Transforms may move keypoints, and may drop a keypoint only together with
/// its mapping entry.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointData {
    pub image: RgbImage,
    pub keypoints: Vec<Point<f64>>,
    pub box_mapping: Vec<usize>,
}

impl KeypointData {
    pub fn new(image: RgbImage, keypoints: Vec<Point<f64>>, box_mapping: Vec<usize>) -> Result<Self> {
        let data = Self {
            image,
            keypoints,
            box_mapping,
        };
        data.validate()?;
        Ok(data)
    }

    /// Checks that every keypoint has exactly one owner.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.keypoints.len() == self.box_mapping.len(),
            "the number of keypoints ({}) does not match the box mapping length ({})",
            self.keypoints.len(),
            self.box_mapping.len()
        );
        Ok(())
    }

    /// The image size in pixels.
    pub fn size(&self) -> HW<f64> {
        let (w, h) = self.image.dimensions();
        HW::from_hw([h as f64, w as f64])
    }

    /// Applies a coordinate transform to every keypoint.
    pub fn map_keypoints(mut self, transform: &Affine) -> Self {
        self.keypoints
            .iter_mut()
            .for_each(|point| *point = transform.apply(point));
        self
    }

    /// Drops keypoints lying outside the image together with their mapping.
    pub fn remove_invisible(self) -> Self {
        let size = self.size();
        let Self {
            image,
            keypoints,
            box_mapping,
        } = self;
        let (keypoints, box_mapping): (Vec<_>, Vec<_>) = keypoints
            .into_iter()
            .zip(box_mapping)
            .filter(|(point, _)| {
                (0.0..=size.w()).contains(&point.x) && (0.0..=size.h()).contains(&point.y)
            })
            .unzip();

        Self {
            image,
            keypoints,
            box_mapping,
        }
    }
}
