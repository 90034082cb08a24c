//! Keypoint-based augmentation of annotated polygon samples.
//!
//! A [Sample] is flattened into [KeypointData] by [encode], processed by a
//! [KeypointTransform](transform::KeypointTransform), and regrouped into a
//! new sample by [decode]. [Augmentation] bundles the three steps.

mod common;

pub mod augmentation;
pub mod codec;
pub mod config;
pub mod keypoints;
pub mod ratio;
pub mod transform;

pub use augmentation::*;
pub use codec::*;
pub use config::*;
pub use keypoints::*;
pub use ratio::*;
pub use sample::Sample;
