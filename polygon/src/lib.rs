//! Polygon and point geometry used by the augmentation pipeline.

mod common;

pub use point::*;
pub mod point;

pub use polygon::*;
pub mod polygon;

pub use hw::*;
pub mod hw;

pub use transform::*;
mod transform;

pub use affine::*;
pub mod affine;
