//! The annotated image type passed through the augmentation pipeline.

mod common;

pub use annotation::*;
pub mod annotation;

pub use sample::*;
mod sample;
