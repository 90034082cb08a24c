pub use anyhow::{ensure, Context as _, Result};
pub use getset::Getters;
pub use image::RgbImage;
pub use log::{debug, info};
pub use polygon::{Polygon, HW};
pub use serde::{de::DeserializeOwned, Deserialize, Serialize};
pub use std::path::{Path, PathBuf};
