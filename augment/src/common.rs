pub use anyhow::{ensure, format_err, Context as _, Error, Result};
pub use approx::AbsDiffEq;
pub use image::{imageops, Rgb, RgbImage};
pub use itertools::{izip, Itertools as _};
pub use log::{debug, info, warn};
pub use noisy_float::prelude::*;
pub use polygon::{Affine, Point, Polygon, HW};
pub use rand::{prelude::*, rngs::StdRng};
pub use sample::Sample;
pub use serde::{
    de::Error as _, Deserialize, Deserializer, Serialize, Serializer,
};
pub use std::{
    fmt::{self, Debug, Display, Formatter},
    path::{Path, PathBuf},
};
