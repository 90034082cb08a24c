//! Augmentation configuration format.

use crate::{common::*, Ratio};

/// The main configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The configuration name. Defaults to the file stem.
    pub name: String,
    pub augment: AugmentConfig,
    /// The random seed. Sampled from entropy if not set.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    name: Option<String>,
    augment: AugmentConfig,
    #[serde(default)]
    seed: Option<u64>,
}

impl Config {
    /// Reads a JSON5 configuration file.
    ///
    /// Relative image paths are resolved against the directory containing
    /// the file.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let RawConfig {
            name,
            mut augment,
            seed,
        } = json5::from_str(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;

        let name = match name {
            Some(name) => name,
            None => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| {
                    format_err!("cannot derive config name from '{}'", path.display())
                })?
                .to_owned(),
        };

        if let Some(dir) = path.parent() {
            augment.resolve_paths(dir);
        }

        Ok(Self {
            name,
            augment,
            seed,
        })
    }
}

/// Augmentation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    pub enabled: bool,
    /// Background images for compositing. Accepted but currently unused.
    #[serde(default)]
    pub background_images: Vec<PathBuf>,
    /// Reference images for domain adaptation.
    #[serde(default)]
    pub domain_images: Vec<PathBuf>,
    /// The probability of applying each augmentation block.
    #[serde(default = "default_prob")]
    pub prob: Ratio,
}

impl AugmentConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            background_images: vec![],
            domain_images: vec![],
            prob: default_prob(),
        }
    }

    fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        };
        self.background_images.iter_mut().for_each(resolve);
        self.domain_images.iter_mut().for_each(resolve);
    }
}

fn default_prob() -> Ratio {
    Ratio::new_clamped(r64(0.3333))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Write;

    #[test]
    fn augment_config_defaults() {
        let config: AugmentConfig = json5::from_str("{ enabled: true }").unwrap();
        assert!(config.enabled);
        assert!(config.background_images.is_empty());
        assert!(config.domain_images.is_empty());
        assert_abs_diff_eq!(config.prob, 0.3333);
    }

    #[test]
    fn augment_config_rejects_bad_prob() {
        let result: Result<AugmentConfig, _> = json5::from_str("{ enabled: true, prob: 1.5 }");
        assert!(result.is_err());
    }

    #[test]
    fn config_name_defaults_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-run.json5");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "{{ augment: {{ enabled: true, domain_images: ['ref.png'] }}, // comment\n seed: 7 }}"
        )
        .unwrap();

        let config = Config::open(&path).unwrap();
        assert_eq!(config.name, "my-run");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.augment.domain_images, vec![dir.path().join("ref.png")]);
    }
}
