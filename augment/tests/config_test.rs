use anyhow::Result;
use augment::{Augmentation, Config};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAMES: &[&str] = &["default.json5", "disabled.json5", "background.json5"];

lazy_static::lazy_static! {
    static ref CONFIG_DIR: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cfg");
    static ref CONFIG_FILES: Vec<PathBuf> = {
        CONFIG_FILE_NAMES.iter().map(|file_name| CONFIG_DIR.join(file_name)).collect()
    };
}

#[test]
fn config_files_build_augmentations() -> Result<()> {
    CONFIG_FILES.iter().try_for_each(|path| -> Result<_> {
        let config = Config::open(path)?;
        let _augmentation = Augmentation::from_config(&config.augment)?;
        Ok(())
    })?;
    Ok(())
}

#[test]
fn config_fields() -> Result<()> {
    let config = Config::open(CONFIG_DIR.join("default.json5"))?;
    assert_eq!(config.name, "default");
    assert_eq!(config.seed, Some(42));
    assert!(config.augment.enabled);
    assert_eq!(config.augment.prob, 0.5);

    let config = Config::open(CONFIG_DIR.join("disabled.json5"))?;
    assert_eq!(config.name, "disabled");
    assert_eq!(config.seed, None);
    assert!(Augmentation::from_config(&config.augment)?.is_identity());

    let config = Config::open(CONFIG_DIR.join("background.json5"))?;
    assert_eq!(
        config.augment.background_images,
        vec![
            CONFIG_DIR.join("backgrounds/street.png"),
            PathBuf::from("/data/backgrounds/room.png"),
        ]
    );
    Ok(())
}

#[test]
fn missing_domain_image_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("domain.json5");
    std::fs::write(
        &path,
        "{ augment: { enabled: true, domain_images: ['missing.png'] } }",
    )?;
    let config = Config::open(&path)?;
    assert!(Augmentation::from_config(&config.augment).is_err());
    Ok(())
}
