use anyhow::{Context, Result};
use augment::{Augmentation, Config};
use clap::Parser;
use log::info;
use prettytable::{cell, row, Table};
use rand::{rngs::StdRng, SeedableRng};
use sample::Sample;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
enum Opts {
    /// Print the parsed configuration.
    Info {
        /// configuration file
        config_file: PathBuf,
    },
    /// Write augmented copies of an annotated sample.
    Preview {
        /// configuration file
        config_file: PathBuf,
        /// input annotation file
        annotation_file: PathBuf,
        /// output directory
        output_dir: PathBuf,
        /// number of augmented copies
        #[clap(long, default_value = "8")]
        count: usize,
        /// random seed, overriding the one in the configuration
        #[clap(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Opts::parse() {
        Opts::Info { config_file } => {
            info(config_file)?;
        }
        Opts::Preview {
            config_file,
            annotation_file,
            output_dir,
            count,
            seed,
        } => {
            preview(config_file, annotation_file, output_dir, count, seed)?;
        }
    }

    Ok(())
}

fn info(config_file: impl AsRef<Path>) -> Result<()> {
    let config = Config::open(config_file)?;
    let augment = &config.augment;
    let augmentation = Augmentation::from_config(augment)?;

    let mut table = Table::new();
    table.add_row(row!["key", "value"]);
    table.add_row(row!["name", config.name]);
    table.add_row(row![
        "seed",
        config
            .seed
            .map(|seed| seed.to_string())
            .unwrap_or_else(|| "(entropy)".to_string())
    ]);
    table.add_row(row!["enabled", augment.enabled]);
    table.add_row(row!["prob", augment.prob]);
    augment.background_images.iter().for_each(|path| {
        table.add_row(row!["background image", path.display()]);
    });
    augment.domain_images.iter().for_each(|path| {
        table.add_row(row!["domain image", path.display()]);
    });
    table.add_row(row!["identity", augmentation.is_identity()]);
    table.printstd();

    Ok(())
}

fn preview(
    config_file: impl AsRef<Path>,
    annotation_file: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    count: usize,
    seed: Option<u64>,
) -> Result<()> {
    let annotation_file = annotation_file.as_ref();
    let output_dir = output_dir.as_ref();

    let config = Config::open(config_file)?;
    let augmentation = Augmentation::from_config(&config.augment)?;
    let sample: Sample<String> = Sample::load(annotation_file)?;
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            output_dir.display()
        )
    })?;

    let mut rng = match seed.or(config.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let stem = annotation_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("sample");

    let mut table = Table::new();
    table.add_row(row!["index", "annotation", "width", "height", "boxes"]);
    table.add_row(row![
        "input",
        annotation_file.display(),
        sample.image().width(),
        sample.image().height(),
        sample.len()
    ]);

    for index in 0..count {
        let output = augmentation.forward(&sample, &mut rng)?;
        let image_file = output_dir.join(format!("{}-{}.png", stem, index));
        let output_file = output_dir.join(format!("{}-{}.json", stem, index));
        output.save(&image_file, &output_file)?;

        table.add_row(row![
            index,
            output_file.display(),
            output.image().width(),
            output.image().height(),
            output.len()
        ]);
    }

    info!(
        "wrote {} augmented samples to '{}'",
        count,
        output_dir.display()
    );
    table.printstd();

    Ok(())
}
