use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use stereo_patches::{DatasetBuilder, DatasetConfig};

#[derive(Parser, Debug)]
#[command(
    name = "stereo-patches",
    about = "Convert a stereo dataset with ground-truth disparity into labeled patch pairs"
)]
struct Args {
    /// Dataset root containing image_2/, image_3/ and disp_noc_0/.
    dataset_root: PathBuf,
    /// Output directory; recreated, then filled with train/ and test/ stores.
    output_dir: PathBuf,
    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the negative offset draws.
    #[arg(long)]
    seed: Option<u64>,
    /// Sampling stride in pixels.
    #[arg(long)]
    stride: Option<usize>,
    /// Fraction of disparity maps assigned to the train partition.
    #[arg(long)]
    train_fraction: Option<f64>,
    /// Abort on the first unreadable triple.
    #[arg(long)]
    strict: bool,
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => DatasetConfig::load(path)?,
        None => DatasetConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(stride) = args.stride {
        cfg.stride = stride;
    }
    if let Some(fraction) = args.train_fraction {
        cfg.train_fraction = fraction;
    }
    cfg.strict |= args.strict;
    let builder = DatasetBuilder::new(cfg)?;

    let output = args.output_dir.as_path();
    if output.exists() {
        log::info!("removing existing output {}", output.display());
        fs::remove_dir_all(output)
            .with_context(|| format!("removing output dir {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("creating output dir {}", output.display()))?;

    let report = builder
        .build(&args.dataset_root, output)
        .with_context(|| format!("building dataset from {}", args.dataset_root.display()))?;

    let summary_path = output.join("summary.json");
    let json = serde_json::to_vec_pretty(&report)?;
    fs::write(&summary_path, json)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    for partition in &report.partitions {
        println!(
            "{}: {} records from {} triples ({} skipped) -> {}",
            partition.kind,
            partition.records,
            partition.triples,
            partition.skipped_triples.len(),
            partition.store.display()
        );
    }
    if report.skipped_triples() > 0 {
        println!("skipped triples:");
        for partition in &report.partitions {
            for skipped in &partition.skipped_triples {
                println!(" - {}: {}", skipped.disparity.display(), skipped.reason);
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    if let Err(e) = run(args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
