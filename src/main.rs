use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

mod pipeline;

use pipeline::PipelineConfig;

#[derive(Parser)]
#[command(name = "phishnet")]
#[command(about = "Train, evaluate and export a random-forest phishing URL classifier")]
#[command(version)]
struct Cli {
    /// Path to the training CSV
    #[arg(long, default_value = "../ml/dataset/dataset_training.csv")]
    data: PathBuf,

    /// Directory receiving the checkpoint, ONNX graph and metadata
    #[arg(long, default_value = "../ml/model")]
    model_dir: PathBuf,

    /// RNG seed for the split and the forest
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long)]
    verbose: bool,

    /// Suppress all logging except errors
    #[arg(long)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let config = PipelineConfig::new(&cli.data, &cli.model_dir, cli.seed);
    let report = pipeline::run(&config)?;
    print!("{report}");

    let artifacts = &report.artifacts;
    info!(
        checkpoint = %artifacts.checkpoint.display(),
        onnx = %artifacts.onnx.display(),
        metadata = %artifacts.metadata.display(),
        "run complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_uses_fixed_paths() {
        let cli = Cli::try_parse_from(["phishnet"]).unwrap();
        assert_eq!(cli.data, PathBuf::from("../ml/dataset/dataset_training.csv"));
        assert_eq!(cli.model_dir, PathBuf::from("../ml/model"));
        assert_eq!(cli.seed, 42);
        assert!(cli.threads.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "phishnet", "--data", "urls.csv", "--model-dir", "out", "--seed", "7", "--threads",
            "2", "--quiet",
        ])
        .unwrap();
        assert_eq!(cli.data, PathBuf::from("urls.csv"));
        assert_eq!(cli.model_dir, PathBuf::from("out"));
        assert_eq!(cli.seed, 7);
        assert_eq!(cli.threads, Some(2));
        assert!(cli.quiet && !cli.verbose);
    }
}
