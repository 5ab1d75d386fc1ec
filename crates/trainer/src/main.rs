//! Inspecta training CLI
//!
//! Builds features, trains the boosted-tree classifier and writes a
//! submission for the test inspections.

use anyhow::{Context, Result};
use clap::Parser;
use inspecta_trainer::TrainerConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "inspecta-train")]
#[command(author = "Inspecta Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspection pass prediction: feature pipeline and GBDT trainer", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Training inspections CSV
    #[arg(long)]
    train: Option<PathBuf>,

    /// Test inspections CSV
    #[arg(long)]
    test: Option<PathBuf>,

    /// Violations CSV
    #[arg(long)]
    violations: Option<PathBuf>,

    /// Venues CSV
    #[arg(long)]
    venues: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of boosting trees
    #[arg(long)]
    trees: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum samples per leaf
    #[arg(long)]
    min_samples_leaf: Option<usize>,

    /// Learning rate (fixed-point, e.g., 100000 = 0.1)
    #[arg(long)]
    learning_rate: Option<i64>,

    /// Seed for the train/validation split
    #[arg(long)]
    seed: Option<u64>,

    /// Share of labelled inspections held out for validation
    #[arg(long)]
    validation_fraction: Option<f64>,

    /// Also write the training feature matrix as CSV
    #[arg(long)]
    dump_features: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut TrainerConfig) {
        if let Some(path) = &self.train {
            config.data.train = path.clone();
        }
        if let Some(path) = &self.test {
            config.data.test = path.clone();
        }
        if let Some(path) = &self.violations {
            config.data.violations = path.clone();
        }
        if let Some(path) = &self.venues {
            config.data.venues = path.clone();
        }
        if let Some(dir) = &self.output {
            config.output.dir = dir.clone();
        }
        if let Some(trees) = self.trees {
            config.model.num_trees = trees;
        }
        if let Some(depth) = self.max_depth {
            config.model.max_depth = depth;
        }
        if let Some(leaf) = self.min_samples_leaf {
            config.model.min_samples_leaf = leaf;
        }
        if let Some(rate) = self.learning_rate {
            config.model.learning_rate = rate;
        }
        if let Some(seed) = self.seed {
            config.split.seed = seed;
        }
        if let Some(fraction) = self.validation_fraction {
            config.split.validation_fraction = fraction;
        }
        if self.dump_features {
            config.output.dump_features = true;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Inspecta trainer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => TrainerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TrainerConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid INSPECTA_* environment override")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!("Training configuration:");
    info!("  Trees: {}", config.model.num_trees);
    info!("  Max depth: {}", config.model.max_depth);
    info!("  Min samples per leaf: {}", config.model.min_samples_leaf);
    info!("  Learning rate: {} (fixed-point)", config.model.learning_rate);
    info!(
        "  Validation: {} (seed {})",
        config.split.validation_fraction, config.split.seed
    );
    info!("  Keywords: {}", config.features.extreme_keywords.join(", "));

    let report = inspecta_trainer::run_pipeline(&config).context("Pipeline failed")?;

    info!("✓ Run completed");
    info!("  Submission: {}", report.outputs.submission.display());
    info!("  Model: {} ({})", report.outputs.model.display(), report.model_hash);
    if let Some(metrics) = &report.validation {
        info!(
            "  Validation log loss: {:.4} (baseline {:.4}), accuracy {:.3}",
            metrics.log_loss, metrics.baseline_log_loss, metrics.accuracy
        );
    }

    Ok(())
}
