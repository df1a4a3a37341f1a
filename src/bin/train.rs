#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use mancala_rl::config::AppConfig;
use mancala_rl::training::evaluation::evaluate_vs_scripted;
use mancala_rl::training::metrics::JsonlMetricWriter;
use mancala_rl::training::trainer::{train, TrainHooks, TrainMode};

type InferBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;

/// Train a Mancala RL agent via self-play or against a scripted opponent.
#[derive(Parser)]
#[command(name = "train", about = "Train a Mancala RL agent")]
struct Cli {
    /// Training mode: self-play or vs-opponent
    #[arg(long, default_value = "self-play")]
    mode: String,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the end epoch
    #[arg(long)]
    epochs: Option<usize>,

    /// Override the learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the checkpoint/log directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Greedy evaluation games per evaluation interval (0 disables)
    #[arg(long, default_value_t = 100)]
    eval_games: usize,

    /// Append per-interval loss scalars to this JSONL file (vs-opponent mode)
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mode = match cli.mode.as_str() {
        "self-play" => TrainMode::SelfPlay,
        "vs-opponent" => TrainMode::VsOpponent,
        other => bail!(
            "unknown mode '{}' (expected 'self-play' or 'vs-opponent')",
            other
        ),
    };

    // Load configuration
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(epochs) = cli.epochs {
        config.training.end_epochs = epochs;
    }
    if let Some(lr) = cli.lr {
        config.training.lr = lr;
    }
    if let Some(seed) = cli.seed {
        config.training.seed = seed;
    }
    if let Some(log_dir) = cli.log_dir {
        config.run.log_dir = log_dir;
    }
    config.validate().context("validating configuration")?;

    let mut hooks = TrainHooks::none();

    if let Some(path) = cli.metrics_file.as_ref() {
        let writer = JsonlMetricWriter::open(path)
            .with_context(|| format!("opening metrics file {}", path.display()))?;
        hooks.writer = Some(Box::new(writer));
    }

    if cli.eval_games > 0 {
        let eval_games = cli.eval_games;
        let mut eval_rng = StdRng::seed_from_u64(config.training.seed.wrapping_add(1));
        hooks.evaluation = Some(Box::new(move |model, _opponent_model, config| {
            let infer_model = model.valid();
            let device = Default::default();
            let mut opponent = config.opponent.build();
            let summary = evaluate_vs_scripted(
                &infer_model,
                opponent.as_mut(),
                eval_games,
                config,
                &device,
                &mut eval_rng,
            );
            println!(
                "  >> Eval vs {} ({} games): {:.1}% win rate",
                opponent.name(),
                eval_games,
                summary.win_rate * 100.0
            );
        }));
    }

    let device = Default::default();
    train::<TrainBackend>(&config, mode, hooks, &device)?;

    Ok(())
}
