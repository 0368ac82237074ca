use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use snake_dqn::{Trainer, TrainerConfig, logger};

/// Train a DQN agent to play Snake.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Number of episodes (overrides the config file)
    #[arg(short, long)]
    episodes: Option<usize>,

    /// JSON file with hyperparameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Where weights are loaded from and saved to
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Continue from saved weights and agent state if they exist
    #[arg(long)]
    resume: bool,

    /// Append log lines to this file
    #[arg(long, default_value = "train.log")]
    log_file: PathBuf,

    /// Log every training step
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    if let Err(e) = logger::init(Some(&cli.log_file), level) {
        eprintln!("cannot open {}: {e}", cli.log_file.display());
        std::process::exit(1);
    }
    if let Err(e) = run(cli) {
        log::error!("{e}");
        log::logger().flush();
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> snake_dqn::Result<()> {
    let mut cfg = match &cli.config {
        Some(path) => TrainerConfig::from_json_file(path)?,
        None => TrainerConfig::default(),
    };
    if let Some(episodes) = cli.episodes {
        cfg.episodes = episodes;
    }
    if let Some(seed) = cli.seed {
        cfg.seed = seed;
    }
    if let Some(weights) = cli.weights {
        cfg.state_path = weights.with_extension("json");
        cfg.weights_path = weights;
    }

    let episodes = cfg.episodes;
    let mut trainer = Trainer::new(cfg)?;
    if cli.resume && !trainer.resume()? {
        log::warn!("no saved weights found, starting from a fresh network");
    }

    let summary = trainer.train(episodes)?;
    trainer.save()?;
    log::info!(
        "done: {} episodes, {} steps, best score {}, mean score {:.2}",
        summary.episodes,
        summary.global_steps,
        summary.best_score,
        summary.mean_score
    );
    log::logger().flush();
    Ok(())
}
