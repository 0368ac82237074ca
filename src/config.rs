//! Training hyperparameters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hyperparameters for the agent and the training run.
///
/// Missing fields in a JSON config fall back to [`TrainerConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Episodes to play in [`crate::dqn::Trainer::train`].
    pub episodes: usize,
    /// Width of the first hidden layer.
    pub hidden1: usize,
    /// Width of the second hidden layer.
    pub hidden2: usize,
    pub buffer_capacity: usize,
    pub batch_size: usize,
    /// Discount factor.
    pub gamma: f32,
    pub learning_rate: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    /// Multiplied into epsilon after every environment step.
    pub epsilon_decay: f32,
    /// Global steps before the first training step.
    pub warmup_steps: u64,
    /// Train once every this many global steps.
    pub train_every: u64,
    /// Copy online weights into the target network every this many global steps.
    pub target_sync_every: u64,
    /// Divide the summed batch gradient by the batch size.
    pub average_batch_gradients: bool,
    /// Put the first apple of an episode on a random free cell.
    pub random_start_apple: bool,
    pub seed: u64,
    /// Progress line every this many episodes; 0 disables it.
    pub log_every: usize,
    /// Save weights every this many episodes; 0 saves only at the end.
    pub save_every: usize,
    pub weights_path: PathBuf,
    pub state_path: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            hidden1: 128,
            hidden2: 64,
            buffer_capacity: 50_000,
            batch_size: 64,
            gamma: 0.99,
            learning_rate: 1e-3,
            epsilon_start: 1.0,
            epsilon_min: 0.05,
            epsilon_decay: 0.9995,
            warmup_steps: 1000,
            train_every: 4,
            target_sync_every: 1000,
            average_batch_gradients: true,
            random_start_apple: false,
            seed: 42,
            log_every: 100,
            save_every: 0,
            weights_path: PathBuf::from("weights.bin"),
            state_path: PathBuf::from("agent_state.json"),
        }
    }
}

impl TrainerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: TrainerConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Checks that all hyperparameters are in valid ranges.
    pub fn validate(&self) -> Result<()> {
        fn bad(msg: String) -> Result<()> {
            Err(Error::InvalidConfig(msg))
        }

        if self.hidden1 == 0 || self.hidden2 == 0 {
            return bad(format!("hidden layers must be non-empty, got {}x{}", self.hidden1, self.hidden2));
        }
        if self.buffer_capacity == 0 {
            return bad("buffer_capacity must be positive".into());
        }
        if self.batch_size == 0 {
            return bad("batch_size must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return bad(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return bad(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_min) {
            return bad(format!(
                "epsilon_start and epsilon_min must be in [0, 1], got {} and {}",
                self.epsilon_start, self.epsilon_min
            ));
        }
        if self.epsilon_min > self.epsilon_start {
            return bad(format!("epsilon_min {} exceeds epsilon_start {}", self.epsilon_min, self.epsilon_start));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return bad(format!("epsilon_decay must be in (0, 1], got {}", self.epsilon_decay));
        }
        if self.train_every == 0 || self.target_sync_every == 0 {
            return bad("train_every and target_sync_every must be positive".into());
        }
        Ok(())
    }
}
