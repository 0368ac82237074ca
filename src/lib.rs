//! Snake on a 20×20 grid and a hand-written MLP trained on it with DQN.

pub mod border;
pub mod checkpoint;
pub mod config;
pub mod dqn;
pub mod env;
pub mod error;
pub mod food;
pub mod game;
pub mod game_input;
pub mod logger;
pub mod net;
pub mod replay_buffer;
pub mod snake;
pub mod utils;

pub use config::TrainerConfig;
pub use dqn::{EpisodeStats, Trainer, TrainingSummary};
pub use env::{SnakeEnv, Step};
pub use error::{Error, Result};
pub use game::{GridEnvironment, StepOutcome};
pub use net::{NeuralNet, Shape};
pub use replay_buffer::{Batch, ReplayBuffer, Transition};
pub use snake::{Direction, Snake, Turn};
pub use utils::Point;
