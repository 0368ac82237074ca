//! Agent-facing wrapper around the grid: encoded states, shaped rewards and
//! the anti-stalling episode cutoff.

use rand::Rng;

use crate::error::{Error, Result};
use crate::game::{GridEnvironment, StepOutcome};
use crate::game_input::{GameInput, STATE_DIM};
use crate::snake::Turn;

pub const DEATH_REWARD: f32 = -1.0;
pub const FOOD_REWARD: f32 = 1.0;
pub const STEP_PENALTY: f32 = -0.01;
/// Added when the head got closer to the apple, subtracted when it got farther.
pub const DISTANCE_SHAPING: f32 = 0.1;

/// Base step budget of an episode; every segment adds `STEPS_PER_SEGMENT`.
pub const BASE_STEP_LIMIT: usize = 200;
pub const STEPS_PER_SEGMENT: usize = 5;

/// Result of one agent step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub next_state: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    pub outcome: StepOutcome,
}

pub struct SnakeEnv {
    game: GridEnvironment,
    steps: usize,
}

impl SnakeEnv {
    pub const STATE_DIM: usize = STATE_DIM;
    pub const ACTION_COUNT: usize = Turn::COUNT;

    pub fn new(game: GridEnvironment) -> Self {
        Self { game, steps: 0 }
    }

    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<f32> {
        self.game.reset(rng);
        self.steps = 0;
        GameInput::from_game(&self.game)
    }

    /// Applies action `0 = left, 1 = straight, 2 = right`.
    pub fn step<R: Rng + ?Sized>(&mut self, action: usize, rng: &mut R) -> Result<Step> {
        let turn = Turn::from_action(action).ok_or(Error::ActionOutOfRange {
            action,
            actions: Self::ACTION_COUNT,
        })?;

        let len_before = self.game.snake().len();
        let dist_before = self.game.apple_distance();
        let outcome = self.game.step(turn, rng);
        self.steps += 1;

        let reward = shaped_reward(
            self.game.is_dead(),
            self.game.snake().len() > len_before,
            dist_before,
            self.game.apple_distance(),
        );
        let done = self.game.is_dead() || self.steps > self.step_limit();

        Ok(Step { next_state: GameInput::from_game(&self.game), reward, done, outcome })
    }

    /// Steps allowed before the episode is cut off; grows with the snake.
    pub fn step_limit(&self) -> usize {
        BASE_STEP_LIMIT + STEPS_PER_SEGMENT * self.game.snake().len()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn game(&self) -> &GridEnvironment {
        &self.game
    }

    /// Mutable board access for scenario setup (placing the apple).
    pub fn game_mut(&mut self) -> &mut GridEnvironment {
        &mut self.game
    }

    pub fn state(&self) -> Vec<f32> {
        GameInput::from_game(&self.game)
    }
}

impl Default for SnakeEnv {
    fn default() -> Self {
        Self::new(GridEnvironment::new())
    }
}

/// Reward for one transition.
pub fn shaped_reward(dead: bool, grew: bool, dist_before: i32, dist_after: i32) -> f32 {
    if dead {
        return DEATH_REWARD;
    }
    if grew {
        return FOOD_REWARD;
    }
    let mut reward = STEP_PENALTY;
    if dist_after < dist_before {
        reward += DISTANCE_SHAPING;
    } else if dist_after > dist_before {
        reward -= DISTANCE_SHAPING;
    }
    reward
}
