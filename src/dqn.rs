//! DQN trainer: epsilon-greedy agent, replay buffer, target network,
//! training loop, save/resume.

use std::collections::VecDeque;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::checkpoint::{self, AgentState};
use crate::config::TrainerConfig;
use crate::env::SnakeEnv;
use crate::error::Result;
use crate::game::{GridEnvironment, START_BODY};
use crate::logger;
use crate::net::NeuralNet;
use crate::replay_buffer::{Batch, ReplayBuffer};
use crate::utils::{argmax, has_non_finite, max_value, vec_stats};

/// Episodes averaged into [`TrainingSummary::mean_score`].
const SCORE_WINDOW: usize = 100;

/// What happened in one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    pub episode: usize,
    pub reward: f32,
    pub steps: usize,
    /// Apples eaten.
    pub score: usize,
    pub length: usize,
    /// Mean loss over the training steps taken during the episode.
    pub mean_loss: Option<f32>,
    pub epsilon: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub best_score: usize,
    /// Mean score of the last (up to) 100 episodes.
    pub mean_score: f32,
    pub global_steps: u64,
}

pub struct Trainer {
    cfg: TrainerConfig,
    env: SnakeEnv,
    online: NeuralNet, // acts and learns
    target: NeuralNet, // frozen copy for bootstrap targets
    replay: ReplayBuffer,

    rng: StdRng, // env, epsilon-greedy and sampling
    epsilon: f32,
    global_steps: u64,
    episodes_done: usize,
    best_score: usize,
    last_loss: f32,
}

impl Trainer {
    pub fn new(cfg: TrainerConfig) -> Result<Self> {
        cfg.validate()?;
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let online = NeuralNet::new(SnakeEnv::STATE_DIM, cfg.hidden1, cfg.hidden2, SnakeEnv::ACTION_COUNT, &mut rng);
        let target = online.clone();
        let env = SnakeEnv::new(GridEnvironment::new().with_random_start_apple(cfg.random_start_apple));

        Ok(Self {
            replay: ReplayBuffer::new(cfg.buffer_capacity),
            epsilon: cfg.epsilon_start,
            cfg,
            env,
            online,
            target,
            rng,
            global_steps: 0,
            episodes_done: 0,
            best_score: 0,
            last_loss: 0.0,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.cfg
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn global_steps(&self) -> u64 {
        self.global_steps
    }

    pub fn episodes_done(&self) -> usize {
        self.episodes_done
    }

    pub fn best_score(&self) -> usize {
        self.best_score
    }

    pub fn last_loss(&self) -> f32 {
        self.last_loss
    }

    pub fn replay_len(&self) -> usize {
        self.replay.len()
    }

    pub fn online(&self) -> &NeuralNet {
        &self.online
    }

    pub fn target(&self) -> &NeuralNet {
        &self.target
    }

    pub fn env(&self) -> &SnakeEnv {
        &self.env
    }

    /// Epsilon-greedy: with probability ε a uniform random action, otherwise
    /// argmax Q(s, ·) with ties going to the lowest index.
    pub fn select_action(&mut self, state: &[f32]) -> Result<usize> {
        let actions = self.online.shape().output;
        if self.rng.r#gen::<f32>() < self.epsilon {
            return Ok(self.rng.gen_range(0..actions));
        }
        let q = self.online.predict(state)?;
        if has_non_finite(&q) {
            log::error!("Q contains NaN/Inf in select_action, falling back to a random action");
            return Ok(self.rng.gen_range(0..actions));
        }
        Ok(argmax(&q))
    }

    /// Store transition in replay.
    pub fn remember(&mut self, state: &[f32], action: usize, reward: f32, next_state: &[f32], done: bool) {
        self.replay.add(state, action, reward, next_state, done);
    }

    /// Trains once if warm-up is over, the step counter is on the
    /// `train_every` cadence and the buffer holds a full batch. Returns the
    /// batch loss when a step was taken.
    pub fn train_step(&mut self) -> Result<Option<f32>> {
        if self.global_steps < self.cfg.warmup_steps
            || self.global_steps % self.cfg.train_every != 0
            || !self.replay.is_ready(self.cfg.batch_size)
        {
            return Ok(None);
        }
        self.learn()
    }

    /// One SGD step on a sampled minibatch against target-network targets.
    fn learn(&mut self) -> Result<Option<f32>> {
        let Some(batch) = self.replay.sample(self.cfg.batch_size, &mut self.rng) else {
            return Ok(None);
        };
        let targets = bootstrap_targets(&self.target, &batch, self.cfg.gamma)?;
        let loss = self.online.backward_and_step_batch(
            &batch,
            &targets,
            self.cfg.learning_rate,
            self.cfg.average_batch_gradients,
        )?;

        if self.online.has_non_finite() {
            log::error!("non-finite parameters after step {}", self.global_steps);
        }
        if log::log_enabled!(log::Level::Debug) {
            let t = vec_stats(&targets);
            log::debug!(
                "step {} loss {:.5} target mean {:.4} min {:.4} max {:.4}",
                self.global_steps, loss, t.mean, t.min, t.max
            );
        }
        self.last_loss = loss;
        Ok(Some(loss))
    }

    /// Copies online weights into the target network every
    /// `target_sync_every` global steps.
    pub fn maybe_sync_target(&mut self) -> Result<bool> {
        if self.global_steps == 0 || self.global_steps % self.cfg.target_sync_every != 0 {
            return Ok(false);
        }
        self.sync_target()?;
        Ok(true)
    }

    pub fn sync_target(&mut self) -> Result<()> {
        self.target.copy_weights_from(&self.online)?;
        log::debug!("target network synced at step {}", self.global_steps);
        Ok(())
    }

    fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.cfg.epsilon_decay).max(self.cfg.epsilon_min);
    }

    /// Plays one episode to the end, learning along the way.
    pub fn run_episode(&mut self) -> Result<EpisodeStats> {
        let mut state = self.env.reset(&mut self.rng);
        let mut reward = 0.0f32;
        let mut loss_sum = 0.0f32;
        let mut loss_count = 0usize;

        loop {
            // act
            let action = self.select_action(&state)?;
            let step = self.env.step(action, &mut self.rng)?;
            self.global_steps += 1;

            // store, then learn on the step cadence
            self.remember(&state, action, step.reward, &step.next_state, step.done);
            if let Some(loss) = self.train_step()? {
                loss_sum += loss;
                loss_count += 1;
            }
            // target copy and exploration both run on global steps
            self.maybe_sync_target()?;
            self.decay_epsilon();

            reward += step.reward;
            state = step.next_state;
            if step.done {
                break;
            }
        }

        let length = self.env.game().snake().len();
        let stats = EpisodeStats {
            episode: self.episodes_done,
            reward,
            steps: self.env.steps(),
            score: length - START_BODY.len(),
            length,
            mean_loss: (loss_count > 0).then(|| loss_sum / loss_count as f32),
            epsilon: self.epsilon,
        };
        self.episodes_done += 1;
        self.best_score = self.best_score.max(stats.score);
        Ok(stats)
    }

    /// Runs `episodes` episodes, logging progress and saving weights every
    /// `save_every` episodes when enabled.
    pub fn train(&mut self, episodes: usize) -> Result<TrainingSummary> {
        let mut recent: VecDeque<usize> = VecDeque::with_capacity(SCORE_WINDOW);
        log::info!(
            "training {} episodes, network {} ({} params), seed {}",
            episodes,
            self.online.shape(),
            self.online.param_count(),
            self.cfg.seed
        );

        for _ in 0..episodes {
            let stats = self.run_episode()?;
            if recent.len() == SCORE_WINDOW {
                recent.pop_front();
            }
            recent.push_back(stats.score);

            let step = self.global_steps;
            logger::scalar(step, "episode_reward", stats.reward);
            logger::scalar(step, "score", stats.score as f32);

            let ep = stats.episode + 1;
            if self.cfg.log_every > 0 && ep % self.cfg.log_every == 0 {
                if let Some(loss) = stats.mean_loss {
                    logger::scalar(step, "loss", loss);
                }
                logger::scalar(step, "epsilon", self.epsilon);
                log::info!(
                    "episode {} | reward {:.2} | score {} | best {} | mean {:.2} | eps {:.3} | replay {}",
                    ep,
                    stats.reward,
                    stats.score,
                    self.best_score,
                    mean(&recent),
                    self.epsilon,
                    self.replay.len()
                );
            }
            if self.cfg.save_every > 0 && ep % self.cfg.save_every == 0 {
                self.save()?;
            }
        }

        Ok(TrainingSummary {
            episodes,
            best_score: self.best_score,
            mean_score: mean(&recent),
            global_steps: self.global_steps,
        })
    }

    /// Saves weights and agent state to the configured paths.
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.cfg.weights_path, &self.cfg.state_path)
    }

    pub fn save_to(&self, weights: &Path, state: &Path) -> Result<()> {
        self.online.save(weights)?;
        let agent = AgentState::new(self.episodes_done, self.epsilon, self.global_steps, self.best_score);
        checkpoint::save_state(state, &agent)?;
        log::info!("saved {} and {}", weights.display(), state.display());
        Ok(())
    }

    /// Loads weights and agent state from the configured paths if present.
    /// Returns whether weights were loaded.
    pub fn resume(&mut self) -> Result<bool> {
        let weights = self.cfg.weights_path.clone();
        let state = self.cfg.state_path.clone();
        self.resume_from(&weights, &state)
    }

    /// Both files are read and checked before anything is replaced, so a
    /// bad file leaves the trainer as it was.
    pub fn resume_from(&mut self, weights: &Path, state: &Path) -> Result<bool> {
        let net = if weights.exists() {
            let mut net = self.online.clone();
            net.load(weights)?;
            Some(net)
        } else {
            None
        };
        let agent = if state.exists() { Some(checkpoint::load_state(state)?) } else { None };

        let loaded = net.is_some();
        if let Some(net) = net {
            self.target.copy_weights_from(&net)?;
            self.online = net;
            log::info!("loaded {}", weights.display());
        }
        if let Some(agent) = agent {
            self.epsilon = agent.epsilon.clamp(self.cfg.epsilon_min, 1.0);
            self.global_steps = agent.global_steps;
            self.episodes_done = agent.episode;
            self.best_score = agent.best_score;
            log::info!(
                "loaded {} (eps={:.3}, steps={}, episode={})",
                state.display(),
                self.epsilon,
                self.global_steps,
                self.episodes_done
            );
        }
        Ok(loaded)
    }
}

/// `r` for terminal transitions, else `r + γ · max_a Q_target(s', a)`.
pub fn bootstrap_targets(target: &NeuralNet, batch: &Batch<'_>, gamma: f32) -> Result<Vec<f32>> {
    batch
        .iter()
        .map(|t| {
            if t.done {
                Ok(t.reward)
            } else {
                Ok(t.reward + gamma * max_value(&target.predict(&t.next_state)?))
            }
        })
        .collect()
}

fn mean(xs: &VecDeque<usize>) -> f32 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<usize>() as f32 / xs.len() as f32
}
