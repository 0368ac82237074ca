//! Agent state saved next to the weight file so training can resume.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AgentState {
    pub episode: usize,
    pub epsilon: f32,
    pub global_steps: u64,
    pub best_score: usize,
    /// RFC 3339 timestamp of the save.
    pub saved_at: String,
}

impl AgentState {
    pub fn new(episode: usize, epsilon: f32, global_steps: u64, best_score: usize) -> Self {
        Self {
            episode,
            epsilon,
            global_steps,
            best_score,
            saved_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// save in json file
pub fn save_state<P: AsRef<Path>>(path: P, state: &AgentState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_state<P: AsRef<Path>>(path: P) -> Result<AgentState> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::tempdir;

    #[test]
    fn state_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agent_state.json");
        let state = AgentState::new(40, 0.25, 12_345, 7);
        save_state(&path, &state).unwrap();
        assert_eq!(load_state(&path).unwrap(), state);
    }

    #[test]
    fn missing_state_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(load_state(dir.path().join("missing.json")), Err(Error::Io(_))));
    }
}
