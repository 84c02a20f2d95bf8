use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};
use log::warn;
use serde::{Deserialize, Serialize};
use crate::error::{HyperPlayError, Result};
use crate::utils::*;

/// Tune-ables of a HyperPlay agent. Missing keys take their defaults; unknown keys are warned about and dropped.
/// Both the snake_case names and the older camelCase ones are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Cap on rollout passes per move
    pub max_num_probes: usize,
    /// Most hypergames kept in the bag
    pub num_hypergames: usize,
    /// Branches tried from each hypergame per turn
    pub num_branches: usize,
    /// Held back from the playclock for the round trip
    pub preferred_play_buffer_ms: u64,
    pub seed: Option<u64>,
    pub telemetry_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_num_probes: MAX_NUM_PROBES,
            num_hypergames: NUM_HYPERGAMES,
            num_branches: NUM_BRANCHES,
            preferred_play_buffer_ms: PREFERRED_PLAY_BUFFER_MS,
            seed: None,
            telemetry_dir: None,
        }
    }
}

impl AgentConfig {
    /// Percepts give the full state away, so one hypergame is all it takes
    pub fn cheat() -> Self {
        Self { max_num_probes: CHEAT_MAX_NUM_PROBES, num_hypergames: 1, num_branches: 1, ..Self::default() }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut known = serde_json::Map::new();
        for (key, value) in raw {
            match canonical(&key) {
                Some(name) => { known.insert(name.to_string(), value); }
                None => warn!("ignoring unknown option {:?}", key),
            }
        }
        let config: Self = serde_json::from_value(serde_json::Value::Object(known))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Set one option from the runner's string parameters
    pub fn apply_option(&mut self, key: &str, value: &str) -> Result<()> {
        match canonical(key) {
            Some("max_num_probes") => self.max_num_probes = parse(key, value)?,
            Some("num_hypergames") => self.num_hypergames = parse(key, value)?,
            Some("num_branches") => self.num_branches = parse(key, value)?,
            Some("preferred_play_buffer_ms") => self.preferred_play_buffer_ms = parse(key, value)?,
            Some("seed") => self.seed = Some(parse(key, value)?),
            Some("telemetry_dir") => self.telemetry_dir = Some(PathBuf::from(value)),
            _ => {
                warn!("ignoring unknown option {:?}={:?}", key, value);
                return Ok(());
            }
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_hypergames == 0 {
            return Err(HyperPlayError::Config("num_hypergames must be at least 1".into()));
        }
        if self.num_branches == 0 {
            return Err(HyperPlayError::Config("num_branches must be at least 1".into()));
        }
        Ok(())
    }

    /// When the move for a turn starting at `start` has to be ready
    pub fn turn_deadline(&self, start: Instant, playclock_ms: u64) -> Instant {
        start + Duration::from_millis(playclock_ms.saturating_sub(self.preferred_play_buffer_ms))
    }
}

/// Field name for either spelling of a known option
fn canonical(key: &str) -> Option<&'static str> {
    match key {
        "max_num_probes" | "maxNumProbes" => Some("max_num_probes"),
        "num_hypergames" | "numHypergames" => Some("num_hypergames"),
        "num_branches" | "numBranches" => Some("num_branches"),
        "preferred_play_buffer_ms" | "preferredPlayBufferMs" => Some("preferred_play_buffer_ms"),
        "seed" => Some("seed"),
        "telemetry_dir" | "telemetryDir" => Some("telemetry_dir"),
        _ => None,
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| HyperPlayError::Config(format!("bad value {:?} for {}", value, key)))
}
