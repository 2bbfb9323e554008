use log::info;
use std::env;
use std::net::SocketAddr;

use crate::data::{TimeBlock, WorkloadPolicy};
use crate::error::ConfigError;
use crate::interval::{Minutes, parse_time};

pub const BIND_VAR: &str = "SCHEDULE_GUARD_BIND";
pub const LOG_VAR: &str = "SCHEDULE_GUARD_LOG";
pub const MAX_SUBJECTS_VAR: &str = "SCHEDULE_GUARD_MAX_SUBJECTS";
pub const DAY_START_VAR: &str = "SCHEDULE_GUARD_DAY_START";
pub const DAY_END_VAR: &str = "SCHEDULE_GUARD_DAY_END";
pub const BLOCKS_FILE_VAR: &str = "SCHEDULE_GUARD_BLOCKS_FILE";

/// Runtime settings for the service. Every field has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    /// Default `env_logger` filter; `RUST_LOG` still takes precedence.
    pub log_filter: String,
    pub policy: WorkloadPolicy,
    pub window_start: Minutes,
    pub window_end: Minutes,
    pub blocks: Vec<TimeBlock>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_filter: "info".to_string(),
            policy: WorkloadPolicy::default(),
            window_start: 450,
            window_end: 1080,
            blocks: TimeBlock::default_table(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, so tests need not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(bind) = lookup(BIND_VAR) {
            config.bind = bind.parse().map_err(|e| ConfigError::InvalidValue {
                key: BIND_VAR,
                reason: format!("{e}"),
            })?;
        }
        if let Some(filter) = lookup(LOG_VAR) {
            config.log_filter = filter;
        }
        if let Some(max) = lookup(MAX_SUBJECTS_VAR) {
            config.policy.max_subjects_per_professor =
                max.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    key: MAX_SUBJECTS_VAR,
                    reason: format!("{e}"),
                })?;
        }
        if let Some(start) = lookup(DAY_START_VAR) {
            config.window_start = parse_time(&start)?;
        }
        if let Some(end) = lookup(DAY_END_VAR) {
            config.window_end = parse_time(&end)?;
        }
        if config.window_end <= config.window_start {
            return Err(ConfigError::InvalidValue {
                key: DAY_END_VAR,
                reason: "operating day must end after it starts".to_string(),
            });
        }
        if let Some(path) = lookup(BLOCKS_FILE_VAR) {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::BlockFile {
                path: path.clone(),
                source,
            })?;
            config.blocks = parse_blocks(&raw)?;
            info!("Loaded {} time blocks from {}", config.blocks.len(), path);
        }

        Ok(config)
    }
}

#[derive(serde::Deserialize)]
struct RawBlock {
    label: String,
    start: String,
    end: String,
}

/// Parses a JSON array of `{"label", "start": "HH:MM", "end": "HH:MM"}` blocks.
pub fn parse_blocks(raw: &str) -> Result<Vec<TimeBlock>, ConfigError> {
    let raw_blocks: Vec<RawBlock> = serde_json::from_str(raw)?;
    raw_blocks
        .into_iter()
        .map(|b| TimeBlock::new(b.label, &b.start, &b.end).map_err(ConfigError::from))
        .collect()
}
