use thiserror::Error;

use crate::data::{BookingId, ConflictReport, ScheduleType};

/// Malformed input rejected before any detection runs.
///
/// Scheduling conflicts are never reported through this type; they are data
/// carried by [`ConflictReport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
    #[error("schedule type {0} requires a room but none was given")]
    NoRoomForOnsiteSchedule(ScheduleType),
    #[error("invalid time of day {0:?}, expected HH:MM")]
    InvalidTime(String),
    #[error("invalid weekday {0:?}")]
    InvalidDay(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("could not read block table {path}: {source}")]
    BlockFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse block table: {0}")]
    BlockParse(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("booking rejected with {} conflict(s)", .0.conflict_count())]
    Rejected(Box<ConflictReport>),
    #[error("booking {0} not found")]
    NotFound(BookingId),
}
