//! Conflict detection and alternative time-slot recommendation for weekly
//! class schedules.
//!
//! [`detect`] classifies how a proposed booking collides with existing ones;
//! [`recommend`] searches for pre-validated replacement slots. Both are pure
//! functions over data already loaded by the caller. [`store::ScheduleStore`]
//! provides the commit-time guard that must back them before anything is written.

pub mod config;
pub mod data;
pub mod detector;
pub mod dto;
pub mod error;
pub mod interval;
pub mod recommend;
pub mod server;
pub mod store;

pub use data::{
    Booking, BookingId, Confidence, Conflict, ConflictKind, ConflictReport, ProfessorWorkload,
    Recommendation, ScheduleType, TermKey, TimeBlock, WorkloadPolicy,
};
pub use detector::detect;
pub use error::{ConfigError, EngineError, StoreError};
pub use interval::{DaySet, Minutes, TimeInterval, format_time, overlaps, parse_time, within_window};
pub use recommend::recommend;
