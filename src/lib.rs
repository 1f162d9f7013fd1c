//! # goalpost
//!
//! Trend charts, streaks and backup merging for a personal goal tracker.
//!
//! ## Modules
//!
//! - [`series`]: Daily averaging, calendar buckets, interval selection and streaks
//! - [`backup`]: Snapshot model, validation, conflict detection and merge
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use goalpost::backup::{merge, read_snapshot, MergeStrategy};
//! use goalpost::series::{aggregate_by_granularity, aggregate_daily, CalendarRules, Granularity};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let phone = read_snapshot(Path::new("phone.json"))?;
//!     let tablet = read_snapshot(Path::new("tablet.json"))?;
//!
//!     let merged = merge(&phone, &tablet, MergeStrategy::SkipConflicting)?
//!         .into_result()
//!         .map_err(|report| report.to_string())?;
//!
//!     for goal in &merged.goals {
//!         for question in goal.questions.iter().filter(|q| q.response_type.is_numeric_family()) {
//!             let daily = aggregate_daily(&goal.numeric_responses(question.id), &CalendarRules::utc());
//!             let weeks = aggregate_by_granularity(&daily, Granularity::Week);
//!             println!("{} / {}: {} week(s)", goal.title, question.text, weeks.len());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod config;
pub mod series;

// Re-export top-level types for convenience
pub use series::{
    aggregate_by_granularity, aggregate_daily, auto_select, available_granularities,
    AggregatedBucket, CalendarRules, DailyAverage, Granularity, IntervalSelection, RawResponse,
    SeriesError, SeriesResult, Streak,
};

pub use backup::{
    detect_conflicts, merge, BackupError, BackupResult, BackupSnapshot, Conflict, ConflictReport,
    MergeOutcome, MergeStats, MergeStrategy,
};

pub use config::{Config, ConfigError, LoggingConfig};
