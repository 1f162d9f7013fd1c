//! goalpost Series Engine
//!
//! Turns raw timestamped answers into chart-ready series:
//!
//! - **types**: Core data structures (RawResponse, DailyAverage, AggregatedBucket, Granularity)
//! - **daily**: Per-day averaging
//! - **buckets**: Calendar-aligned week/month/quarter/half/year buckets
//! - **interval**: Granularity availability and auto-selection
//! - **streak**: Current and best completion streaks
//! - **memo** / **refresh**: Optional memoised chart refresh
//! - **error**: Error types
//!
//! # Pipeline
//!
//! ```text
//!   RawResponse* → aggregate_daily → DailyAverage* → aggregate_by_granularity → AggregatedBucket*
//!                        │
//!                        └─ data_span_days → IntervalSelection (day|week|month|quarter|half|year)
//! ```
//!
//! The aggregation functions are pure; calling one twice with the same input gives
//! the same output.
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use goalpost::series::*;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
//! let responses: Vec<RawResponse> = (0..30)
//!     .map(|i| RawResponse::new(start + Duration::days(i), 7.0))
//!     .collect();
//!
//! let rules = CalendarRules::utc();
//! let daily = aggregate_daily(&responses, &rules);
//! let granularity = auto_select(data_span_days(&responses));
//! let buckets = aggregate_by_granularity(&daily, granularity);
//!
//! assert_eq!(granularity, Granularity::Month);
//! assert_eq!(buckets.len(), 1);
//! ```

pub mod buckets;
pub mod daily;
pub mod error;
pub mod interval;
pub mod memo;
pub mod refresh;
pub mod streak;
pub mod types;

// Re-export commonly used types
pub use buckets::aggregate_by_granularity;
pub use daily::{aggregate_daily, data_span_days};
pub use error::{SeriesError, SeriesResult};
pub use interval::{auto_select, available_granularities, validate_granularity, IntervalSelection};
pub use memo::{fingerprint, Memo};
pub use refresh::{build_chart, ChartRefresher, ChartSnapshot, SeriesSummary};
pub use streak::{best_streak, boolean_presence, current_streak, numeric_presence};
pub use types::{
    AggregatedBucket, BooleanResponse, CalendarDay, CalendarRules, DailyAverage, DayBoundary,
    Granularity, RawResponse, Streak,
};
