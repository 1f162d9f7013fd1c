//! Core data types for the goalpost series engine
//!
//! This module defines the fundamental types used by the aggregation layer:
//! - `RawResponse` / `BooleanResponse`: logged answers fed in by the caller
//! - `DailyAverage`: one calendar day of numeric answers
//! - `AggregatedBucket`: a calendar-aligned window of daily averages
//! - `Granularity`: the closed set of bucket sizes
//! - `Streak`: consecutive-day completion counts
//! - `CalendarRules` / `DayBoundary`: how instants map to calendar days

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::error::{SeriesError, SeriesResult};

/// A calendar day, normalized to the caller's day boundary
pub type CalendarDay = NaiveDate;

/// One logged answer to a numeric-family question
///
/// Produced by the persistence layer (or extracted from a backup snapshot)
/// and only ever read by the aggregator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    /// When the answer was logged
    pub timestamp: DateTime<Utc>,
    /// The numeric answer, absent for skipped entries
    #[serde(default)]
    pub numeric_value: Option<f64>,
}

impl RawResponse {
    /// Create a response carrying a value
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            numeric_value: Some(value),
        }
    }

    /// Create a response with no numeric value
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            numeric_value: None,
        }
    }
}

/// One logged answer to a yes/no question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BooleanResponse {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub bool_value: Option<bool>,
}

impl BooleanResponse {
    pub fn new(timestamp: DateTime<Utc>, value: bool) -> Self {
        Self {
            timestamp,
            bool_value: Some(value),
        }
    }
}

/// Mean of all numeric answers logged on one calendar day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyAverage {
    /// The calendar day (midnight in the caller's day boundary)
    pub date: CalendarDay,
    /// Arithmetic mean of the day's values
    pub average_value: f64,
    /// Number of answers averaged, always >= 1
    pub sample_count: usize,
}

/// A calendar-aligned window of daily averages
///
/// Invariant: `min_value <= average_value <= max_value`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedBucket {
    /// First day of the window (inclusive)
    pub start_date: CalendarDay,
    /// Last day of the window (inclusive)
    pub end_date: CalendarDay,
    /// Unweighted mean of the member daily averages
    pub average_value: f64,
    /// Smallest member daily average
    pub min_value: f64,
    /// Largest member daily average
    pub max_value: f64,
    /// Total raw answers across all member days
    pub sample_count: usize,
    /// Window size
    pub granularity: Granularity,
}

impl AggregatedBucket {
    /// Wrap a single daily average as a day-granularity bucket
    pub fn from_daily(daily: &DailyAverage) -> Self {
        Self {
            start_date: daily.date,
            end_date: daily.date,
            average_value: daily.average_value,
            min_value: daily.average_value,
            max_value: daily.average_value,
            sample_count: daily.sample_count,
            granularity: Granularity::Day,
        }
    }

    /// Check if a calendar day falls inside this bucket
    pub fn contains(&self, day: CalendarDay) -> bool {
        day >= self.start_date && day <= self.end_date
    }

    /// Human-readable label for chart axes
    pub fn label(&self) -> String {
        self.granularity.label(self.start_date, self.end_date)
    }
}

/// Calendar window sizes for charting
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    /// ISO-8601 week, Monday start
    Week,
    Month,
    Quarter,
    /// January-June or July-December
    Half,
    Year,
}

impl Granularity {
    /// All granularities from finest to coarsest
    pub const ALL: [Granularity; 6] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Half,
        Granularity::Year,
    ];

    /// Minimum span of data, in days, before this granularity is offered
    pub fn minimum_data_day_span(&self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Week => 14,
            Self::Month => 28,
            Self::Quarter => 90,
            Self::Half => 180,
            Self::Year => 365,
        }
    }

    /// Bucket length in underlying calendar units (weeks for `Week`, days
    /// for `Day`, months otherwise)
    pub fn components_per_bucket(&self) -> u32 {
        match self {
            Self::Day | Self::Week | Self::Month => 1,
            Self::Quarter => 3,
            Self::Half => 6,
            Self::Year => 12,
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" | "d" | "daily" => Some(Self::Day),
            "week" | "w" | "weekly" => Some(Self::Week),
            "month" | "m" | "monthly" => Some(Self::Month),
            "quarter" | "q" | "quarterly" => Some(Self::Quarter),
            "half" | "h" | "half-year" | "halfyear" => Some(Self::Half),
            "year" | "y" | "yearly" => Some(Self::Year),
            _ => None,
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SeriesError::UnknownGranularity(s.to_string()))
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Quarter => write!(f, "quarter"),
            Self::Half => write!(f, "half"),
            Self::Year => write!(f, "year"),
        }
    }
}

/// Completion streak over a set of present days
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    /// Consecutive present days ending today (0 if today is missing)
    pub current_length: u32,
    /// Longest consecutive run anywhere in the history
    pub best_length: u32,
}

/// Maps an instant to the calendar day it belongs to
pub trait DayBoundary {
    fn day_of(&self, instant: DateTime<Utc>) -> CalendarDay;
}

impl<F> DayBoundary for F
where
    F: Fn(DateTime<Utc>) -> CalendarDay,
{
    fn day_of(&self, instant: DateTime<Utc>) -> CalendarDay {
        self(instant)
    }
}

/// Calendar settings: days start at local midnight for a fixed UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRules {
    pub utc_offset: FixedOffset,
}

impl CalendarRules {
    /// UTC day boundaries
    pub fn utc() -> Self {
        Self {
            utc_offset: Utc.fix(),
        }
    }

    /// Day boundaries at local midnight for an offset given in minutes east of UTC
    pub fn from_offset_minutes(minutes: i32) -> SeriesResult<Self> {
        let utc_offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                SeriesError::InvalidCalendar(format!("UTC offset out of range: {}m", minutes))
            })?;
        Ok(Self { utc_offset })
    }

    /// The calendar day containing `instant` in this calendar's offset
    pub fn day_of(&self, instant: DateTime<Utc>) -> CalendarDay {
        instant.with_timezone(&self.utc_offset).date_naive()
    }

    /// Today's calendar day
    pub fn today(&self) -> CalendarDay {
        self.day_of(Utc::now())
    }
}

impl Default for CalendarRules {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayBoundary for CalendarRules {
    fn day_of(&self, instant: DateTime<Utc>) -> CalendarDay {
        CalendarRules::day_of(self, instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_granularity_thresholds_ascend() {
        let spans: Vec<i64> = Granularity::ALL
            .iter()
            .map(|g| g.minimum_data_day_span())
            .collect();
        assert_eq!(spans, vec![1, 14, 28, 90, 180, 365]);
        assert!(Granularity::Week < Granularity::Year);
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("Week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!(Granularity::parse("q"), Some(Granularity::Quarter));
        assert_eq!(Granularity::parse("half-year"), Some(Granularity::Half));
        assert!(matches!(
            "fortnight".parse::<Granularity>(),
            Err(SeriesError::UnknownGranularity(_))
        ));
    }

    #[test]
    fn test_granularity_serialization() {
        let json = serde_json::to_string(&Granularity::Quarter).unwrap();
        assert_eq!(json, "\"quarter\"");
        let restored: Granularity = serde_json::from_str("\"half\"").unwrap();
        assert_eq!(restored, Granularity::Half);
    }

    #[test]
    fn test_calendar_rules_offset_shifts_day() {
        // 2024-03-10 23:30 UTC is already 2024-03-11 in UTC+2
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();

        let utc = CalendarRules::utc();
        assert_eq!(utc.day_of(instant), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        let east = CalendarRules::from_offset_minutes(120).unwrap();
        assert_eq!(east.day_of(instant), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn test_calendar_rules_rejects_bad_offset() {
        assert!(CalendarRules::from_offset_minutes(24 * 60).is_err());
        assert!(CalendarRules::from_offset_minutes(-5 * 60).is_ok());
    }

    #[test]
    fn test_closure_day_boundary() {
        let boundary = |ts: DateTime<Utc>| ts.date_naive();
        let instant = Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap();
        assert_eq!(boundary.day_of(instant), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_bucket_from_daily() {
        let daily = DailyAverage {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            average_value: 4.5,
            sample_count: 3,
        };
        let bucket = AggregatedBucket::from_daily(&daily);

        assert_eq!(bucket.min_value, 4.5);
        assert_eq!(bucket.max_value, 4.5);
        assert_eq!(bucket.sample_count, 3);
        assert!(bucket.contains(daily.date));
        assert_eq!(bucket.granularity, Granularity::Day);
    }
}
