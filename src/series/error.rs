//! Series error types
//!
//! Empty input is never an error here: every aggregation returns an empty
//! result for an empty series.

use thiserror::Error;

use super::types::Granularity;

/// Errors that can occur while aggregating or charting a series
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// A manually requested granularity is not offered for the data span
    #[error("Granularity '{requested}' needs more data: span is {span_days} day(s), available: {}", format_available(.available))]
    InvalidGranularityForSpan {
        requested: Granularity,
        span_days: i64,
        available: Vec<Granularity>,
    },

    /// Granularity name could not be parsed
    #[error("Unknown granularity: {0}")]
    UnknownGranularity(String),

    /// Calendar settings are out of range
    #[error("Invalid calendar: {0}")]
    InvalidCalendar(String),
}

fn format_available(available: &[Granularity]) -> String {
    available
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for series operations
pub type SeriesResult<T> = Result<T, SeriesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SeriesError::InvalidGranularityForSpan {
            requested: Granularity::Month,
            span_days: 20,
            available: vec![Granularity::Day, Granularity::Week],
        };
        assert_eq!(
            err.to_string(),
            "Granularity 'month' needs more data: span is 20 day(s), available: day, week"
        );

        let err = SeriesError::UnknownGranularity("fortnight".to_string());
        assert_eq!(err.to_string(), "Unknown granularity: fortnight");
    }
}
