//! Interval Selector
//!
//! Decides which granularities make sense for a data span and picks the
//! initial one. The ladder is:
//!
//! ```text
//! span < 14 → day | < 28 → week | < 90 → month | < 180 → quarter | < 365 → half | else year
//! ```

use serde::Serialize;

use super::daily::data_span_days;
use super::error::{SeriesError, SeriesResult};
use super::types::{Granularity, RawResponse};

/// Granularities offered for a data span; `day` is always offered
pub fn available_granularities(span_days: i64) -> Vec<Granularity> {
    Granularity::ALL
        .iter()
        .copied()
        .filter(|g| *g == Granularity::Day || g.minimum_data_day_span() <= span_days)
        .collect()
}

/// Coarsest granularity whose threshold the span reaches
pub fn auto_select(span_days: i64) -> Granularity {
    available_granularities(span_days)
        .last()
        .copied()
        .unwrap_or(Granularity::Day)
}

/// Reject a granularity that the span does not offer
pub fn validate_granularity(span_days: i64, requested: Granularity) -> SeriesResult<()> {
    let available = available_granularities(span_days);
    if available.contains(&requested) {
        Ok(())
    } else {
        Err(SeriesError::InvalidGranularityForSpan {
            requested,
            span_days,
            available,
        })
    }
}

/// Current granularity choice for one chart
///
/// Auto-selection only sets the initial value. A manual choice sticks
/// across refreshes for as long as the data span still offers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSelection {
    span_days: i64,
    current: Granularity,
    manual: bool,
}

impl IntervalSelection {
    /// Start with the auto-selected granularity for a span
    pub fn new(span_days: i64) -> Self {
        Self {
            span_days,
            current: auto_select(span_days),
            manual: false,
        }
    }

    /// Start from the span of a set of raw responses
    pub fn for_responses(responses: &[RawResponse]) -> Self {
        Self::new(data_span_days(responses))
    }

    pub fn current(&self) -> Granularity {
        self.current
    }

    pub fn span_days(&self) -> i64 {
        self.span_days
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn available(&self) -> Vec<Granularity> {
        available_granularities(self.span_days)
    }

    /// Manually choose a granularity
    pub fn select(&mut self, granularity: Granularity) -> SeriesResult<Granularity> {
        validate_granularity(self.span_days, granularity)?;
        self.current = granularity;
        self.manual = true;
        Ok(granularity)
    }

    /// Drop a manual choice and go back to auto-selection
    pub fn reset(&mut self) {
        self.current = auto_select(self.span_days);
        self.manual = false;
    }

    /// Update the span after the underlying data changed
    ///
    /// Returns the granularity in effect afterwards.
    pub fn refresh(&mut self, span_days: i64) -> Granularity {
        self.span_days = span_days;

        if self.manual && validate_granularity(span_days, self.current).is_ok() {
            return self.current;
        }

        if self.manual {
            tracing::debug!(
                previous = %self.current,
                span_days,
                "Manual granularity no longer available, reverting to auto-select"
            );
        }
        self.reset();
        self.current
    }
}
