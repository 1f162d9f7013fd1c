//! Chart refresh
//!
//! Rebuilds everything a trend chart needs from the raw responses in one
//! call: daily series, interval selection, buckets and a short summary.
//! Results are memoised per input fingerprint for a short TTL.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::buckets::aggregate_by_granularity;
use super::daily::{aggregate_daily, data_span_days};
use super::error::SeriesResult;
use super::interval::IntervalSelection;
use super::memo::{fingerprint, Memo};
use super::types::{AggregatedBucket, CalendarRules, DailyAverage, Granularity, RawResponse};

/// Everything needed to render one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSnapshot {
    pub daily: Vec<DailyAverage>,
    pub buckets: Vec<AggregatedBucket>,
    pub selection: IntervalSelection,
    pub summary: SeriesSummary,
}

/// Headline numbers over the whole daily series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub days_logged: usize,
    pub total_samples: usize,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// Unweighted mean of the daily averages
    pub mean_value: Option<f64>,
    /// Average of the most recent logged day
    pub latest_value: Option<f64>,
}

impl SeriesSummary {
    pub fn from_daily(daily: &[DailyAverage]) -> Self {
        if daily.is_empty() {
            return Self::default();
        }

        let values = daily.iter().map(|d| d.average_value);
        let sum: f64 = values.clone().sum();

        Self {
            days_logged: daily.len(),
            total_samples: daily.iter().map(|d| d.sample_count).sum(),
            min_value: Some(values.clone().fold(f64::INFINITY, f64::min)),
            max_value: Some(values.fold(f64::NEG_INFINITY, f64::max)),
            mean_value: Some(sum / daily.len() as f64),
            latest_value: daily.last().map(|d| d.average_value),
        }
    }
}

/// Build a chart snapshot without any memoisation
pub fn build_chart(
    responses: &[RawResponse],
    rules: &CalendarRules,
    selection: IntervalSelection,
) -> ChartSnapshot {
    let daily = aggregate_daily(responses, rules);
    let buckets = aggregate_by_granularity(&daily, selection.current());
    let summary = SeriesSummary::from_daily(&daily);

    ChartSnapshot {
        daily,
        buckets,
        selection,
        summary,
    }
}

/// Stateful chart refresher for one goal/question pair
///
/// Keeps the interval selection across refreshes and memoises the last
/// snapshot. Call [`ChartRefresher::invalidate`] whenever the underlying
/// data changes outside the responses passed in.
#[derive(Debug)]
pub struct ChartRefresher {
    rules: CalendarRules,
    selection: Option<IntervalSelection>,
    memo: Memo<ChartSnapshot>,
}

impl ChartRefresher {
    pub fn new(rules: CalendarRules, ttl: Duration) -> Self {
        Self {
            rules,
            selection: None,
            memo: Memo::new(ttl),
        }
    }

    /// Rebuild the chart for the given responses
    pub fn refresh(&mut self, responses: &[RawResponse]) -> Arc<ChartSnapshot> {
        let selection = match self.selection {
            Some(mut selection) => {
                selection.refresh(data_span_days(responses));
                selection
            }
            None => IntervalSelection::for_responses(responses),
        };
        self.selection = Some(selection);

        let key = fingerprint(
            responses,
            (
                selection.current(),
                self.rules.utc_offset.local_minus_utc(),
            ),
        );
        let rules = self.rules;

        self.memo.get_or_insert_with(key, Instant::now(), || {
            tracing::debug!(
                responses = responses.len(),
                granularity = %selection.current(),
                "Rebuilding chart snapshot"
            );
            build_chart(responses, &rules, selection)
        })
    }

    /// Manually choose a granularity for subsequent refreshes
    ///
    /// Validated against the span seen by the last refresh.
    pub fn select(&mut self, granularity: Granularity) -> SeriesResult<Granularity> {
        let mut selection = self.selection.unwrap_or_else(|| IntervalSelection::new(0));
        let chosen = selection.select(granularity)?;
        self.selection = Some(selection);
        self.memo.invalidate();
        Ok(chosen)
    }

    /// Drop the memoised snapshot
    pub fn invalidate(&mut self) {
        self.memo.invalidate();
    }

    pub fn selection(&self) -> Option<IntervalSelection> {
        self.selection
    }

    /// (hits, misses) of the snapshot memo
    pub fn memo_counters(&self) -> (u64, u64) {
        self.memo.counters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::error::SeriesError;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn responses(days: i64) -> Vec<RawResponse> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        (0..days)
            .map(|i| RawResponse::new(start + ChronoDuration::days(i), (i % 10) as f64))
            .collect()
    }

    #[test]
    fn test_refresh_auto_selects() {
        let mut refresher = ChartRefresher::new(CalendarRules::utc(), Duration::from_secs(30));
        let snapshot = refresher.refresh(&responses(21));

        assert_eq!(snapshot.selection.current(), Granularity::Week);
        assert_eq!(snapshot.daily.len(), 21);
        assert!(snapshot.buckets.len() < snapshot.daily.len());
        assert_eq!(snapshot.summary.days_logged, 21);
        assert_eq!(snapshot.summary.min_value, Some(0.0));
        assert_eq!(snapshot.summary.max_value, Some(9.0));
        assert_eq!(snapshot.summary.latest_value, Some(0.0));
    }

    #[test]
    fn test_refresh_is_memoised() {
        let mut refresher = ChartRefresher::new(CalendarRules::utc(), Duration::from_secs(30));
        let data = responses(40);

        let first = refresher.refresh(&data);
        let second = refresher.refresh(&data);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(refresher.memo_counters(), (1, 1));
    }

    #[test]
    fn test_changed_input_misses_memo() {
        let mut refresher = ChartRefresher::new(CalendarRules::utc(), Duration::from_secs(30));

        let first = refresher.refresh(&responses(40));
        let second = refresher.refresh(&responses(41));

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.daily.len(), 41);
    }

    #[test]
    fn test_manual_selection() {
        let mut refresher = ChartRefresher::new(CalendarRules::utc(), Duration::from_secs(30));
        let data = responses(100);
        refresher.refresh(&data);

        assert!(matches!(
            refresher.select(Granularity::Year),
            Err(SeriesError::InvalidGranularityForSpan { .. })
        ));

        refresher.select(Granularity::Week).unwrap();
        let snapshot = refresher.refresh(&data);
        assert_eq!(snapshot.selection.current(), Granularity::Week);
        assert!(snapshot
            .buckets
            .iter()
            .all(|b| b.granularity == Granularity::Week));
    }

    #[test]
    fn test_empty_responses() {
        let mut refresher = ChartRefresher::new(CalendarRules::utc(), Duration::from_secs(30));
        let snapshot = refresher.refresh(&[]);

        assert!(snapshot.daily.is_empty());
        assert!(snapshot.buckets.is_empty());
        assert_eq!(snapshot.summary, SeriesSummary::default());
        assert_eq!(snapshot.selection.current(), Granularity::Day);
    }

    #[test]
    fn test_memo_does_not_change_results() {
        let data = responses(200);
        let mut refresher = ChartRefresher::new(CalendarRules::utc(), Duration::from_secs(30));
        let memoised = refresher.refresh(&data);

        let direct = build_chart(&data, &CalendarRules::utc(), IntervalSelection::new(199));
        assert_eq!(*memoised, direct);
    }
}
