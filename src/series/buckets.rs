//! Calendar-Bucket Aggregator
//!
//! Groups a daily series into calendar-aligned windows. Bucket boundaries:
//!
//! - `week`: ISO-8601 week (Monday through Sunday, keyed by ISO week-year)
//! - `month`: first to last day of the calendar month
//! - `quarter`: Jan/Apr/Jul/Oct 1 plus three months
//! - `half`: Jan 1 (H1) or Jul 1 (H2) plus six months
//! - `year`: Jan 1 to Dec 31
//!
//! Only buckets with at least one contributing day are emitted.

use chrono::{Datelike, Duration, Months, NaiveDate};
use std::collections::HashMap;

use super::types::{AggregatedBucket, CalendarDay, DailyAverage, Granularity};

impl Granularity {
    /// First day of the bucket containing `day`
    pub fn bucket_start(&self, day: CalendarDay) -> CalendarDay {
        let first_of = |month: u32| NaiveDate::from_ymd_opt(day.year(), month, 1).unwrap_or(day);

        match self {
            Self::Day => day,
            Self::Week => {
                let days_since_monday = day.weekday().num_days_from_monday() as i64;
                day - Duration::days(days_since_monday)
            }
            Self::Month => first_of(day.month()),
            Self::Quarter => {
                let quarter_index = (day.month() - 1) / 3 + 1;
                first_of((quarter_index - 1) * 3 + 1)
            }
            Self::Half => first_of(if day.month() <= 6 { 1 } else { 7 }),
            Self::Year => first_of(1),
        }
    }

    /// Last day (inclusive) of the bucket starting at `start`
    pub fn bucket_end(&self, start: CalendarDay) -> CalendarDay {
        match self {
            Self::Day => start,
            Self::Week => start + Duration::days(6),
            Self::Month | Self::Quarter | Self::Half | Self::Year => start
                .checked_add_months(Months::new(self.components_per_bucket()))
                .and_then(|next| next.pred_opt())
                .unwrap_or(start),
        }
    }

    /// Display label for a bucket window
    pub fn label(&self, start: CalendarDay, end: CalendarDay) -> String {
        match self {
            Self::Day => start.format("%b %-d").to_string(),
            Self::Week => format!("{}–{}", start.format("%b %-d"), end.format("%b %-d")),
            Self::Month => start.format("%b %Y").to_string(),
            Self::Quarter => format!("Q{} {}", (start.month() - 1) / 3 + 1, start.year()),
            Self::Half => {
                let half = if start.month() <= 6 { 1 } else { 2 };
                format!("H{} {}", half, start.year())
            }
            Self::Year => start.year().to_string(),
        }
    }
}

/// Aggregate a daily series into buckets of the given granularity
///
/// The bucket average is the unweighted mean of the member daily averages:
/// a day with one answer counts as much as a day with twenty. Sample counts
/// are summed. Output is sorted ascending by `start_date`.
pub fn aggregate_by_granularity(
    daily: &[DailyAverage],
    granularity: Granularity,
) -> Vec<AggregatedBucket> {
    if granularity == Granularity::Day {
        let mut buckets: Vec<AggregatedBucket> =
            daily.iter().map(AggregatedBucket::from_daily).collect();
        buckets.sort_by_key(|b| b.start_date);
        return buckets;
    }

    let mut groups: HashMap<CalendarDay, Vec<&DailyAverage>> = HashMap::new();
    for entry in daily {
        groups
            .entry(granularity.bucket_start(entry.date))
            .or_default()
            .push(entry);
    }

    let mut buckets: Vec<AggregatedBucket> = groups
        .into_iter()
        .map(|(start_date, members)| summarize_bucket(start_date, &members, granularity))
        .collect();

    buckets.sort_by_key(|b| b.start_date);
    buckets
}

fn summarize_bucket(
    start_date: CalendarDay,
    members: &[&DailyAverage],
    granularity: Granularity,
) -> AggregatedBucket {
    let mut sum = 0.0;
    let mut min_value = f64::INFINITY;
    let mut max_value = f64::NEG_INFINITY;
    let mut sample_count = 0;

    for member in members {
        sum += member.average_value;
        min_value = min_value.min(member.average_value);
        max_value = max_value.max(member.average_value);
        sample_count += member.sample_count;
    }

    // Rounding can push the mean a hair outside [min, max]
    let average_value = (sum / members.len() as f64).max(min_value).min(max_value);

    AggregatedBucket {
        start_date,
        end_date: granularity.bucket_end(start_date),
        average_value,
        min_value,
        max_value,
        sample_count,
        granularity,
    }
}
