//! Daily Aggregator
//!
//! Collapses raw timestamped answers into one average per calendar day.
//!
//! ```text
//! RawResponse* → day_of(timestamp) → group → mean → DailyAverage (sorted)
//! ```

use std::collections::HashMap;

use super::types::{CalendarDay, DailyAverage, DayBoundary, RawResponse};

/// Average raw answers per calendar day
///
/// Answers without a numeric value are skipped. The output holds one
/// entry per distinct day, sorted ascending by date. Empty input yields
/// an empty series.
pub fn aggregate_daily<B: DayBoundary + ?Sized>(
    responses: &[RawResponse],
    boundary: &B,
) -> Vec<DailyAverage> {
    let mut groups: HashMap<CalendarDay, (f64, usize)> = HashMap::new();
    let mut skipped = 0usize;

    for response in responses {
        let Some(value) = response.numeric_value else {
            skipped += 1;
            continue;
        };
        let day = boundary.day_of(response.timestamp);
        let entry = groups.entry(day).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Ignored responses without a numeric value");
    }

    let mut daily: Vec<DailyAverage> = groups
        .into_iter()
        .map(|(date, (sum, count))| DailyAverage {
            date,
            average_value: sum / count as f64,
            sample_count: count,
        })
        .collect();

    daily.sort_by_key(|d| d.date);
    daily
}

/// Whole days between the earliest and latest response timestamps
///
/// Counted in 24-hour periods between the raw instants; no day boundary is
/// applied. Returns 0 for empty input or when every answer falls within one
/// day.
pub fn data_span_days(responses: &[RawResponse]) -> i64 {
    let mut timestamps = responses.iter().map(|r| r.timestamp);
    let Some(first) = timestamps.next() else {
        return 0;
    };

    let (earliest, latest) = timestamps.fold((first, first), |(lo, hi), ts| {
        (lo.min(ts), hi.max(ts))
    });

    (latest - earliest).num_days().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::types::CalendarRules;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_daily_averages() {
        // Deliberately unordered
        let responses = vec![
            RawResponse::new(at(4, 9), 4.0),
            RawResponse::new(at(1, 8), 6.0),
            RawResponse::new(at(2, 12), 10.0),
            RawResponse::new(at(1, 20), 8.0),
        ];

        let daily = aggregate_daily(&responses, &CalendarRules::utc());

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(daily[0].average_value, 7.0);
        assert_eq!(daily[0].sample_count, 2);
        assert_eq!(daily[1].average_value, 10.0);
        assert_eq!(daily[1].sample_count, 1);
        assert_eq!(daily[2].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(daily[2].average_value, 4.0);
    }

    #[test]
    fn test_empty_input() {
        let daily = aggregate_daily(&[], &CalendarRules::utc());
        assert!(daily.is_empty());
        assert_eq!(data_span_days(&[]), 0);
    }

    #[test]
    fn test_missing_values_skipped() {
        let responses = vec![
            RawResponse::new(at(1, 8), 3.0),
            RawResponse::empty(at(1, 9)),
            RawResponse::empty(at(2, 9)),
        ];

        let daily = aggregate_daily(&responses, &CalendarRules::utc());

        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].sample_count, 1);
    }

    #[test]
    fn test_offset_moves_late_answers_to_next_day() {
        let responses = vec![
            RawResponse::new(at(1, 12), 2.0),
            RawResponse::new(at(1, 23), 4.0),
        ];

        let utc = aggregate_daily(&responses, &CalendarRules::utc());
        assert_eq!(utc.len(), 1);

        let east = aggregate_daily(&responses, &CalendarRules::from_offset_minutes(180).unwrap());
        assert_eq!(east.len(), 2);
        assert_eq!(east[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_aggregation_is_repeatable() {
        let responses: Vec<RawResponse> = (0..50)
            .map(|i| RawResponse::new(at(1, 0) + Duration::hours(i * 7), (i % 5) as f64))
            .collect();
        let rules = CalendarRules::utc();

        assert_eq!(
            aggregate_daily(&responses, &rules),
            aggregate_daily(&responses, &rules)
        );
    }

    #[test]
    fn test_data_span_days() {
        let responses = vec![
            RawResponse::new(at(21, 8), 1.0),
            RawResponse::new(at(1, 9), 1.0),
            RawResponse::new(at(10, 9), 1.0),
        ];
        // 2024-01-01 09:00 to 2024-01-21 08:00 is 19 whole days
        assert_eq!(data_span_days(&responses), 19);

        let same_day = vec![RawResponse::new(at(3, 1), 1.0), RawResponse::new(at(3, 22), 1.0)];
        assert_eq!(data_span_days(&same_day), 0);
    }

    #[test]
    fn test_span_uses_instants_not_calendar_days() {
        let responses = vec![
            RawResponse::new(at(1, 23), 1.0),
            RawResponse::new(at(15, 8), 1.0),
        ];
        assert_eq!(data_span_days(&responses), 13);

        // The day boundary changes which days are logged, never the span
        let east = CalendarRules::from_offset_minutes(120).unwrap();
        assert_eq!(aggregate_daily(&responses, &east).len(), 2);
        assert_eq!(data_span_days(&responses), 13);
    }
}
