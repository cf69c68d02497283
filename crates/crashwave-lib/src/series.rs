use crate::error::{AnalysisError, Result};
use crate::signal::{DailyCount, DailySeries};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use std::collections::BTreeMap;

/// Group event dates by calendar day and materialize a gap-free daily series.
///
/// Every day in `[min_date, max_date]` appears exactly once; days absent from
/// the input get a zero count so that position `i` is always `i` days after
/// the start. Fails with [`AnalysisError::EmptyInput`] when there are no events.
pub fn build_daily_series<I>(events: I) -> Result<DailySeries>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let grouped = group_by_day(events);
    let (start, end) = match (grouped.first_key_value(), grouped.last_key_value()) {
        (Some((&start, _)), Some((&end, _))) => (start, end),
        _ => return Err(AnalysisError::EmptyInput),
    };

    let days: Vec<DailyCount> = start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| DailyCount {
            date,
            count: grouped.get(&date).copied().unwrap_or(0),
        })
        .collect();

    debug!(
        "daily series {start}..={end}: {} days, {} with events",
        days.len(),
        grouped.len()
    );
    Ok(DailySeries { days })
}

/// Like [`build_daily_series`] but yields an empty series instead of failing
/// when there are no events.
pub fn build_daily_series_allow_empty<I>(events: I) -> DailySeries
where
    I: IntoIterator<Item = NaiveDate>,
{
    build_daily_series(events).unwrap_or_default()
}

/// Convenience wrapper for raw event timestamps.
pub fn daily_series_from_timestamps(timestamps: &[NaiveDateTime]) -> Result<DailySeries> {
    build_daily_series(timestamps.iter().map(|ts| ts.date()))
}

fn group_by_day<I>(events: I) -> BTreeMap<NaiveDate, u64>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut grouped = BTreeMap::new();
    for date in events {
        *grouped.entry(date).or_insert(0u64) += 1;
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = build_daily_series(Vec::<NaiveDate>::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput));
        assert!(build_daily_series_allow_empty(Vec::new()).is_empty());
    }

    #[test]
    fn fills_gaps_with_zero() {
        let events = vec![
            date(2021, 1, 5),
            date(2021, 1, 1),
            date(2021, 1, 1),
            date(2021, 1, 3),
            date(2021, 1, 5),
            date(2021, 1, 5),
        ];
        let series = build_daily_series(events.clone()).unwrap();
        assert_eq!(series.counts(), vec![2, 0, 1, 0, 3]);
        assert_eq!(series.days[1].date, date(2021, 1, 2));
        assert_eq!(series.days[3].count, 0);
        assert_eq!(series.total(), events.len() as u64);
    }

    #[test]
    fn spacing_is_one_day_across_month_and_leap_boundaries() {
        let events = vec![date(2020, 2, 27), date(2020, 3, 2), date(2020, 1, 31)];
        let series = build_daily_series(events).unwrap();
        let expected_len = (date(2020, 3, 2) - date(2020, 1, 31)).num_days() + 1;
        assert_eq!(series.len() as i64, expected_len);
        for pair in series.days.windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 1);
        }
        assert!(series.dates().contains(&date(2020, 2, 29)));
    }

    #[test]
    fn single_event_yields_single_day() {
        let series = build_daily_series([date(2019, 7, 4)]).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.counts(), vec![1]);
    }

    #[test]
    fn timestamps_collapse_to_calendar_days() {
        let stamps = vec![
            date(2022, 5, 1).and_hms_opt(0, 5, 0).unwrap(),
            date(2022, 5, 1).and_hms_opt(23, 59, 59).unwrap(),
            date(2022, 5, 3).and_hms_opt(12, 0, 0).unwrap(),
        ];
        let series = daily_series_from_timestamps(&stamps).unwrap();
        assert_eq!(series.counts(), vec![2, 0, 1]);
    }
}
