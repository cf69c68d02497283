use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Event counts by hour of day and day of week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarProfile {
    /// Index 0 is midnight to 01:00.
    pub hourly: [u64; 24],
    /// Index 0 is Sunday.
    pub weekday: [u64; 7],
}

impl CalendarProfile {
    pub fn from_timestamps(timestamps: &[NaiveDateTime]) -> Self {
        Self {
            hourly: hourly_counts(timestamps),
            weekday: weekday_counts(timestamps),
        }
    }

    pub fn total(&self) -> u64 {
        self.hourly.iter().sum()
    }

    /// Hour with the most events; earliest hour wins ties. `None` when empty.
    pub fn busiest_hour(&self) -> Option<u32> {
        argmax(&self.hourly).map(|i| i as u32)
    }

    /// Label of the weekday with the most events. `None` when empty.
    pub fn busiest_weekday(&self) -> Option<&'static str> {
        argmax(&self.weekday).map(|i| WEEKDAY_LABELS[i])
    }
}

pub fn hourly_counts(timestamps: &[NaiveDateTime]) -> [u64; 24] {
    let mut counts = [0u64; 24];
    for ts in timestamps {
        counts[ts.hour() as usize] += 1;
    }
    counts
}

pub fn weekday_counts(timestamps: &[NaiveDateTime]) -> [u64; 7] {
    let mut counts = [0u64; 7];
    for ts in timestamps {
        counts[ts.weekday().num_days_from_sunday() as usize] += 1;
    }
    counts
}

fn argmax(counts: &[u64]) -> Option<usize> {
    let (idx, max) = counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (i, &c)| if c > best.1 { (i, c) } else { best });
    (max > 0).then_some(idx)
}
