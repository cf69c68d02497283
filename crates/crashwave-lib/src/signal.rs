use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Uniformly sampled real-valued series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Samples per interval (1.0 for one sample per day)
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Number of events observed on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Gap-free daily count series.
///
/// One entry per calendar day between the first and last observed day
/// (inclusive), strictly increasing by one day. Days with no events carry a
/// zero count. Numeric consumers index it by position only; the dates are kept
/// for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySeries {
    pub days: Vec<DailyCount>,
}

impl DailySeries {
    /// Sampling rate of a daily series: one sample per day.
    pub const SAMPLING_RATE: f64 = 1.0;

    pub fn len(&self) -> usize {
        self.days.len()
    }
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
    pub fn start(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }
    pub fn end(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }
    pub fn counts(&self) -> Vec<u64> {
        self.days.iter().map(|d| d.count).collect()
    }
    /// Total number of events across all days.
    pub fn total(&self) -> u64 {
        self.days.iter().map(|d| d.count).sum()
    }
    /// Counts as `f64` samples, ready for the spectral transform.
    pub fn values(&self) -> Vec<f64> {
        self.days.iter().map(|d| d.count as f64).collect()
    }
}
