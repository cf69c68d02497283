use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, warn};
use std::path::Path;

use crate::signal::DailySeries;

/// Timestamp layouts accepted in event exports, tried in order.
const DATETIME_FORMATS: [&str; 4] = [
    "%m/%d/%Y %I:%M:%S %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse an event timestamp. A bare `YYYY-MM-DD` or `MM/DD/YYYY` date is
/// taken as midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%d", "%m/%d/%Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Raw values of one categorical column, row-aligned with
/// [`EventLog::timestamps`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryColumn {
    pub column: String,
    pub values: Vec<String>,
}

/// Events read from an export: their timestamps plus any requested
/// categorical columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    pub timestamps: Vec<NaiveDateTime>,
    pub categories: Vec<CategoryColumn>,
}

impl EventLog {
    /// Values of `column`, if it was requested and present in the header.
    pub fn column(&self, column: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.column.eq_ignore_ascii_case(column))
            .map(|c| c.values.as_slice())
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Read event timestamps from one column of a headed CSV export.
///
/// Rows with blank or unparsable timestamps are skipped with a warning. Rows
/// dated before `start_date` are dropped.
pub fn read_event_timestamps(
    path: &Path,
    date_column: &str,
    start_date: Option<NaiveDate>,
) -> Result<Vec<NaiveDateTime>> {
    Ok(read_events(path, date_column, start_date, &[])?.timestamps)
}

/// Like [`read_event_timestamps`], also collecting `category_columns` for the
/// rows that are kept. A requested column missing from the header is logged
/// and left out of the result.
pub fn read_events(
    path: &Path,
    date_column: &str,
    start_date: Option<NaiveDate>,
    category_columns: &[&str],
) -> Result<EventLog> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers().context("reading header")?.clone();
    let column = find_column(&headers, date_column)
        .with_context(|| format!("missing timestamp column '{}'", date_column))?;
    let mut categories: Vec<(usize, CategoryColumn)> = Vec::new();
    for name in category_columns {
        match find_column(&headers, name) {
            Some(idx) => categories.push((
                idx,
                CategoryColumn {
                    column: name.to_string(),
                    values: Vec::new(),
                },
            )),
            None => warn!("{}: no column '{}', skipping it", path.display(), name),
        }
    }

    let mut timestamps = Vec::new();
    let mut skipped = 0usize;
    let mut before_start = 0usize;
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading record {}", row + 1))?;
        let raw = record.get(column).unwrap_or("");
        let Some(ts) = parse_timestamp(raw) else {
            skipped += 1;
            warn!("row {}: unparsable timestamp '{}', skipping", row + 1, raw);
            continue;
        };
        if start_date.is_some_and(|start| ts.date() < start) {
            before_start += 1;
            continue;
        }
        timestamps.push(ts);
        for (idx, category) in categories.iter_mut() {
            category
                .values
                .push(record.get(*idx).unwrap_or("").trim().to_string());
        }
    }
    debug!(
        "{}: {} events kept, {} unparsable, {} before start date",
        path.display(),
        timestamps.len(),
        skipped,
        before_start
    );
    Ok(EventLog {
        timestamps,
        categories: categories.into_iter().map(|(_, c)| c).collect(),
    })
}

/// Write the daily series as `date,count` rows.
pub fn write_daily_csv(path: &Path, series: &DailySeries) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for day in &series.days {
        writer.serialize(day).context("writing daily row")?;
    }
    writer.flush()?;
    Ok(())
}
