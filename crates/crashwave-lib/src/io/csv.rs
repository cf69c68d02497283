#[cfg(feature = "polars")]
pub mod polars_io {
    use anyhow::{Context, Result};
    use chrono::NaiveDate;
    use log::warn;
    use polars::prelude::*;

    use crate::io::events::parse_timestamp;

    /// Load one timestamp column of a CSV export through polars and reduce it
    /// to event dates. Nulls and unparsable cells are skipped.
    pub fn load_event_dates(path: &str, col: &str) -> Result<Vec<NaiveDate>> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))?
            .finish()?;
        let s = df
            .column(col)
            .with_context(|| format!("missing timestamp column '{}'", col))?;
        let mut dates = Vec::with_capacity(s.len());
        for value in s.str()?.into_iter().flatten() {
            match parse_timestamp(value) {
                Some(ts) => dates.push(ts.date()),
                None => warn!("unparsable timestamp '{}', skipping", value),
            }
        }
        Ok(dates)
    }

}
