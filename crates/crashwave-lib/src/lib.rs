pub mod config;
pub mod detectors;
pub mod error;
pub mod filter;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod series;
pub mod signal;
pub mod spectrum;

pub use detectors::peaks::{dominant_frequencies, DominantFrequency};
pub use error::{AnalysisError, Result};
pub use filter::{apply, FilterKind, FilterOutput, FilterSpec};
pub use series::build_daily_series;
pub use signal::*;
pub use spectrum::{forward, inverse, Spectrum};
