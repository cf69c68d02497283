use crate::{
    error::{AnalysisError, Result},
    filter::FilterSpec,
    signal::DailySeries,
    spectrum::validate_sampling_rate,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a full analysis run, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// CSV export with one row per event.
    pub input: PathBuf,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// Events dated before this day are dropped.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_filters")]
    pub filters: Vec<FilterConfig>,
    #[serde(default)]
    pub analysis: CategoryOptions,
    #[serde(default)]
    pub plot: PlotStyle,
}

/// `[analysis]`: categorical columns to break events down by. An empty
/// column name or a zero limit turns a breakdown off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryOptions {
    pub weather_column: String,
    pub weather_top_n: usize,
    pub lighting_column: String,
    pub lighting_top_n: usize,
}

impl Default for CategoryOptions {
    fn default() -> Self {
        Self {
            weather_column: "weather_condition".into(),
            weather_top_n: 10,
            lighting_column: "lighting_condition".into(),
            lighting_top_n: 8,
        }
    }
}

impl CategoryOptions {
    /// `(name, column, limit)` for every enabled breakdown.
    pub fn breakdowns(&self) -> Vec<(&'static str, &str, usize)> {
        [
            ("weather", self.weather_column.trim(), self.weather_top_n),
            ("lighting", self.lighting_column.trim(), self.lighting_top_n),
        ]
        .into_iter()
        .filter(|(_, column, limit)| !column.is_empty() && *limit > 0)
        .collect()
    }
}

/// One `[[filters]]` entry. `kind` stays a string here so that unknown kinds
/// are reported as filter-spec errors rather than TOML syntax errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub cutoff: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
}

impl FilterConfig {
    pub fn to_spec(&self) -> Result<FilterSpec> {
        FilterSpec::from_parts(&self.kind, self.cutoff, self.low, self.high)
    }
}

/// Rendering options handed to every figure builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub line_width: f32,
    /// Upper x-limit of spectrum figures (cycles per interval).
    pub spectrum_max_frequency: f64,
    /// How many spectral peaks to mark with their period.
    pub annotate_top_n: usize,
    /// Cap on plotted points per series.
    pub max_points: usize,
    /// Fraction of each slot a bar fills, in `(0, 1]`.
    pub bar_width: f64,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 1400,
            height: 600,
            line_width: 1.0,
            spectrum_max_frequency: 0.2,
            annotate_top_n: 5,
            max_points: 4096,
            bar_width: 0.8,
        }
    }
}

fn default_date_column() -> String {
    "crash_date".into()
}

fn default_sampling_rate() -> f64 {
    DailySeries::SAMPLING_RATE
}

fn default_top_n() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_filters() -> Vec<FilterConfig> {
    vec![
        FilterConfig {
            name: "lowpass".into(),
            kind: "lowpass".into(),
            cutoff: Some(0.1),
            low: None,
            high: None,
        },
        FilterConfig {
            name: "weekly".into(),
            kind: "bandpass".into(),
            cutoff: None,
            low: Some(0.12),
            high: Some(0.16),
        },
    ]
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        Ok(cfg)
    }

    /// Read a TOML config. A relative `input` or `output_dir` is resolved
    /// against the config file's directory.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if let Some(base) = path.parent() {
            if cfg.input.is_relative() {
                cfg.input = base.join(&cfg.input);
            }
            if cfg.output_dir.is_relative() {
                cfg.output_dir = base.join(&cfg.output_dir);
            }
        }
        Ok(cfg)
    }

    /// Validate everything up front and return the parsed filter specs,
    /// paired with their names.
    pub fn validate(&self) -> Result<Vec<(String, FilterSpec)>> {
        validate_sampling_rate(self.sampling_rate)?;
        if self.top_n == 0 {
            return Err(AnalysisError::validation("top_n must be at least 1"));
        }
        if !(self.plot.bar_width > 0.0 && self.plot.bar_width <= 1.0) {
            return Err(AnalysisError::validation(format!(
                "plot.bar_width must be in (0, 1], got {}",
                self.plot.bar_width
            )));
        }
        self.filters
            .iter()
            .map(|f| Ok((f.name.clone(), f.to_spec()?)))
            .collect()
    }
}
