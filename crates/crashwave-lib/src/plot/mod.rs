use serde::{Deserialize, Serialize};

use crate::{
    config::PlotStyle,
    detectors::peaks::dominant_frequencies,
    metrics::{
        calendar::{CalendarProfile, WEEKDAY_LABELS},
        categories::CategoryBreakdown,
    },
    signal::DailySeries,
    spectrum::Spectrum,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    /// Fixed `(min, max)`; `None` fits the data.
    pub range: Option<(f64, f64)>,
}

impl Axis {
    fn labelled(label: &str) -> Self {
        Self {
            label: Some(label.into()),
            range: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Labelled markers, e.g. spectral peaks tagged with their period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub labels: Vec<String>,
    pub color: Color,
}

/// Vertical bars centred on each point's x, rising from zero to its y.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    /// One label per bar, drawn above it.
    pub labels: Vec<String>,
    /// Bar width in x units.
    pub width: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
    Bars(BarSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
            Series::Bars(bars) => &bars.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis {
                label: None,
                range: None,
            },
            y: Axis {
                label: None,
                range: None,
            },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Data extent over all series as `((x_min, x_max), (y_min, y_max))`,
    /// with fixed axis ranges taking precedence.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let mut x = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y = (f64::INFINITY, f64::NEG_INFINITY);
        for p in self.series.iter().flat_map(|s| s.points()) {
            if self.x.range.is_some_and(|(lo, hi)| p[0] < lo || p[0] > hi) {
                continue;
            }
            x = (x.0.min(p[0]), x.1.max(p[0]));
            y = (y.0.min(p[1]), y.1.max(p[1]));
        }
        let x = self.x.range.unwrap_or(x);
        let y = self.y.range.unwrap_or(y);
        (pad_range(x), pad_range(y))
    }
}

fn pad_range((lo, hi): (f64, f64)) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

/// Draws figures somewhere (PNG, screen, ...).
pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure, style: &PlotStyle) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if max_points == 0 || points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

const RAW_COLOR: Color = Color(0x4682B4);
const FILTERED_COLOR: Color = Color(0x228B22);
const PEAK_COLOR: Color = Color(0xDC143C);
const ACCENT_COLOR: Color = Color(0xFF7F50);

/// Daily counts against day offset from the first date.
pub fn figure_from_daily_series(title: &str, series: &DailySeries, style: &PlotStyle) -> Figure {
    let points: Vec<[f64; 2]> = series
        .days
        .iter()
        .enumerate()
        .map(|(i, day)| [i as f64, day.count as f64])
        .collect();
    let mut fig = Figure::new(Some(title.into()));
    fig.x = Axis::labelled(&match series.start() {
        Some(start) => format!("Days since {start}"),
        None => "Day".into(),
    });
    fig.y = Axis::labelled("Count");
    fig.add_series(Series::Line(LineSeries {
        name: "daily count".into(),
        points: decimate_points(&points, style.max_points),
        style: Style {
            width: style.line_width * 0.5,
            color: RAW_COLOR,
        },
    }));
    fig
}

/// One-sided magnitude spectrum without the DC bin, with the strongest peaks
/// marked by their period.
///
/// A peak is only marked when its magnitude exceeds twice the mean non-DC
/// magnitude, so flat spectra stay unannotated.
pub fn figure_from_spectrum(title: &str, spectrum: &Spectrum, style: &PlotStyle) -> Figure {
    let points: Vec<[f64; 2]> = spectrum
        .points()
        .into_iter()
        .filter(|p| p[0] > 0.0)
        .collect();
    let mut fig = Figure::new(Some(format!("Frequency Spectrum - {title}")));
    fig.x = Axis {
        label: Some("Frequency (cycles/day)".into()),
        range: Some((0.0, style.spectrum_max_frequency.min(spectrum.nyquist()))),
    };
    fig.y = Axis::labelled("Magnitude");

    let mean = if points.is_empty() {
        0.0
    } else {
        points.iter().map(|p| p[1]).sum::<f64>() / points.len() as f64
    };
    let peaks = if style.annotate_top_n > 0 {
        dominant_frequencies(spectrum, style.annotate_top_n).unwrap_or_default()
    } else {
        Vec::new()
    };
    let (marks, labels): (Vec<[f64; 2]>, Vec<String>) = peaks
        .iter()
        .filter(|p| p.magnitude > 2.0 * mean)
        .map(|p| ([p.frequency, p.magnitude], format!("{:.1}d", p.period)))
        .unzip();

    fig.add_series(Series::Line(LineSeries {
        name: "magnitude".into(),
        points: decimate_points(&points, style.max_points),
        style: Style {
            width: style.line_width,
            color: RAW_COLOR,
        },
    }));
    if !marks.is_empty() {
        fig.add_series(Series::Markers(MarkerSeries {
            name: "peaks".into(),
            points: marks,
            labels,
            color: PEAK_COLOR,
        }));
    }
    fig
}

/// Original and filtered signal overlaid on the same sample axis.
pub fn figure_filter_comparison(
    title: &str,
    original: &[f64],
    filtered: &[f64],
    filtered_label: &str,
    style: &PlotStyle,
) -> Figure {
    let indexed = |data: &[f64]| -> Vec<[f64; 2]> {
        let points: Vec<[f64; 2]> = data
            .iter()
            .enumerate()
            .map(|(i, v)| [i as f64, *v])
            .collect();
        decimate_points(&points, style.max_points)
    };
    let mut fig = Figure::new(Some(title.into()));
    fig.x = Axis::labelled("Day");
    fig.y = Axis::labelled("Count");
    fig.add_series(Series::Line(LineSeries {
        name: "original".into(),
        points: indexed(original),
        style: Style {
            width: style.line_width * 0.3,
            color: RAW_COLOR,
        },
    }));
    fig.add_series(Series::Line(LineSeries {
        name: filtered_label.into(),
        points: indexed(filtered),
        style: Style {
            width: style.line_width * 1.5,
            color: FILTERED_COLOR,
        },
    }));
    fig
}

/// One bar per count, labelled, on a `0..n` slot axis starting at zero.
pub fn figure_bar_chart(
    title: &str,
    x_label: &str,
    labels: Vec<String>,
    counts: &[u64],
    color: Color,
    style: &PlotStyle,
) -> Figure {
    let points: Vec<[f64; 2]> = counts
        .iter()
        .enumerate()
        .map(|(i, c)| [i as f64, *c as f64])
        .collect();
    let top = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let mut fig = Figure::new(Some(title.into()));
    fig.x = Axis {
        label: Some(x_label.into()),
        range: Some((-0.5, counts.len() as f64 - 0.5)),
    };
    // Headroom for the labels drawn above the bars.
    fig.y = Axis {
        label: Some("Count".into()),
        range: Some((0.0, top * 1.15)),
    };
    fig.add_series(Series::Bars(BarSeries {
        name: "count".into(),
        points,
        labels,
        width: style.bar_width,
        color,
    }));
    fig
}

/// Hour-of-day and day-of-week bar charts, in that order.
pub fn figure_from_calendar(profile: &CalendarProfile, style: &PlotStyle) -> (Figure, Figure) {
    let hourly = figure_bar_chart(
        "Events by Hour of Day",
        "Hour",
        (0..24).map(|h| h.to_string()).collect(),
        &profile.hourly,
        RAW_COLOR,
        style,
    );
    let weekday = figure_bar_chart(
        "Events by Day of Week",
        "Day",
        WEEKDAY_LABELS.iter().map(|d| d.to_string()).collect(),
        &profile.weekday,
        ACCENT_COLOR,
        style,
    );
    (hourly, weekday)
}

/// Most frequent values of a categorical column, most common first.
pub fn figure_from_categories(breakdown: &CategoryBreakdown, style: &PlotStyle) -> Figure {
    let counts: Vec<u64> = breakdown.top.iter().map(|c| c.count).collect();
    let labels = breakdown.top.iter().map(|c| c.value.clone()).collect();
    figure_bar_chart(
        &format!("Top {} values of {}", counts.len(), breakdown.column),
        "Condition",
        labels,
        &counts,
        ACCENT_COLOR,
        style,
    )
}
