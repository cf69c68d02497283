use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use crashwave_lib::{
    config::{AnalysisConfig, PlotStyle},
    detectors::peaks::{dominant_frequencies, DominantFrequency},
    filter::{apply, FilterKind, FilterSpec},
    io::{events as events_io, text as text_io},
    metrics::{calendar::CalendarProfile, categories::CategoryBreakdown},
    plot::{
        figure_filter_comparison, figure_from_calendar, figure_from_categories,
        figure_from_daily_series, figure_from_spectrum, Figure, PlotBackend, Series,
    },
    series::{build_daily_series, daily_series_from_timestamps},
    signal::{DailySeries, TimeSeries},
    spectrum::forward,
};
use log::info;
use plotters::prelude::*;
use serde::Serialize;
use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "crashwave",
    version,
    about = "Daily event counts, spectra and ideal frequency-domain filters"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where a signal comes from: a numeric sample file / stdin, or an event CSV
/// that is turned into a daily count series first.
#[derive(Args)]
struct SignalArgs {
    /// Numeric samples (newline, comma or whitespace separated); stdin when omitted
    #[arg(long, conflicts_with = "events")]
    input: Option<PathBuf>,
    /// Event CSV to aggregate into daily counts
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long, default_value = "crash_date")]
    date_column: String,
    #[arg(long)]
    start_date: Option<NaiveDate>,
    /// Sampling rate in samples per interval
    #[arg(long, default_value_t = 1.0)]
    fs: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the gap-filled daily count series from an event CSV or a list of dates
    Daily {
        /// Event CSV with a timestamp column
        #[arg(long, conflicts_with = "dates")]
        input: Option<PathBuf>,
        /// Newline-delimited event dates; stdin when neither input is given
        #[arg(long)]
        dates: Option<PathBuf>,
        #[arg(long, default_value = "crash_date")]
        date_column: String,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Write `date,count` CSV here instead of printing JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Magnitude spectrum and dominant periods
    Spectrum {
        #[command(flatten)]
        signal: SignalArgs,
        #[arg(long, default_value_t = 10)]
        top_n: usize,
    },
    /// Ideal (brick-wall) lowpass/highpass/bandpass filter
    Filter {
        #[command(flatten)]
        signal: SignalArgs,
        #[arg(long)]
        kind: FilterKind,
        #[arg(long)]
        cutoff: Option<f64>,
        #[arg(long)]
        low: Option<f64>,
        #[arg(long)]
        high: Option<f64>,
    },
    /// Run the whole pipeline described by a TOML config
    Analyze {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Daily {
            input,
            dates,
            date_column,
            start_date,
            out,
        } => cmd_daily(
            input.as_deref(),
            dates.as_deref(),
            &date_column,
            start_date,
            out.as_deref(),
        )?,
        Commands::Spectrum { signal, top_n } => cmd_spectrum(&signal, top_n)?,
        Commands::Filter {
            signal,
            kind,
            cutoff,
            low,
            high,
        } => cmd_filter(&signal, kind, cutoff, low, high)?,
        Commands::Analyze { config } => cmd_analyze(&config)?,
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => text_io::parse_f64_series(&read_stdin()?),
    }
}

fn load_daily_series(
    path: &Path,
    date_column: &str,
    start_date: Option<NaiveDate>,
) -> Result<DailySeries> {
    let timestamps = events_io::read_event_timestamps(path, date_column, start_date)?;
    let series = daily_series_from_timestamps(&timestamps)
        .with_context(|| format!("building daily series from {}", path.display()))?;
    info!(
        "{} events over {} days from {}",
        series.total(),
        series.len(),
        path.display()
    );
    Ok(series)
}

fn load_signal(args: &SignalArgs) -> Result<TimeSeries> {
    let data = match &args.events {
        Some(path) => load_daily_series(path, &args.date_column, args.start_date)?.values(),
        None => read_samples(args.input.as_deref())?,
    };
    Ok(TimeSeries::new(args.fs, data))
}

fn cmd_daily(
    input: Option<&Path>,
    dates: Option<&Path>,
    date_column: &str,
    start_date: Option<NaiveDate>,
    out: Option<&Path>,
) -> Result<()> {
    let series = match input {
        Some(path) => load_daily_series(path, date_column, start_date)?,
        None => {
            let text = match dates {
                Some(path) => fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => read_stdin()?,
            };
            let parsed = text_io::parse_dates(&text)?;
            build_daily_series(
                parsed
                    .into_iter()
                    .filter(|d| start_date.map_or(true, |start| *d >= start)),
            )?
        }
    };
    match out {
        Some(path) => events_io::write_daily_csv(path, &series)?,
        None => println!("{}", serde_json::to_string(&series)?),
    }
    Ok(())
}

#[derive(Serialize)]
struct SpectrumReport {
    n: usize,
    sampling_rate: f64,
    nyquist: f64,
    dominant: Vec<DominantFrequency>,
}

fn cmd_spectrum(args: &SignalArgs, top_n: usize) -> Result<()> {
    let ts = load_signal(args)?;
    let spectrum = forward(&ts.data, ts.fs)?;
    let dominant = dominant_frequencies(&spectrum, top_n)?;
    let report = SpectrumReport {
        n: spectrum.len(),
        sampling_rate: spectrum.sampling_rate,
        nyquist: spectrum.nyquist(),
        dominant,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct FilterReport {
    spec: FilterSpec,
    kept_bins: usize,
    imag_residual: f64,
    filtered: Vec<f64>,
}

fn cmd_filter(
    args: &SignalArgs,
    kind: FilterKind,
    cutoff: Option<f64>,
    low: Option<f64>,
    high: Option<f64>,
) -> Result<()> {
    let spec = FilterSpec::from_kind(kind, cutoff, low, high)?;
    let ts = load_signal(args)?;
    let out = apply(&ts.data, ts.fs, &spec)?;
    let report = FilterReport {
        spec,
        kept_bins: out.kept_bins,
        imag_residual: out.imag_residual,
        filtered: out.filtered,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct FilterSummary {
    name: String,
    spec: FilterSpec,
    kept_bins: usize,
    imag_residual: f64,
    min: f64,
    max: f64,
}

#[derive(Serialize)]
struct AnalysisSummary {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    days: usize,
    events: u64,
    calendar: CalendarProfile,
    busiest_hour: Option<u32>,
    busiest_weekday: Option<&'static str>,
    categories: Vec<CategoryBreakdown>,
    dominant: Vec<DominantFrequency>,
    filters: Vec<FilterSummary>,
    outputs: Vec<PathBuf>,
}

fn cmd_analyze(config_path: &Path) -> Result<()> {
    let cfg = AnalysisConfig::from_path(config_path)?;
    let specs = cfg.validate()?;
    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating {}", cfg.output_dir.display()))?;
    let mut outputs = Vec::new();

    info!("loading events from {}", cfg.input.display());
    let breakdowns = cfg.analysis.breakdowns();
    let columns: Vec<&str> = breakdowns.iter().map(|(_, column, _)| *column).collect();
    let event_log = events_io::read_events(&cfg.input, &cfg.date_column, cfg.start_date, &columns)?;
    let series = daily_series_from_timestamps(&event_log.timestamps)?;
    let calendar = CalendarProfile::from_timestamps(&event_log.timestamps);
    let categories: Vec<CategoryBreakdown> = breakdowns
        .iter()
        .filter_map(|(name, column, limit)| {
            event_log.column(column)
                .map(|values| CategoryBreakdown::from_values(name, column, values, *limit))
        })
        .collect();
    let daily_csv = cfg.output_dir.join("daily_series.csv");
    events_io::write_daily_csv(&daily_csv, &series)?;
    outputs.push(daily_csv);

    info!("running spectral analysis on {} days", series.len());
    let signal = series.values();
    let spectrum = forward(&signal, cfg.sampling_rate)?;
    let dominant = dominant_frequencies(&spectrum, cfg.top_n)?;
    for item in dominant.iter().take(5) {
        info!("period {:.2} days | magnitude {:.2}", item.period, item.magnitude);
    }

    let mut figures: Vec<(String, Figure)> = Vec::new();
    if cfg.plot.enabled {
        let (hourly, weekday) = figure_from_calendar(&calendar, &cfg.plot);
        figures.push((
            "daily_time_series.png".into(),
            figure_from_daily_series("Daily Event Counts", &series, &cfg.plot),
        ));
        figures.push(("hourly_distribution.png".into(), hourly));
        figures.push(("weekday_distribution.png".into(), weekday));
        figures.push((
            "fft_spectrum.png".into(),
            figure_from_spectrum("Daily Event Counts", &spectrum, &cfg.plot),
        ));
        for breakdown in &categories {
            figures.push((
                format!("{}_conditions.png", breakdown.name),
                figure_from_categories(breakdown, &cfg.plot),
            ));
        }
    }

    let mut filters = Vec::with_capacity(specs.len());
    let mut comparisons = Vec::new();
    for (name, spec) in specs {
        info!("applying {name}: {spec}");
        let out = apply(&signal, cfg.sampling_rate, &spec)?;
        let min = out.filtered.iter().copied().fold(f64::INFINITY, f64::min);
        let max = out.filtered.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if cfg.plot.enabled {
            comparisons.push((
                format!("filter_{name}.png"),
                figure_filter_comparison(
                    &format!("Original vs {name} ({spec})"),
                    &signal,
                    &out.filtered,
                    &name,
                    &cfg.plot,
                ),
            ));
        }
        filters.push(FilterSummary {
            name,
            spec,
            kept_bins: out.kept_bins,
            imag_residual: out.imag_residual,
            min,
            max,
        });
    }

    for (file, fig) in figures.into_iter().chain(comparisons) {
        let path = cfg.output_dir.join(file);
        PngBackend::new(&path).draw(&fig, &cfg.plot)?;
        outputs.push(path);
    }

    let summary = AnalysisSummary {
        start: series.start(),
        end: series.end(),
        days: series.len(),
        events: series.total(),
        busiest_hour: calendar.busiest_hour(),
        busiest_weekday: calendar.busiest_weekday(),
        calendar,
        categories,
        dominant,
        filters,
        outputs,
    };
    let summary_path = cfg.output_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;
    info!("analysis complete, outputs in {}", cfg.output_dir.display());
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Renders figures to PNG files with plotters.
struct PngBackend {
    path: PathBuf,
}

impl PngBackend {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure, style: &PlotStyle) -> Result<()> {
        let backend = BitMapBackend::new(&self.path, (style.width, style.height));
        let root = backend.into_drawing_area();
        root.fill(&WHITE)?;
        let ((x_min, x_max), (y_min, y_max)) = fig.bounds();
        let in_view = |p: &&[f64; 2]| p[0] >= x_min && p[0] <= x_max;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        let mut mesh = chart.configure_mesh();
        if let Some(label) = &fig.x.label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &fig.y.label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw()?;

        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    let color = RGBColor(r, g, b);
                    let width = line.style.width.round().max(1.0) as u32;
                    chart
                        .draw_series(LineSeries::new(
                            line.points.iter().filter(in_view).map(|p| (p[0], p[1])),
                            color.stroke_width(width),
                        ))?
                        .label(line.name.clone())
                        .legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                        });
                }
                Series::Markers(markers) => {
                    let (r, g, b) = markers.color.rgb();
                    let color = RGBColor(r, g, b);
                    chart.draw_series(
                        markers
                            .points
                            .iter()
                            .zip(markers.labels.iter())
                            .filter(|(p, _)| in_view(p))
                            .map(|(p, label)| {
                                EmptyElement::at((p[0], p[1]))
                                    + Circle::new((0, 0), 4, color.filled())
                                    + Text::new(
                                        label.clone(),
                                        (-12, -20),
                                        ("sans-serif", 14).into_font(),
                                    )
                            }),
                    )?;
                }
                Series::Bars(bars) => {
                    let (r, g, b) = bars.color.rgb();
                    let color = RGBColor(r, g, b);
                    let half = bars.width / 2.0;
                    chart
                        .draw_series(bars.points.iter().map(|p| {
                            Rectangle::new([(p[0] - half, 0.0), (p[0] + half, p[1])], color.filled())
                        }))?
                        .label(bars.name.clone())
                        .legend(move |(x, y)| {
                            Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled())
                        });
                    chart.draw_series(bars.points.iter().zip(bars.labels.iter()).map(
                        |(p, label)| {
                            EmptyElement::at((p[0], p[1]))
                                + Text::new(
                                    label.clone(),
                                    (-8, -16),
                                    ("sans-serif", 12).into_font(),
                                )
                        },
                    ))?;
                }
            }
        }
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }
}
