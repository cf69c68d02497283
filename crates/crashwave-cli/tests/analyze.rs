use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};

#[derive(Deserialize)]
struct Dominant {
    frequency: f64,
    period: f64,
}

#[derive(Deserialize)]
struct FilterSummary {
    name: String,
    imag_residual: f64,
}

#[derive(Deserialize)]
struct CategoryCount {
    value: String,
    count: u64,
}

#[derive(Deserialize)]
struct Breakdown {
    name: String,
    top: Vec<CategoryCount>,
}

#[derive(Deserialize)]
struct Summary {
    days: usize,
    events: u64,
    busiest_hour: Option<u32>,
    busiest_weekday: Option<String>,
    categories: Vec<Breakdown>,
    dominant: Vec<Dominant>,
    filters: Vec<FilterSummary>,
    outputs: Vec<PathBuf>,
}

fn top_pairs(breakdown: &Breakdown) -> Vec<(&str, u64)> {
    breakdown
        .top
        .iter()
        .map(|c| (c.value.as_str(), c.count))
        .collect()
}

fn events_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("test_data/events_sample.csv")
}

fn write_config(dir: &std::path::Path, plot: bool, extra: &str) -> Result<PathBuf, Box<dyn Error>> {
    let config = format!(
        "input = {:?}\nstart_date = \"2017-01-01\"\ntop_n = 3\noutput_dir = \"out\"\n\n[plot]\nenabled = {}\nwidth = 640\nheight = 360\n{}",
        events_path().to_string_lossy(),
        plot,
        extra
    );
    let path = dir.join("analysis.toml");
    fs::write(&path, config)?;
    Ok(path)
}

#[test]
fn analyze_runs_full_pipeline() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = write_config(dir.path(), false, "")?;

    let mut cmd = cargo_bin_cmd!("crashwave");
    cmd.args(["analyze", "--config", config.to_str().expect("utf8 path")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&out)?;

    assert_eq!(summary.days, 10);
    assert_eq!(summary.events, 11);
    assert_eq!(summary.busiest_hour, Some(17));
    assert_eq!(summary.busiest_weekday.as_deref(), Some("Sun"));
    assert!(!summary.dominant.is_empty() && summary.dominant.len() <= 3);
    for d in &summary.dominant {
        assert!(d.frequency > 0.0);
        assert!((d.period * d.frequency - 1.0).abs() < 1e-9);
    }
    let names: Vec<&str> = summary.filters.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["lowpass", "weekly"]);
    assert!(summary.filters.iter().all(|f| f.imag_residual < 1e-9));

    let names: Vec<&str> = summary.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["weather", "lighting"]);
    assert_eq!(
        top_pairs(&summary.categories[0]),
        vec![("CLEAR", 8), ("RAIN", 2), ("SNOW", 1)]
    );
    // DUSK and DAYLIGHT tie; DUSK is seen first.
    assert_eq!(
        top_pairs(&summary.categories[1]),
        vec![("DUSK", 4), ("DAYLIGHT", 4), ("DARKNESS", 3)]
    );
    assert_eq!(summary.outputs.len(), 1);

    let out_dir = dir.path().join("out");
    assert!(out_dir.join("daily_series.csv").exists());
    assert!(out_dir.join("summary.json").exists());
    Ok(())
}

#[test]
fn analyze_rejects_unknown_filter_kind() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = write_config(
        dir.path(),
        false,
        "\n[[filters]]\nname = \"odd\"\nkind = \"notch\"\ncutoff = 0.1\n",
    )?;
    let mut cmd = cargo_bin_cmd!("crashwave");
    cmd.args(["analyze", "--config", config.to_str().expect("utf8 path")]);
    let stderr = cmd.assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8_lossy(&stderr).contains("notch"));
    Ok(())
}

#[test]
fn analyze_limits_and_disables_breakdowns() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = write_config(
        dir.path(),
        false,
        "\n[analysis]\nweather_top_n = 1\nlighting_column = \"\"\n",
    )?;
    let mut cmd = cargo_bin_cmd!("crashwave");
    cmd.args(["analyze", "--config", config.to_str().expect("utf8 path")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&out)?;
    assert_eq!(summary.categories.len(), 1);
    assert_eq!(top_pairs(&summary.categories[0]), vec![("CLEAR", 8)]);
    Ok(())
}

#[test]
fn analyze_renders_every_figure() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = write_config(dir.path(), true, "")?;
    let mut cmd = cargo_bin_cmd!("crashwave");
    cmd.args(["analyze", "--config", config.to_str().expect("utf8 path")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&out)?;

    let files: Vec<String> = summary
        .outputs
        .iter()
        .filter_map(|p| p.file_name().map(|f| f.to_string_lossy().into_owned()))
        .collect();
    for expected in [
        "daily_series.csv",
        "daily_time_series.png",
        "hourly_distribution.png",
        "weekday_distribution.png",
        "fft_spectrum.png",
        "weather_conditions.png",
        "lighting_conditions.png",
        "filter_lowpass.png",
        "filter_weekly.png",
    ] {
        assert!(files.iter().any(|f| f == expected), "missing {expected} in {files:?}");
    }
    for path in &summary.outputs {
        let len = fs::metadata(path)?.len();
        assert!(len > 0, "{} is empty", path.display());
    }
    Ok(())
}
