//! Ideal (brick-wall) frequency-domain filters.
//!
//! Bins are kept or zeroed outright with no transition band, so sharp cutoffs
//! produce ringing (Gibbs artifacts) in the reconstructed signal. This is not
//! a designed IIR/FIR filter.

use crate::{
    error::{AnalysisError, Result},
    spectrum::{forward, inverse_with_residual},
};
use log::{debug, warn};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Which side(s) of the spectrum a filter passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
}

impl FromStr for FilterKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowpass" | "low" => Ok(Self::Lowpass),
            "highpass" | "high" => Ok(Self::Highpass),
            "bandpass" | "band" => Ok(Self::Bandpass),
            _ => Err(AnalysisError::InvalidFilterSpec(s.to_string())),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lowpass => "lowpass",
            Self::Highpass => "highpass",
            Self::Bandpass => "bandpass",
        };
        f.write_str(name)
    }
}

/// Pass band of an ideal filter, in cycles per sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterSpec {
    Lowpass { cutoff: f64 },
    Highpass { cutoff: f64 },
    Bandpass { low: f64, high: f64 },
}

impl FilterSpec {
    /// Assemble a spec from a kind name plus optional bounds, as found in
    /// config files and command lines.
    pub fn from_parts(
        kind: &str,
        cutoff: Option<f64>,
        low: Option<f64>,
        high: Option<f64>,
    ) -> Result<Self> {
        Self::from_kind(kind.parse()?, cutoff, low, high)
    }

    /// Assemble and validate a spec of an already-parsed kind. Bounds the
    /// kind does not use are ignored.
    pub fn from_kind(
        kind: FilterKind,
        cutoff: Option<f64>,
        low: Option<f64>,
        high: Option<f64>,
    ) -> Result<Self> {
        let spec = match kind {
            FilterKind::Lowpass => Self::Lowpass {
                cutoff: require(cutoff, "cutoff", kind)?,
            },
            FilterKind::Highpass => Self::Highpass {
                cutoff: require(cutoff, "cutoff", kind)?,
            },
            FilterKind::Bandpass => Self::Bandpass {
                low: require(low, "low", kind)?,
                high: require(high, "high", kind)?,
            },
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Lowpass { .. } => FilterKind::Lowpass,
            Self::Highpass { .. } => FilterKind::Highpass,
            Self::Bandpass { .. } => FilterKind::Bandpass,
        }
    }

    /// Check bounds: finite, non-negative, and `low < high` for bandpass.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Lowpass { cutoff } | Self::Highpass { cutoff } => {
                check_bound("cutoff", cutoff)?;
            }
            Self::Bandpass { low, high } => {
                check_bound("low", low)?;
                check_bound("high", high)?;
                if low >= high {
                    return Err(AnalysisError::validation(format!(
                        "bandpass requires low < high, got low={low} high={high}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether a bin at signed frequency `freq` passes. Only `|freq|` matters,
    /// so a bin and its negative-frequency mirror are always treated alike.
    pub fn passes(&self, freq: f64) -> bool {
        let f = freq.abs();
        match *self {
            Self::Lowpass { cutoff } => f <= cutoff,
            Self::Highpass { cutoff } => f >= cutoff,
            Self::Bandpass { low, high } => low <= f && f <= high,
        }
    }

    fn upper_edge(&self) -> f64 {
        match *self {
            Self::Lowpass { cutoff } | Self::Highpass { cutoff } => cutoff,
            Self::Bandpass { high, .. } => high,
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lowpass { cutoff } => write!(f, "lowpass(cutoff={cutoff})"),
            Self::Highpass { cutoff } => write!(f, "highpass(cutoff={cutoff})"),
            Self::Bandpass { low, high } => write!(f, "bandpass({low}..={high})"),
        }
    }
}

fn require(value: Option<f64>, name: &str, kind: FilterKind) -> Result<f64> {
    value.ok_or_else(|| AnalysisError::validation(format!("{kind} filter needs '{name}'")))
}

fn check_bound(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnalysisError::validation(format!(
            "{name} must be finite and non-negative, got {value}"
        )));
    }
    Ok(())
}

/// Result of [`apply`].
#[derive(Debug, Clone)]
pub struct FilterOutput {
    /// Real part of the inverse transform of the masked spectrum.
    pub filtered: Vec<f64>,
    /// Full two-sided spectrum after masking.
    pub masked_spectrum: Vec<Complex64>,
    /// Largest imaginary component dropped during reconstruction.
    pub imag_residual: f64,
    /// Number of bins (of the full transform) that passed the mask.
    pub kept_bins: usize,
}

/// Pass/reject decision for every bin, given each bin's signed frequency.
pub fn build_mask(frequencies: &[f64], spec: &FilterSpec) -> Vec<bool> {
    frequencies.iter().map(|f| spec.passes(*f)).collect()
}

/// Filter `signal` by zeroing every rejected bin of its full DFT and
/// transforming back.
pub fn apply(signal: &[f64], sampling_rate: f64, spec: &FilterSpec) -> Result<FilterOutput> {
    spec.validate()?;
    let spectrum = forward(signal, sampling_rate)?;
    if spec.upper_edge() > spectrum.nyquist() {
        warn!(
            "{spec} reaches past the Nyquist frequency {}; bins above it do not exist",
            spectrum.nyquist()
        );
    }

    let mask = build_mask(&spectrum.signed_frequencies(), spec);
    let zero = Complex64::new(0.0, 0.0);
    let masked_spectrum: Vec<Complex64> = spectrum
        .transform
        .iter()
        .zip(mask.iter())
        .map(|(bin, keep)| if *keep { *bin } else { zero })
        .collect();
    let kept_bins = mask.iter().filter(|keep| **keep).count();

    let (filtered, imag_residual) = inverse_with_residual(&masked_spectrum);
    debug!(
        "{spec}: kept {kept_bins}/{} bins, imaginary residual {imag_residual:e}",
        mask.len()
    );
    Ok(FilterOutput {
        filtered,
        masked_spectrum,
        imag_residual,
        kept_bins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::fftfreq;

    const TEN_DAYS: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 2.0, 3.0, 4.0];

    fn peak_to_peak(data: &[f64]) -> f64 {
        let max = data.iter().copied().fold(f64::MIN, f64::max);
        let min = data.iter().copied().fold(f64::MAX, f64::min);
        max - min
    }

    fn weekly_signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                100.0
                    + 20.0 * (2.0 * std::f64::consts::PI * t / 7.0).cos()
                    + 5.0 * (2.0 * std::f64::consts::PI * t / 91.0).sin()
                    + if i % 3 == 0 { 4.0 } else { -2.0 }
            })
            .collect()
    }

    #[test]
    fn lowpass_at_nyquist_is_identity() {
        for signal in [TEN_DAYS.to_vec(), weekly_signal(365)] {
            let out = apply(&signal, 1.0, &FilterSpec::Lowpass { cutoff: 0.5 }).unwrap();
            assert_eq!(out.kept_bins, signal.len());
            for (a, b) in out.filtered.iter().zip(signal.iter()) {
                assert!((a - b).abs() < 1e-9, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn lowpass_smooths_ten_day_signal_towards_mean() {
        let out = apply(&TEN_DAYS, 1.0, &FilterSpec::Lowpass { cutoff: 0.1 }).unwrap();
        // DC plus the +/-0.1 bins.
        assert_eq!(out.kept_bins, 3);
        let mean = out.filtered.iter().sum::<f64>() / out.filtered.len() as f64;
        assert!((mean - 2.5).abs() < 1e-9);
        assert!(peak_to_peak(&out.filtered) < 1.0);
        assert!(peak_to_peak(&out.filtered) < peak_to_peak(&TEN_DAYS));
        assert!(out.filtered.iter().all(|v| (v - 2.5).abs() < 0.5));
    }

    #[test]
    fn bandpass_isolates_small_component() {
        let out = apply(
            &TEN_DAYS,
            1.0,
            &FilterSpec::Bandpass {
                low: 0.12,
                high: 0.16,
            },
        )
        .unwrap();
        let amplitude = out.filtered.iter().map(|v| v.abs()).fold(0.0, f64::max);
        assert!(amplitude < 0.5 * peak_to_peak(&TEN_DAYS));
    }

    #[test]
    fn weekly_bandpass_recovers_seven_day_cycle() {
        let signal = weekly_signal(364);
        let out = apply(
            &signal,
            1.0,
            &FilterSpec::Bandpass {
                low: 0.12,
                high: 0.16,
            },
        )
        .unwrap();
        let mean = out.filtered.iter().sum::<f64>() / out.filtered.len() as f64;
        assert!(mean.abs() < 1e-9, "DC leaked into bandpass: {mean}");
        let amplitude = out.filtered.iter().map(|v| v.abs()).fold(0.0, f64::max);
        assert!((amplitude - 20.0).abs() < 1.0, "amplitude {amplitude}");
    }

    #[test]
    fn highpass_removes_offset() {
        let signal = weekly_signal(200);
        let out = apply(&signal, 1.0, &FilterSpec::Highpass { cutoff: 0.05 }).unwrap();
        let mean = out.filtered.iter().sum::<f64>() / out.filtered.len() as f64;
        assert!(mean.abs() < 1e-9);
        let zero_cut = apply(&signal, 1.0, &FilterSpec::Highpass { cutoff: 0.0 }).unwrap();
        assert_eq!(zero_cut.kept_bins, signal.len());
    }

    fn nonzero_bins(out: &FilterOutput) -> Vec<usize> {
        out.masked_spectrum
            .iter()
            .enumerate()
            .filter(|(_, bin)| bin.norm() > 1e-12)
            .map(|(k, _)| k)
            .collect()
    }

    #[test]
    fn bandpass_edges_are_inclusive() {
        // Bins 1 and 2 sit exactly on 0.1 and 0.2; 8 and 9 are their mirrors.
        let out = apply(
            &TEN_DAYS,
            1.0,
            &FilterSpec::Bandpass {
                low: 0.1,
                high: 0.2,
            },
        )
        .unwrap();
        assert_eq!(out.kept_bins, 4);
        assert_eq!(nonzero_bins(&out), vec![1, 2, 8, 9]);
        let mean = out.filtered.iter().sum::<f64>() / out.filtered.len() as f64;
        assert!(mean.abs() < 1e-9);
    }

    #[test]
    fn highpass_cutoff_on_a_bin_is_kept() {
        // 0.4 is bin 4 (and its mirror 6); the Nyquist bin 5 reads -0.5.
        let out = apply(&TEN_DAYS, 1.0, &FilterSpec::Highpass { cutoff: 0.4 }).unwrap();
        assert_eq!(out.kept_bins, 3);
        assert_eq!(nonzero_bins(&out), vec![4, 5, 6]);
        assert!(out.imag_residual < 1e-9);
    }

    #[test]
    fn masks_are_symmetric_and_reconstruction_is_real() {
        let signal = weekly_signal(97);
        let peak = signal.iter().map(|v| v.abs()).fold(0.0, f64::max);
        let specs = [
            FilterSpec::Lowpass { cutoff: 0.1 },
            FilterSpec::Highpass { cutoff: 0.2 },
            FilterSpec::Bandpass {
                low: 0.12,
                high: 0.16,
            },
        ];
        for spec in specs {
            let mask = build_mask(&fftfreq(signal.len(), 1.0), &spec);
            let n = mask.len();
            for k in 1..n {
                assert_eq!(mask[k], mask[n - k], "{spec} asymmetric at bin {k}");
            }
            let out = apply(&signal, 1.0, &spec).unwrap();
            assert!(out.imag_residual <= 1e-6 * peak, "{spec}: {}", out.imag_residual);
        }
    }

    #[test]
    fn masked_spectrum_zeroes_rejected_bins() {
        let out = apply(&TEN_DAYS, 1.0, &FilterSpec::Lowpass { cutoff: 0.1 }).unwrap();
        for (k, bin) in out.masked_spectrum.iter().enumerate() {
            if ![0, 1, 9].contains(&k) {
                assert_eq!(bin.norm(), 0.0);
            }
        }
    }

    #[test]
    fn invalid_bandpass_is_rejected() {
        let err = apply(
            &TEN_DAYS,
            1.0,
            &FilterSpec::Bandpass {
                low: 0.2,
                high: 0.1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));

        let negative = FilterSpec::Bandpass {
            low: -0.1,
            high: 0.1,
        };
        assert!(matches!(negative.validate(), Err(AnalysisError::Validation(_))));
        let nan = FilterSpec::Lowpass { cutoff: f64::NAN };
        assert!(matches!(nan.validate(), Err(AnalysisError::Validation(_))));
    }

    #[test]
    fn rejects_bad_sampling_rate() {
        let err = apply(&TEN_DAYS, -1.0, &FilterSpec::Lowpass { cutoff: 0.1 }).unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[test]
    fn parses_kinds_and_parts() {
        assert_eq!("LowPass".parse::<FilterKind>().unwrap(), FilterKind::Lowpass);
        assert!(matches!(
            "notch".parse::<FilterKind>(),
            Err(AnalysisError::InvalidFilterSpec(k)) if k == "notch"
        ));
        let spec = FilterSpec::from_parts("bandpass", None, Some(0.12), Some(0.16)).unwrap();
        assert_eq!(spec.kind(), FilterKind::Bandpass);
        assert!(matches!(
            FilterSpec::from_parts("lowpass", None, Some(0.1), None),
            Err(AnalysisError::Validation(_))
        ));
        assert!(matches!(
            FilterSpec::from_parts("comb", Some(0.1), None, None),
            Err(AnalysisError::InvalidFilterSpec(_))
        ));
    }

    #[test]
    fn from_kind_skips_string_parsing() {
        let spec = FilterSpec::from_kind(FilterKind::Highpass, Some(0.3), Some(0.1), None).unwrap();
        assert_eq!(spec, FilterSpec::Highpass { cutoff: 0.3 });
        assert_eq!(
            FilterSpec::from_parts("high", Some(0.3), None, None).unwrap(),
            spec
        );
        let err = FilterSpec::from_kind(FilterKind::Bandpass, None, Some(0.1), None).unwrap_err();
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn spec_round_trips_through_tagged_json() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"kind":"highpass","cutoff":0.25}"#).unwrap();
        assert_eq!(spec, FilterSpec::Highpass { cutoff: 0.25 });
        assert!(serde_json::from_str::<FilterSpec>(r#"{"kind":"notch","cutoff":0.25}"#).is_err());
    }
}
