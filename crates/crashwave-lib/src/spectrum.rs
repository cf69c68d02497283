use crate::error::{AnalysisError, Result};
use log::debug;
use realfft::RealFftPlanner;
use rustfft::{num_complex::Complex64, FftPlanner};

/// Discrete spectrum of a real-valued series.
///
/// `transform` is the full N-bin DFT in standard order (bins past the midpoint
/// are negative frequencies). `frequencies` and `magnitudes` form the
/// one-sided view: only bins whose signed frequency is non-negative.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub sampling_rate: f64,
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
    pub transform: Vec<Complex64>,
}

impl Spectrum {
    /// Number of samples the transform was computed from.
    pub fn len(&self) -> usize {
        self.transform.len()
    }
    pub fn is_empty(&self) -> bool {
        self.transform.is_empty()
    }
    pub fn nyquist(&self) -> f64 {
        self.sampling_rate / 2.0
    }
    /// Signed frequency of every bin of `transform`.
    pub fn signed_frequencies(&self) -> Vec<f64> {
        fftfreq(self.transform.len(), self.sampling_rate)
    }
    /// One-sided `[frequency, magnitude]` pairs.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.frequencies
            .iter()
            .zip(self.magnitudes.iter())
            .map(|(f, m)| [*f, *m])
            .collect()
    }
}

/// Signed bin frequencies for an `n`-point DFT sampled at `sampling_rate`.
///
/// Bin `k` maps to `k * rate / n` for the first `ceil(n / 2)` bins and to
/// `-(n - k) * rate / n` for the rest, so for even `n` the Nyquist bin is
/// reported as negative.
pub fn fftfreq(n: usize, sampling_rate: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let scale = sampling_rate / n as f64;
    let split = n.div_ceil(2);
    (0..n)
        .map(|k| {
            if k < split {
                k as f64 * scale
            } else {
                -((n - k) as f64) * scale
            }
        })
        .collect()
}

pub(crate) fn validate_sampling_rate(sampling_rate: f64) -> Result<()> {
    if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
        return Err(AnalysisError::validation(format!(
            "sampling rate must be finite and positive, got {sampling_rate}"
        )));
    }
    Ok(())
}

/// Compute the N-point DFT of `signal` (no padding, no window).
///
/// The one-sided magnitudes are `|X[k]| * 2 / N` for every kept bin,
/// including DC, so a constant `c` shows up as `2c` at frequency zero.
pub fn forward(signal: &[f64], sampling_rate: f64) -> Result<Spectrum> {
    validate_sampling_rate(sampling_rate)?;
    let n = signal.len();
    if n == 0 {
        return Err(AnalysisError::validation("cannot transform an empty signal"));
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut buffer = signal.to_vec();
    let mut half = r2c.make_output_vec();
    r2c.process(&mut buffer, &mut half)
        .map_err(|e| AnalysisError::Transform(e.to_string()))?;

    // A real input has a conjugate-symmetric spectrum: X[n - k] = conj(X[k]).
    let mut transform = Vec::with_capacity(n);
    transform.extend_from_slice(&half);
    for k in half.len()..n {
        transform.push(half[n - k].conj());
    }

    let one_sided = n.div_ceil(2);
    let scale = 2.0 / n as f64;
    let frequencies: Vec<f64> = fftfreq(n, sampling_rate)
        .into_iter()
        .take(one_sided)
        .collect();
    let magnitudes: Vec<f64> = transform[..one_sided]
        .iter()
        .map(|c| c.norm() * scale)
        .collect();

    debug!("forward transform: n={n}, one-sided bins={one_sided}, fs={sampling_rate}");
    Ok(Spectrum {
        sampling_rate,
        frequencies,
        magnitudes,
        transform,
    })
}

/// Inverse DFT returning only the real part.
///
/// Imaginary leftovers are dropped; use [`inverse_with_residual`] to inspect
/// them.
pub fn inverse(transform: &[Complex64]) -> Vec<f64> {
    inverse_with_residual(transform).0
}

/// Inverse DFT returning the real part and the largest absolute imaginary
/// component that was discarded.
///
/// A conjugate-symmetric input yields a residual at floating-point noise level.
pub fn inverse_with_residual(transform: &[Complex64]) -> (Vec<f64>, f64) {
    let n = transform.len();
    if n == 0 {
        return (Vec::new(), 0.0);
    }
    let mut planner = FftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(n);
    let mut buffer = transform.to_vec();
    ifft.process(&mut buffer);

    let norm = 1.0 / n as f64;
    let residual = buffer
        .iter()
        .map(|c| (c.im * norm).abs())
        .fold(0.0, f64::max);
    let real = buffer.iter().map(|c| c.re * norm).collect();
    (real, residual)
}
