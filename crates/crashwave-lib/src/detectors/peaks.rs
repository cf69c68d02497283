use crate::{
    error::{AnalysisError, Result},
    spectrum::Spectrum,
};
use serde::{Deserialize, Serialize};
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

/// A ranked spectral peak. `period` is in sampling intervals (days for a
/// daily series).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantFrequency {
    pub frequency: f64,
    pub period: f64,
    pub magnitude: f64,
}

/// Heap entry ordered so that "stronger" compares greater: higher magnitude
/// first, lower frequency on ties.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    frequency: f64,
    magnitude: f64,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.magnitude
            .total_cmp(&other.magnitude)
            .then_with(|| other.frequency.total_cmp(&self.frequency))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Rank the strongest strictly-positive frequencies of a one-sided spectrum.
///
/// DC and any non-positive bin are never reported. Results are sorted by
/// descending magnitude, ties by ascending frequency, and hold at most
/// `top_n` records.
pub fn dominant_frequencies(spectrum: &Spectrum, top_n: usize) -> Result<Vec<DominantFrequency>> {
    if top_n == 0 {
        return Err(AnalysisError::validation("top_n must be at least 1"));
    }

    // Min-heap of the best `top_n` seen so far; the weakest sits on top.
    let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(top_n + 1);
    let bins = spectrum
        .frequencies
        .iter()
        .zip(spectrum.magnitudes.iter())
        .filter(|(f, m)| **f > 0.0 && f.is_finite() && !m.is_nan());
    for (&frequency, &magnitude) in bins {
        let candidate = Candidate {
            frequency,
            magnitude,
        };
        if heap.len() < top_n {
            heap.push(Reverse(candidate));
            continue;
        }
        let stronger = heap
            .peek()
            .is_some_and(|Reverse(weakest)| candidate > *weakest);
        if stronger {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    // Sorting `Reverse` ascending puts the strongest candidate first.
    Ok(heap
        .into_sorted_vec()
        .into_iter()
        .map(|Reverse(c)| DominantFrequency {
            frequency: c.frequency,
            period: 1.0 / c.frequency,
            magnitude: c.magnitude,
        })
        .collect())
}
