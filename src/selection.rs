//! Sample selection over a time-aligned trio of vectors.
//!
//! Baseline fitting and histogramming both work on a subset of an
//! episode's samples: either the stretch where the piezo stimulus was
//! (in)active, or user-chosen time intervals. The functions here return
//! fresh vectors; nothing aliases the episode buffers.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How to restrict an episode's samples before an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Use every sample.
    None,
    /// Keep the samples inside the given `[a, b]` intervals (seconds).
    Intervals(Vec<(f64, f64)>),
    /// Keep the samples where the piezo voltage is within `deviation`
    /// (as a fraction of its maximum) of active or inactive level.
    Piezo { active: bool, deviation: f64 },
}

/// Selects the samples at which the piezo voltage is near its maximum
/// (`active`) or near zero (`!active`).
///
/// Works on magnitudes, so the sign of the piezo voltage does not
/// matter. With `M = max(|piezo|)`, a sample `i` is kept when
/// `(M - |piezo[i]|)/M < deviation` (active) or `|piezo[i]|/M <
/// deviation` (inactive).
///
/// Returns the time, piezo and trace values at the kept indices.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use patchclamp_backend::selection::piezo_selection;
///
/// let time = array![0., 1., 2., 3., 4.];
/// let piezo = array![0., 0., 10., 10., 0.];
/// let trace = array![5., 6., 7., 8., 9.];
/// let (t, _p, s) = piezo_selection(&time, &piezo, &trace, true, 0.05).unwrap();
/// assert_eq!(t.to_vec(), vec![2., 3.]);
/// assert_eq!(s.to_vec(), vec![7., 8.]);
/// ```
pub fn piezo_selection(
    time: &Array1<f64>,
    piezo: &Array1<f64>,
    trace: &Array1<f64>,
    active: bool,
    deviation: f64,
) -> Result<(Array1<f64>, Array1<f64>, Array1<f64>)> {
    let max_piezo = piezo.iter().fold(0.0_f64, |m, p| m.max(p.abs()));
    let keep = |p: f64| {
        if active {
            (max_piezo - p.abs()) / max_piezo < deviation
        } else {
            p.abs() / max_piezo < deviation
        }
    };
    let indices: Vec<usize> = piezo
        .iter()
        .enumerate()
        .filter(|(_, &p)| keep(p))
        .map(|(i, _)| i)
        .collect();
    if indices.is_empty() {
        return Err(Error::EmptySelection {
            context: "piezo selection",
        });
    }
    Ok((
        indices.iter().map(|&i| time[i]).collect(),
        indices.iter().map(|&i| piezo[i]).collect(),
        indices.iter().map(|&i| trace[i]).collect(),
    ))
}

/// Selects the samples inside the given time intervals.
///
/// Interval bounds are in seconds and are mapped to sample indices by
/// `round(x * sampling_rate)`, clamped to the signal. Each interval is
/// half-open (`[a, b)`); intervals may overlap, in which case samples
/// repeat, and their order is preserved in the output.
pub fn interval_selection(
    time: &Array1<f64>,
    signal: &Array1<f64>,
    intervals: &[(f64, f64)],
    sampling_rate: f64,
) -> (Array1<f64>, Array1<f64>) {
    let n = signal.len();
    let to_index = |x: f64| ((x * sampling_rate).round().max(0.) as usize).min(n);
    let mut time_out = Vec::new();
    let mut signal_out = Vec::new();
    for &(a, b) in intervals {
        let (start, end) = (to_index(a), to_index(b));
        for i in start..end {
            time_out.push(time[i]);
            signal_out.push(signal[i]);
        }
    }
    (Array1::from_vec(time_out), Array1::from_vec(signal_out))
}
