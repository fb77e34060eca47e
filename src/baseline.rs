//! Baseline correction of an episode's current trace.
//!
//! Patch-clamp amplifiers drift; the baseline corrector estimates the
//! drift from a subset of samples (typically where the piezo stimulus is
//! inactive, so no channel activity is expected) and subtracts it from
//! the whole trace.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::selection::{interval_selection, piezo_selection, Selection};

/// Baseline estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineMethod {
    /// Least-squares polynomial fit, evaluated over the full trace.
    Polynomial,
    /// Subtraction of the mean of the selected samples.
    Offset,
}

/// Subtracts the estimated baseline from `trace`.
///
/// The selection restricts only the fit; the resulting baseline is
/// evaluated at every original time point and subtracted from the full
/// trace. `degree` is ignored by the `Offset` method.
///
/// # Errors
///
/// * `EmptySelection` if the selection leaves no samples.
/// * `InsufficientSamples` if fewer than `degree + 1` samples remain
///   for a polynomial fit.
/// * `ShapeMismatch` if piezo selection is requested without piezo data.
///
/// # Example
///
/// A linear trend is removed exactly by a degree-1 fit:
///
/// ```
/// use ndarray::array;
/// use patchclamp_backend::baseline::{baseline_correction, BaselineMethod};
/// use patchclamp_backend::selection::Selection;
///
/// let time = array![0., 1., 2., 3.];
/// let trace = array![1., 2., 3., 4.];
/// let corrected = baseline_correction(
///     &time, &trace, 1., None, BaselineMethod::Polynomial, 1, &Selection::None,
/// ).unwrap();
/// assert!(corrected.iter().all(|&x| x.abs() < 1e-9));
/// ```
pub fn baseline_correction(
    time: &Array1<f64>,
    trace: &Array1<f64>,
    sampling_rate: f64,
    piezo: Option<&Array1<f64>>,
    method: BaselineMethod,
    degree: usize,
    selection: &Selection,
) -> Result<Array1<f64>> {
    let (t, s) = match selection {
        Selection::None => (time.clone(), trace.clone()),
        Selection::Intervals(intervals) => {
            interval_selection(time, trace, intervals, sampling_rate)
        }
        Selection::Piezo { active, deviation } => {
            let piezo = piezo.ok_or_else(|| {
                Error::shape("piezo selection requested on an episode without piezo data")
            })?;
            let (t, _, s) = piezo_selection(time, piezo, trace, *active, *deviation)?;
            (t, s)
        }
    };
    if s.is_empty() {
        return Err(Error::EmptySelection {
            context: "baseline fit",
        });
    }

    match method {
        BaselineMethod::Offset => {
            let offset = s.sum() / s.len() as f64;
            Ok(trace - offset)
        }
        BaselineMethod::Polynomial => {
            let coeffs = polyfit(&t, &s, degree)?;
            let baseline = polyval(&coeffs, time);
            Ok(trace - &baseline)
        }
    }
}

/// Least-squares polynomial fit of the given degree.
///
/// Coefficients are returned highest power first, so the fitted value at
/// `t` is `Σ coeffs[i] · t^(degree - i)`. The fit solves the normal
/// equations of the Vandermonde system with partial-pivot elimination.
pub fn polyfit(t: &Array1<f64>, s: &Array1<f64>, degree: usize) -> Result<Vec<f64>> {
    let n = t.len();
    let k = degree + 1;
    if n < k {
        return Err(Error::InsufficientSamples {
            degree,
            n_samples: n,
        });
    }

    // Normal equations: a[r][c] = Σ t^(2·degree - r - c), b[r] = Σ s·t^(degree - r).
    let mut a = vec![vec![0.; k]; k];
    let mut b = vec![0.; k];
    for (&ti, &si) in t.iter().zip(s.iter()) {
        // Powers t^0 .. t^(2·degree) of this sample.
        let mut powers = vec![1.; 2 * degree + 1];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * ti;
        }
        for r in 0..k {
            for c in 0..k {
                a[r][c] += powers[2 * degree - r - c];
            }
            b[r] += si * powers[degree - r];
        }
    }

    // Gaussian elimination with partial pivoting.
    for col in 0..k {
        let pivot = (col..k)
            .max_by(|&r1, &r2| a[r1][col].abs().partial_cmp(&a[r2][col].abs()).unwrap())
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-300 {
            return Err(Error::InsufficientSamples {
                degree,
                n_samples: n,
            });
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..k {
            let w = a[row][col] / a[col][col];
            for c in col..k {
                a[row][c] -= w * a[col][c];
            }
            b[row] -= w * b[col];
        }
    }
    let mut coeffs = vec![0.; k];
    for row in (0..k).rev() {
        let tail: f64 = (row + 1..k).map(|c| a[row][c] * coeffs[c]).sum();
        coeffs[row] = (b[row] - tail) / a[row][row];
    }
    Ok(coeffs)
}

/// Evaluates a polynomial (coefficients highest power first) at every
/// point of `t`.
pub fn polyval(coeffs: &[f64], t: &Array1<f64>) -> Array1<f64> {
    t.mapv(|ti| coeffs.iter().fold(0., |acc, &c| acc * ti + c))
}
