//! Noise filters for current traces.
//!
//! Two filters are provided: a zero-phase Gaussian low-pass, and the
//! Chung-Kennedy adaptive filter bank, which preserves the sharp level
//! transitions of single-channel records that a plain low-pass smears
//! out.

use ndarray::{Array1, Array2};
use std::f64::consts::PI;

use crate::error::{Error, Result};

// Raw weights are e^(-p); a zero prediction error would divide by zero,
// so the weight is clipped to this value instead.
const WEIGHT_CLIP: f64 = 1e12;

/// Zero-phase Gaussian low-pass at the given cutoff frequency (Hz).
///
/// The kernel standard deviation in samples is
/// `σ = fs · √(ln 2) / (2π · f_c)`; the symmetric kernel has half-width
/// `⌈4σ⌉` and unit sum. The signal is reflectively padded at both ends,
/// so a constant input passes through unchanged.
pub fn gaussian_filter(signal: &Array1<f64>, sampling_rate: f64, filter_freq: f64) -> Array1<f64> {
    let sigma = sampling_rate * (2.0_f64.ln()).sqrt() / (2. * PI * filter_freq);
    let half_width = (4. * sigma).ceil() as isize;

    let mut kernel: Vec<f64> = (-half_width..=half_width)
        .map(|i| (-(i as f64).powi(2) / (2. * sigma * sigma)).exp())
        .collect();
    let kernel_sum: f64 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= kernel_sum;
    }

    let n = signal.len() as isize;
    // Mirror an index into [0, n), repeating the edge sample.
    let reflect = |mut i: isize| -> usize {
        loop {
            if i < 0 {
                i = -i - 1;
            } else if i >= n {
                i = 2 * n - 1 - i;
            } else {
                return i as usize;
            }
        }
    };

    Array1::from_iter((0..n).map(|i| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| w * signal[reflect(i + k as isize - half_width)])
            .sum()
    }))
}

/// Chung-Kennedy adaptive filter bank.
///
/// For each sample the filter forms forward and backward running means
/// over every window length, weights them by the inverse `p`-th power of
/// their smoothed prediction errors, and outputs the weighted sum. Means
/// that straddle a level transition predict poorly and are suppressed,
/// which keeps transitions sharp.
///
/// `apriori_f`/`apriori_b`, when given, replace the forward/backward
/// weights pointwise before normalization; each must have shape
/// `(K, N)` for `K` window lengths and `N` samples.
///
/// Division by zero in the weight computation is clipped to a large
/// finite value, never raised.
pub fn chung_kennedy_filter(
    signal: &Array1<f64>,
    window_lengths: &[usize],
    weight_exponent: f64,
    weight_window: usize,
    apriori_f: Option<&Array2<f64>>,
    apriori_b: Option<&Array2<f64>>,
) -> Result<Array1<f64>> {
    let n = signal.len();
    let k = window_lengths.len();
    if k == 0 {
        return Err(Error::shape("Chung-Kennedy filter needs at least one window length"));
    }
    for apriori in [apriori_f, apriori_b].into_iter().flatten() {
        if apriori.dim() != (k, n) {
            return Err(Error::shape(format!(
                "apriori weights must have shape ({}, {}), got {:?}",
                k,
                n,
                apriori.dim()
            )));
        }
    }

    // Prefix sums make every running mean O(1).
    let mut cumsum = vec![0.; n + 1];
    for (i, &x) in signal.iter().enumerate() {
        cumsum[i + 1] = cumsum[i] + x;
    }
    let mean = |a: usize, b: usize| (cumsum[b] - cumsum[a]) / (b - a) as f64;

    let mut forward = Array2::<f64>::zeros((k, n));
    let mut backward = Array2::<f64>::zeros((k, n));
    let mut w_f = Array2::<f64>::zeros((k, n));
    let mut w_b = Array2::<f64>::zeros((k, n));

    for (row, &window) in window_lengths.iter().enumerate() {
        let window = window.max(1);
        for i in 0..n {
            // Means over the window ending at i (forward) and starting
            // at i (backward), clamped at the boundaries.
            forward[[row, i]] = mean(i.saturating_sub(window - 1), i + 1);
            backward[[row, i]] = mean(i, (i + window).min(n));
        }

        // Squared one-step prediction errors, indices clamped at the ends.
        let err_f: Vec<f64> = (0..n)
            .map(|i| (forward[[row, i]] - signal[(i + 1).min(n - 1)]).powi(2))
            .collect();
        let err_b: Vec<f64> = (0..n)
            .map(|i| (backward[[row, i]] - signal[i.saturating_sub(1)]).powi(2))
            .collect();

        let mut cs_f = vec![0.; n + 1];
        let mut cs_b = vec![0.; n + 1];
        for i in 0..n {
            cs_f[i + 1] = cs_f[i] + err_f[i];
            cs_b[i + 1] = cs_b[i] + err_b[i];
        }
        let m = weight_window.max(1);
        for i in 0..n {
            // Trailing window for the forward error, leading for the backward.
            let (a, b) = (i.saturating_sub(m - 1), i + 1);
            let smoothed_f = (cs_f[b] - cs_f[a]) / (b - a) as f64;
            let (a, b) = (i, (i + m).min(n));
            let smoothed_b = (cs_b[b] - cs_b[a]) / (b - a) as f64;
            w_f[[row, i]] = clipped_inverse_power(smoothed_f, weight_exponent);
            w_b[[row, i]] = clipped_inverse_power(smoothed_b, weight_exponent);
        }
    }

    if let Some(apriori) = apriori_f {
        w_f.assign(apriori);
    }
    if let Some(apriori) = apriori_b {
        w_b.assign(apriori);
    }

    let mut output = Array1::<f64>::zeros(n);
    for i in 0..n {
        let total: f64 = (0..k).map(|row| w_f[[row, i]] + w_b[[row, i]]).sum();
        output[i] = (0..k)
            .map(|row| {
                (w_f[[row, i]] * forward[[row, i]] + w_b[[row, i]] * backward[[row, i]]) / total
            })
            .sum();
    }
    Ok(output)
}

fn clipped_inverse_power(error: f64, exponent: f64) -> f64 {
    if error <= 0. {
        WEIGHT_CLIP
    } else {
        error.powf(-exponent).min(WEIGHT_CLIP)
    }
}
