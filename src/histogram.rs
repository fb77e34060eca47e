//! Amplitude histograms of current traces.

use ndarray::Array1;

use crate::error::{Error, Result};

/// A binned amplitude distribution.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Count (or probability density) per bin.
    pub heights: Array1<f64>,
    /// Bin edges, `n_bins + 1` values.
    pub bin_edges: Array1<f64>,
    /// Bin centers.
    pub centers: Array1<f64>,
    /// Width of every bin.
    pub width: f64,
}

/// Bins `values` into `n_bins` equal-width bins spanning their range.
///
/// With `density` the heights integrate to one. Values equal to the
/// upper edge land in the last bin. A constant input is binned over a
/// unit-wide range centered on the value.
pub fn histogram(values: &[f64], n_bins: usize, density: bool) -> Result<Histogram> {
    if values.is_empty() || n_bins == 0 {
        return Err(Error::EmptySelection {
            context: "histogram",
        });
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / n_bins as f64;

    let mut heights = Array1::<f64>::zeros(n_bins);
    for &v in values {
        let bin = (((v - lo) / width) as usize).min(n_bins - 1);
        heights[bin] += 1.;
    }
    if density {
        let total = values.len() as f64 * width;
        heights.mapv_inplace(|h| h / total);
    }

    let bin_edges: Array1<f64> = (0..=n_bins).map(|i| lo + i as f64 * width).collect();
    let centers: Array1<f64> = (0..n_bins)
        .map(|i| (bin_edges[i] + bin_edges[i + 1]) / 2.)
        .collect();
    Ok(Histogram {
        heights,
        bin_edges,
        centers,
        width,
    })
}
