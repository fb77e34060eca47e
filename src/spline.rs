//! Natural cubic spline interpolation.
//!
//! Used to upsample an episode before threshold-crossing idealization so
//! that fast gating transitions land closer to their true crossing time.

use ndarray::Array1;

use crate::error::{Error, Result};

/// A natural cubic spline through a set of knots.
///
/// Natural boundary conditions: the second derivative vanishes at both
/// ends. Knot abscissae must be strictly increasing.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    // Second derivatives at the knots, from the tridiagonal solve.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fits a natural cubic spline through `(x, y)`.
    ///
    /// Fails with `ShapeMismatch` if the inputs differ in length or hold
    /// fewer than two knots.
    pub fn new(x: &Array1<f64>, y: &Array1<f64>) -> Result<Self> {
        let n = x.len();
        if n != y.len() {
            return Err(Error::shape(format!(
                "spline knots differ in length: {} vs {}",
                n,
                y.len()
            )));
        }
        if n < 2 {
            return Err(Error::shape("spline needs at least two knots"));
        }

        let x = x.to_vec();
        let y = y.to_vec();
        let mut m = vec![0.; n];
        if n > 2 {
            // Thomas algorithm on the interior knots; m[0] = m[n-1] = 0.
            let h: Vec<f64> = (0..n - 1).map(|i| x[i + 1] - x[i]).collect();
            let mut diag: Vec<f64> = (1..n - 1).map(|i| 2. * (h[i - 1] + h[i])).collect();
            let mut rhs: Vec<f64> = (1..n - 1)
                .map(|i| 6. * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]))
                .collect();
            for i in 1..diag.len() {
                let w = h[i] / diag[i - 1];
                diag[i] -= w * h[i];
                rhs[i] -= w * rhs[i - 1];
            }
            for i in (0..diag.len()).rev() {
                let upper = if i + 1 < diag.len() { h[i + 1] * m[i + 2] } else { 0. };
                m[i + 1] = (rhs[i] - upper) / diag[i];
            }
        }
        Ok(CubicSpline { x, y, m })
    }

    /// Evaluates the spline at `xq`. Queries outside the knot range use
    /// the nearest boundary segment.
    pub fn eval(&self, xq: f64) -> f64 {
        let n = self.x.len();
        // Index of the segment [x[i], x[i+1]] containing xq.
        let i = match self
            .x
            .binary_search_by(|probe| probe.partial_cmp(&xq).unwrap())
        {
            Ok(i) => i.min(n - 2),
            Err(0) => 0,
            Err(i) => (i - 1).min(n - 2),
        };
        let h = self.x[i + 1] - self.x[i];
        let t = xq - self.x[i];
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        let slope = (self.y[i + 1] - self.y[i]) / h - h / 6. * (2. * m0 + m1);
        self.y[i] + t * slope + t * t * m0 / 2. + t * t * t * (m1 - m0) / (6. * h)
    }
}

/// Resamples `signal` onto a time grid with `interpolation_factor`
/// times the original density.
///
/// The new grid starts at `time[0]` with spacing `Δ/factor` and stops
/// short of `time[N-1]` (end-exclusive), giving `(N-1)·factor` samples.
/// Returns the interpolated signal and the new time vector.
pub fn interpolate(
    signal: &Array1<f64>,
    time: &Array1<f64>,
    interpolation_factor: usize,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let spline = CubicSpline::new(time, signal)?;
    let step = (time[1] - time[0]) / interpolation_factor as f64;
    let n_new = (time.len() - 1) * interpolation_factor;
    let interpolation_time: Array1<f64> =
        (0..n_new).map(|k| time[0] + k as f64 * step).collect();
    let interpolated = interpolation_time.mapv(|t| spline.eval(t));
    Ok((interpolated, interpolation_time))
}
