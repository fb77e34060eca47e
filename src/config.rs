//! Parameter records for the analysis operations.
//!
//! The records here are what front ends hand to the recording surface.
//! [`IdealizationConfig`] mirrors the idealization tab of the GUI and
//! converts its display-unit values into the SI-valued
//! [`IdealizationParams`] the core consumes.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::baseline::BaselineMethod;
use crate::selection::Selection;
use crate::units::{CurrentUnit, TimeUnit};

/// Parameters for a baseline-correction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineParams {
    pub method: BaselineMethod,
    /// Degree of the polynomial fit (ignored by the offset method).
    pub degree: usize,
    pub selection: Selection,
}

impl Default for BaselineParams {
    /// Linear fit on the samples where the piezo is inactive.
    fn default() -> Self {
        BaselineParams {
            method: BaselineMethod::Polynomial,
            degree: 1,
            selection: Selection::Piezo {
                active: false,
                deviation: 0.05,
            },
        }
    }
}

/// Parameters for a Chung-Kennedy filter stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CkParams {
    /// Window lengths of the filter bank, in samples.
    pub window_lengths: Vec<usize>,
    /// Exponent applied to the inverse prediction errors.
    pub weight_exponent: f64,
    /// Length of the uniform window smoothing the prediction errors.
    pub weight_window: usize,
    /// Optional `(K × N)` forward weights replacing the computed ones.
    pub apriori_f_weights: Option<Array2<f64>>,
    /// Optional `(K × N)` backward weights replacing the computed ones.
    pub apriori_b_weights: Option<Array2<f64>>,
}

impl CkParams {
    pub fn new(window_lengths: Vec<usize>, weight_exponent: f64, weight_window: usize) -> Self {
        CkParams {
            window_lengths,
            weight_exponent,
            weight_window,
            apriori_f_weights: None,
            apriori_b_weights: None,
        }
    }
}

/// SI-valued idealization parameters, as consumed by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealizationParams {
    /// Allowed discrete current levels, amperes.
    pub amplitudes: Vec<f64>,
    /// Thresholds between consecutive amplitudes (descending); absent
    /// means midpoints.
    pub thresholds: Option<Vec<f64>>,
    /// Minimum event duration, seconds.
    pub resolution: Option<f64>,
    /// Upsampling factor applied before thresholding; 1 disables it.
    pub interpolation_factor: usize,
}

impl IdealizationParams {
    pub fn new(amplitudes: Vec<f64>) -> Self {
        IdealizationParams {
            amplitudes,
            thresholds: None,
            resolution: None,
            interpolation_factor: 1,
        }
    }

    /// The thresholds the idealizer will actually use: the supplied ones
    /// when their count matches, otherwise the midpoints between the
    /// descending-sorted amplitudes. Lets strict callers detect a
    /// substitution before idealizing.
    pub fn effective_thresholds(&self) -> Vec<f64> {
        if let Some(thresholds) = &self.thresholds {
            if thresholds.len() + 1 == self.amplitudes.len() {
                return thresholds.clone();
            }
        }
        let mut amplitudes = self.amplitudes.clone();
        amplitudes.sort_by(|a, b| b.partial_cmp(a).unwrap());
        amplitudes
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) / 2.)
            .collect()
    }
}

/// The idealization-tab surface as the GUI presents it, in display
/// units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealizationConfig {
    /// Allowed current levels, in `amplitude_unit`.
    pub amplitudes: Vec<f64>,
    pub amplitude_unit: CurrentUnit,
    /// Thresholds in `amplitude_unit`; ignored when `auto_thresholds`.
    pub thresholds: Option<Vec<f64>>,
    /// Use midpoint thresholds regardless of `thresholds`.
    pub auto_thresholds: bool,
    /// Flip the sign of amplitudes and thresholds (inward currents are
    /// conventionally negative).
    pub negate: bool,
    pub time_unit: TimeUnit,
    /// Minimum event duration, in `time_unit`.
    pub resolution: Option<f64>,
    pub interpolation_factor: Option<u32>,
}

impl IdealizationConfig {
    /// Converts the display-unit surface into SI parameters.
    pub fn to_params(&self) -> IdealizationParams {
        let sign = if self.negate { -1. } else { 1. };
        let amplitudes = self
            .amplitudes
            .iter()
            .map(|&a| self.amplitude_unit.to_si(sign * a))
            .collect();
        let thresholds = if self.auto_thresholds {
            None
        } else {
            self.thresholds.as_ref().map(|thresholds| {
                thresholds
                    .iter()
                    .map(|&t| self.amplitude_unit.to_si(sign * t))
                    .collect()
            })
        };
        IdealizationParams {
            amplitudes,
            thresholds,
            resolution: self.resolution.map(|r| self.time_unit.to_si(r)),
            interpolation_factor: self.interpolation_factor.unwrap_or(1) as usize,
        }
    }
}
