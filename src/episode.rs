//! A single sweep of a patch-clamp recording.
//!
//! An `Episode` owns the time vector and the current trace of one
//! stimulus presentation, the optional piezo and command-voltage
//! channels recorded alongside it, and the per-episode analysis
//! artifacts (idealization, first-activation time). All values are in
//! SI units.
//!
//! The identity fields (`n_episode`, `time`, `sampling_rate`) never
//! change after construction; the analysis operations replace the trace
//! or fill in artifacts. Episodes are deep-copied (`Clone`) when a stage
//! produces a new series, so no buffer is ever shared across lineage
//! keys.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::baseline::baseline_correction;
use crate::config::{BaselineParams, CkParams, IdealizationParams};
use crate::error::{Error, Result};
use crate::filters::{chung_kennedy_filter, gaussian_filter};
use crate::idealization::{detect_first_activation, Event, Idealizer};

/// One sweep: time, current and companion channels, plus analysis
/// artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    n_episode: usize,
    sampling_rate: f64,
    time: Array1<f64>,
    trace: Array1<f64>,
    piezo: Option<Array1<f64>>,
    command: Option<Array1<f64>>,
    idealization: Option<Array1<f64>>,
    idealization_time: Option<Array1<f64>>,
    first_activation: Option<f64>,
}

impl Episode {
    /// Constructs an episode, validating that every supplied channel has
    /// the same length as the time vector.
    pub fn new(
        n_episode: usize,
        time: Array1<f64>,
        trace: Array1<f64>,
        piezo: Option<Array1<f64>>,
        command: Option<Array1<f64>>,
        sampling_rate: f64,
    ) -> Result<Self> {
        if trace.len() != time.len() {
            return Err(Error::shape(format!(
                "episode {}: trace length {} != time length {}",
                n_episode,
                trace.len(),
                time.len()
            )));
        }
        for (name, channel) in [("piezo", &piezo), ("command", &command)] {
            if let Some(channel) = channel {
                if channel.len() != time.len() {
                    return Err(Error::shape(format!(
                        "episode {}: {} length {} != time length {}",
                        n_episode,
                        name,
                        channel.len(),
                        time.len()
                    )));
                }
            }
        }
        Ok(Episode {
            n_episode,
            sampling_rate,
            time,
            trace,
            piezo,
            command,
            idealization: None,
            idealization_time: None,
            first_activation: None,
        })
    }

    pub fn n_episode(&self) -> usize {
        self.n_episode
    }
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }
    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }
    pub fn trace(&self) -> &Array1<f64> {
        &self.trace
    }
    pub fn piezo(&self) -> Option<&Array1<f64>> {
        self.piezo.as_ref()
    }
    pub fn command(&self) -> Option<&Array1<f64>> {
        self.command.as_ref()
    }
    /// The idealized trace, if this episode has been idealized.
    pub fn idealization(&self) -> Option<&Array1<f64>> {
        self.idealization.as_ref()
    }
    /// Time vector aligned with the idealization (denser than `time`
    /// when interpolation was applied).
    pub fn idealization_time(&self) -> Option<&Array1<f64>> {
        self.idealization_time.as_ref()
    }
    pub fn first_activation(&self) -> Option<f64> {
        self.first_activation
    }

    /// Subtracts the fitted baseline from the trace (see
    /// [`baseline_correction`]).
    pub fn baseline_correct(&mut self, params: &BaselineParams) -> Result<()> {
        self.trace = baseline_correction(
            &self.time,
            &self.trace,
            self.sampling_rate,
            self.piezo.as_ref(),
            params.method,
            params.degree,
            &params.selection,
        )?;
        Ok(())
    }

    /// Replaces the trace with its Gaussian-filtered version.
    pub fn gauss_filter(&mut self, filter_freq: f64) {
        self.trace = gaussian_filter(&self.trace, self.sampling_rate, filter_freq);
    }

    /// Replaces the trace with its Chung-Kennedy-filtered version.
    pub fn ck_filter(&mut self, params: &CkParams) -> Result<()> {
        self.trace = chung_kennedy_filter(
            &self.trace,
            &params.window_lengths,
            params.weight_exponent,
            params.weight_window,
            params.apriori_f_weights.as_ref(),
            params.apriori_b_weights.as_ref(),
        )?;
        Ok(())
    }

    /// Idealizes the trace, storing the idealization and its time grid
    /// on the episode. A previous idealization is replaced.
    pub fn idealize(&mut self, params: &IdealizationParams, rng: &mut impl Rng) -> Result<()> {
        let (idealization, idealization_time) = Idealizer::idealize_episode(
            &self.trace,
            &self.time,
            &params.amplitudes,
            params.thresholds.as_deref(),
            params.resolution,
            params.interpolation_factor,
            rng,
        )?;
        self.idealization = Some(idealization);
        self.idealization_time = Some(idealization_time);
        Ok(())
    }

    /// Stores the time at which the trace first crosses below
    /// `threshold` (amperes).
    pub fn detect_first_activation(&mut self, threshold: f64) {
        self.first_activation = Some(detect_first_activation(&self.time, &self.trace, threshold));
    }

    /// The events of this episode's idealization, in time order.
    ///
    /// Fails with `NotIdealized` if [`Episode::idealize`] has not run.
    pub fn events(&self) -> Result<Vec<Event>> {
        match (&self.idealization, &self.idealization_time) {
            (Some(idealization), Some(time)) => Ok(Idealizer::extract_events(idealization, time)),
            _ => Err(Error::NotIdealized {
                n_episode: self.n_episode,
            }),
        }
    }

    /// Standard deviation of the trace (population form).
    pub fn trace_std(&self) -> f64 {
        self.trace.std(0.)
    }
}
