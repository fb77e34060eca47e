//! Threshold-crossing idealization and event extraction.
//!
//! An idealization is a piecewise-constant approximation of a noisy
//! current trace taking values only from a user-supplied set of
//! amplitudes (the conductance levels of the channel). Events are the
//! maximal constant runs of an idealization; enforcing a minimum event
//! duration ("resolution") merges runs the recording bandwidth could
//! not actually have resolved.

use log::warn;
use ndarray::Array1;
use rand::Rng;

use crate::error::Result;
use crate::spline::interpolate;

/// One maximal run of constant amplitude in an idealization.
///
/// Start and end times are inclusive bounds, so the duration is
/// `t_end - t_start + Δ` for sampling interval `Δ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub amplitude: f64,
    pub duration: f64,
    pub t_start: f64,
    pub t_end: f64,
}

/// An [`Event`] tagged with the episode it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRow {
    pub amplitude: f64,
    pub duration: f64,
    pub t_start: f64,
    pub t_end: f64,
    pub n_episode: usize,
}

impl EventRow {
    pub fn new(event: Event, n_episode: usize) -> Self {
        EventRow {
            amplitude: event.amplitude,
            duration: event.duration,
            t_start: event.t_start,
            t_end: event.t_end,
            n_episode,
        }
    }
}

/// Container for the idealization routines.
pub struct Idealizer;

impl Idealizer {
    /// Idealizes a single episode's signal.
    ///
    /// Composition of the stages in order: optional spline upsampling by
    /// `interpolation_factor`, threshold crossing, optional resolution
    /// enforcement. Returns the idealization together with the time
    /// vector it is aligned with (the upsampled grid when interpolation
    /// is applied, the input grid otherwise).
    pub fn idealize_episode(
        signal: &Array1<f64>,
        time: &Array1<f64>,
        amplitudes: &[f64],
        thresholds: Option<&[f64]>,
        resolution: Option<f64>,
        interpolation_factor: usize,
        rng: &mut impl Rng,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        let (signal, time) = if interpolation_factor > 1 {
            interpolate(signal, time, interpolation_factor)?
        } else {
            (signal.clone(), time.clone())
        };

        let mut idealization = Self::threshold_crossing(&signal, amplitudes, thresholds);

        if let Some(resolution) = resolution {
            Self::apply_resolution(&mut idealization, &time, resolution, rng);
        }
        Ok((idealization, time))
    }

    /// Quantizes `signal` onto the given amplitudes by threshold
    /// crossing.
    ///
    /// Amplitudes are sorted in descending order. When `thresholds` is
    /// absent or does not hold exactly one threshold per amplitude pair,
    /// the midpoints between consecutive amplitudes are used instead
    /// (with a warning in the wrong-length case). Supplied thresholds
    /// are used as-is and are assumed to descend along with the
    /// amplitudes.
    ///
    /// # Example
    ///
    /// ```
    /// use ndarray::array;
    /// use patchclamp_backend::idealization::Idealizer;
    ///
    /// let signal = array![0.1, 0.9, 1.1, 0.4, 0.0];
    /// let idealization = Idealizer::threshold_crossing(&signal, &[1.0, 0.0], None);
    /// assert_eq!(idealization.to_vec(), vec![0., 1., 1., 0., 0.]);
    /// ```
    pub fn threshold_crossing(
        signal: &Array1<f64>,
        amplitudes: &[f64],
        thresholds: Option<&[f64]>,
    ) -> Array1<f64> {
        let mut amplitudes = amplitudes.to_vec();
        amplitudes.sort_by(|a, b| b.partial_cmp(a).unwrap());

        if amplitudes.is_empty() {
            return Array1::zeros(signal.len());
        }
        if amplitudes.len() == 1 {
            return Array1::from_elem(signal.len(), amplitudes[0]);
        }

        let midpoints = || -> Vec<f64> {
            amplitudes
                .windows(2)
                .map(|pair| (pair[0] + pair[1]) / 2.)
                .collect()
        };
        let thresholds: Vec<f64> = match thresholds {
            Some(supplied) if supplied.len() == amplitudes.len() - 1 => supplied.to_vec(),
            Some(supplied) => {
                warn!(
                    "too many or too few thresholds given, there should be {} but there are {}; \
                     substituting midpoints",
                    amplitudes.len() - 1,
                    supplied.len()
                );
                midpoints()
            }
            None => midpoints(),
        };

        let mut idealization = Array1::<f64>::zeros(signal.len());
        for (i, &x) in signal.iter().enumerate() {
            if x > thresholds[0] {
                idealization[i] = amplitudes[0];
            }
        }
        // Descending order matters: later assignments overwrite earlier
        // ones, so each sample ends at the lowest amplitude whose
        // threshold it undercuts.
        for (&threshold, &amplitude) in thresholds.iter().zip(amplitudes[1..].iter()) {
            for (i, &x) in signal.iter().enumerate() {
                if x < threshold {
                    idealization[i] = amplitude;
                }
            }
        }
        idealization
    }

    /// Merges events shorter than `resolution` (seconds) into a
    /// neighbour until none remain.
    ///
    /// The first event always merges forward and the last always
    /// backward; an interior short event merges forward or backward on a
    /// fair coin flip drawn from `rng`. Returns `true` (and warns) if
    /// some event is still too short afterwards, which can happen when a
    /// level is flanked by two short neighbours.
    pub fn apply_resolution(
        idealization: &mut Array1<f64>,
        time: &Array1<f64>,
        resolution: f64,
        rng: &mut impl Rng,
    ) -> bool {
        let delta = sampling_interval(time);
        // (amplitude, first sample index, last sample index)
        let mut events = index_events(idealization);

        let mut i = 0;
        while i < events.len() {
            let (_, start, end) = events[i];
            if time[end] - time[start] + delta >= resolution {
                i += 1;
                continue;
            }
            if events.len() == 1 {
                break;
            }
            let merge_forward = i != events.len() - 1 && (i == 0 || rng.gen_bool(0.5));
            if merge_forward {
                let (next_amp, _, next_end) = events[i + 1];
                for x in idealization.slice_mut(ndarray::s![start..=next_end]).iter_mut() {
                    *x = next_amp;
                }
                events[i] = (next_amp, start, next_end);
                events.remove(i + 1);
            } else {
                let (prev_amp, prev_start, _) = events[i - 1];
                for x in idealization.slice_mut(ndarray::s![prev_start..=end]).iter_mut() {
                    *x = prev_amp;
                }
                events[i - 1] = (prev_amp, prev_start, end);
                events.remove(i);
            }
            // The merged event is re-checked on the next pass of the loop.
        }

        let residual = index_events(idealization)
            .iter()
            .any(|&(_, start, end)| time[end] - time[start] + delta < resolution);
        if residual {
            warn!("resolution pass failed to converge, some events are still too short");
        }
        residual
    }

    /// Summarizes an idealized trace as its list of events, in time
    /// order.
    ///
    /// The first event starts at `time[0]` and the last ends at
    /// `time[N-1]`; durations use the inclusive-bound convention, so
    /// they sum to the trace length plus one sampling interval.
    pub fn extract_events(idealization: &Array1<f64>, time: &Array1<f64>) -> Vec<Event> {
        let delta = sampling_interval(time);
        index_events(idealization)
            .into_iter()
            .map(|(amplitude, start, end)| Event {
                amplitude,
                duration: time[end] - time[start] + delta,
                t_start: time[start],
                t_end: time[end],
            })
            .collect()
    }
}

/// The time of the first sample at which `signal` falls below
/// `threshold`, or `time[0]` if it never does.
pub fn detect_first_activation(time: &Array1<f64>, signal: &Array1<f64>, threshold: f64) -> f64 {
    let index = signal
        .iter()
        .position(|&x| x < threshold)
        .unwrap_or(0);
    time[index]
}

fn sampling_interval(time: &Array1<f64>) -> f64 {
    if time.len() > 1 {
        time[1] - time[0]
    } else {
        0.
    }
}

// Maximal constant runs as (amplitude, first index, last index).
fn index_events(idealization: &Array1<f64>) -> Vec<(f64, usize, usize)> {
    let mut events = Vec::new();
    if idealization.is_empty() {
        return events;
    }
    let mut start = 0;
    for i in 1..idealization.len() {
        if idealization[i] != idealization[i - 1] {
            events.push((idealization[start], start, i - 1));
            start = i;
        }
    }
    events.push((idealization[start], start, idealization.len() - 1));
    events
}
