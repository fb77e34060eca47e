//! Implements the main trait [`BaseRecording`] for the [`Recording`]
//! struct, the highest level of abstraction of the analysis backend. A
//! recording owns every series produced from one data file, keyed by
//! lineage datakey, and is the surface through which front ends drive
//! the analysis.
//!
//! ## Stage behavior
//! A stage operation ([`baseline_correction`], [`gauss_filter_series`],
//! [`ck_filter_series`]) reads the current series, deep-copies it,
//! transforms the copy, files it under the derived datakey and makes
//! that the current series. The source series is never touched; re-
//! running a stage with the same parameters replaces the series under
//! the same datakey.
//!
//! ## In-place behavior
//! Idealization and first-activation detection write their artifacts
//! onto the episodes of the current series.
//!
//! [`baseline_correction`]: BaseRecording::baseline_correction
//! [`gauss_filter_series`]: BaseRecording::gauss_filter_series
//! [`ck_filter_series`]: BaseRecording::ck_filter_series

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{BaselineParams, CkParams, IdealizationParams};
use crate::episode::Episode;
use crate::error::{Error, Result};
use crate::histogram::{histogram, Histogram};
use crate::idealization::EventRow;
use crate::lineage;
use crate::raw::{InputUnits, RawRecording};
use crate::selection::{interval_selection, piezo_selection, Selection};
use crate::series::Series;

/// A named set of episode indices, with the display attributes the GUI
/// hangs off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeList {
    pub indices: BTreeSet<usize>,
    pub color: String,
    pub key: Option<char>,
}

/// Name of the predefined list holding every episode.
pub const ALL_LIST: &str = "all";

/// This trait defines the behavior of the [`Recording`] struct through
/// default trait implementations.
///
/// Trait methods fall into the following categories:
/// 1. Recording-targeted methods which alter or query the whole
///    recording:
///     - [`select_series`], [`select_episode`], [`insert_series`]
///     - [`baseline_correction`], [`gauss_filter_series`],
///       [`ck_filter_series`]
///     - [`idealize_series`], [`idealize_episode`],
///       [`detect_first_activation`]
///     - [`get_events`], [`series_hist`], [`episode_hist`]
/// 2. Episode-list methods which manage the user-list registry:
///     - [`new_list`], [`remove_list`], [`add_to_list`],
///       [`remove_from_list`], [`selected_indices`],
///       [`selected_episodes`]
/// 3. Internal helper methods:
///     - [`series`], [`series_`], [`episode`], [`assert_has_datakey`]
///
/// [`select_series`]: BaseRecording::select_series
/// [`select_episode`]: BaseRecording::select_episode
/// [`insert_series`]: BaseRecording::insert_series
/// [`baseline_correction`]: BaseRecording::baseline_correction
/// [`gauss_filter_series`]: BaseRecording::gauss_filter_series
/// [`ck_filter_series`]: BaseRecording::ck_filter_series
/// [`idealize_series`]: BaseRecording::idealize_series
/// [`idealize_episode`]: BaseRecording::idealize_episode
/// [`detect_first_activation`]: BaseRecording::detect_first_activation
/// [`get_events`]: BaseRecording::get_events
/// [`series_hist`]: BaseRecording::series_hist
/// [`episode_hist`]: BaseRecording::episode_hist
/// [`new_list`]: BaseRecording::new_list
/// [`remove_list`]: BaseRecording::remove_list
/// [`add_to_list`]: BaseRecording::add_to_list
/// [`remove_from_list`]: BaseRecording::remove_from_list
/// [`selected_indices`]: BaseRecording::selected_indices
/// [`selected_episodes`]: BaseRecording::selected_episodes
/// [`series`]: BaseRecording::series
/// [`series_`]: BaseRecording::series_
/// [`episode`]: BaseRecording::episode
/// [`assert_has_datakey`]: BaseRecording::assert_has_datakey
pub trait BaseRecording {
    // FIELD methods
    fn series_map(&self) -> &IndexMap<String, Series>;
    fn series_map_(&mut self) -> &mut IndexMap<String, Series>;
    fn sampling_rate(&self) -> f64;
    fn current_datakey(&self) -> &str;
    fn current_datakey_(&mut self) -> &mut String;
    fn n_episode(&self) -> usize;
    fn n_episode_(&mut self) -> &mut usize;
    fn lists(&self) -> &IndexMap<String, EpisodeList>;
    fn lists_(&mut self) -> &mut IndexMap<String, EpisodeList>;

    /// Asserts that the given datakey is registered.
    ///
    /// # Panics
    ///
    /// Panics if the datakey is unknown; internal callers only invoke it
    /// for keys whose presence is an invariant.
    fn assert_has_datakey(&self, datakey: &str) {
        assert!(
            self.series_map().contains_key(datakey),
            "Datakey {} not found. Registered datakeys are {:?}",
            datakey,
            self.series_map().keys().collect::<Vec<_>>()
        );
    }

    /// The current series.
    fn series(&self) -> &Series {
        self.assert_has_datakey(self.current_datakey());
        self.series_map().get(self.current_datakey()).unwrap()
    }

    /// Mutable access to the current series.
    fn series_(&mut self) -> &mut Series {
        self.assert_has_datakey(self.current_datakey());
        let datakey = self.current_datakey().to_string();
        self.series_map_().get_mut(&datakey).unwrap()
    }

    /// The current episode of the current series.
    fn episode(&self) -> &Episode {
        self.series()
            .get(self.n_episode())
            .expect("current episode index is always in range")
    }

    fn has_piezo(&self) -> bool {
        self.series().has_piezo()
    }

    fn has_command(&self) -> bool {
        self.series().has_command()
    }

    /// Registered datakeys, in insertion order.
    fn datakeys(&self) -> Vec<&str> {
        self.series_map().keys().map(|k| k.as_str()).collect()
    }

    /// Makes the series under `datakey` current. No series is altered.
    fn select_series(&mut self, datakey: &str) -> Result<()> {
        if !self.series_map().contains_key(datakey) {
            return Err(Error::UnknownDatakey {
                datakey: datakey.to_string(),
                known: self.series_map().keys().cloned().collect(),
            });
        }
        debug!("selecting series '{}'", datakey);
        *self.current_datakey_() = datakey.to_string();
        let len = self.series().len();
        if self.n_episode() >= len && len > 0 {
            *self.n_episode_() = 0;
        }
        Ok(())
    }

    /// Makes episode `n_episode` of the current series current.
    fn select_episode(&mut self, n_episode: usize) -> Result<()> {
        let len = self.series().len();
        if n_episode >= len {
            return Err(Error::EpisodeOutOfRange { n_episode, len });
        }
        *self.n_episode_() = n_episode;
        Ok(())
    }

    /// Files a series under an externally supplied datakey, validating
    /// the key against the lineage grammar. Used when reconstructing a
    /// recording from its serialized form.
    fn insert_series(&mut self, datakey: &str, series: Series) -> Result<()> {
        if !lineage::is_valid_datakey(datakey) {
            return Err(Error::InvalidDatakey {
                datakey: datakey.to_string(),
            });
        }
        self.series_map_().insert(datakey.to_string(), series);
        Ok(())
    }

    /// Applies baseline correction to every episode of the current
    /// series, files the result under the `BC_`-tagged datakey and makes
    /// it current.
    fn baseline_correction(&mut self, params: &BaselineParams) -> Result<()> {
        debug!(
            "baseline_correction on series '{}' with {:?}",
            self.current_datakey(),
            params
        );
        let new_datakey = lineage::derive_datakey(self.current_datakey(), lineage::BASELINE_TAG);
        info!("new datakey is {}", new_datakey);
        let corrected = self.series().baseline_correct_all(params)?;
        self.series_map_().insert(new_datakey.clone(), corrected);
        *self.current_datakey_() = new_datakey;
        Ok(())
    }

    /// Gaussian-filters the current series at `filter_freq` Hz into a
    /// new current series (tag `GFILTER{f}_`).
    fn gauss_filter_series(&mut self, filter_freq: f64) -> Result<()> {
        debug!(
            "gauss filtering series '{}' with frequency {}",
            self.current_datakey(),
            filter_freq
        );
        let new_datakey =
            lineage::derive_datakey(self.current_datakey(), &lineage::gaussian_tag(filter_freq));
        info!("new datakey is {}", new_datakey);
        let filtered = self.series().gauss_filter_all(filter_freq);
        self.series_map_().insert(new_datakey.clone(), filtered);
        *self.current_datakey_() = new_datakey;
        Ok(())
    }

    /// Chung-Kennedy-filters the current series into a new current
    /// series (tag `CKFILTER_K{K}p{p}M{M}_`).
    fn ck_filter_series(&mut self, params: &CkParams) -> Result<()> {
        debug!(
            "Chung-Kennedy filtering on series '{}' with window_lengths {:?}, \
             weight_exponent {}, weight_window {}",
            self.current_datakey(),
            params.window_lengths,
            params.weight_exponent,
            params.weight_window
        );
        let tag = lineage::ck_tag(
            params.window_lengths.len(),
            params.weight_exponent,
            params.weight_window,
        );
        let new_datakey = lineage::derive_datakey(self.current_datakey(), &tag);
        info!("new datakey is {}", new_datakey);
        let filtered = self.series().ck_filter_all(params)?;
        self.series_map_().insert(new_datakey.clone(), filtered);
        *self.current_datakey_() = new_datakey;
        Ok(())
    }

    /// Idealizes every episode of the current series in place.
    fn idealize_series(&mut self, params: &IdealizationParams, rng: &mut impl Rng) -> Result<()> {
        debug!(
            "idealizing series '{}' with amplitudes {:?}, thresholds {:?}, \
             resolution {:?}, interpolation_factor {}",
            self.current_datakey(),
            params.amplitudes,
            params.thresholds,
            params.resolution,
            params.interpolation_factor
        );
        self.series_().idealize_all(params, rng)
    }

    /// Idealizes only the current episode, in place.
    fn idealize_episode(&mut self, params: &IdealizationParams, rng: &mut impl Rng) -> Result<()> {
        debug!(
            "idealizing episode {} of series '{}'",
            self.n_episode(),
            self.current_datakey()
        );
        let n_episode = self.n_episode();
        self.series_()
            .get_mut(n_episode)
            .expect("current episode index is always in range")
            .idealize(params, rng)
    }

    /// Detects the first activation on every episode of the current
    /// series whose index is not in `exclude`.
    fn detect_first_activation(&mut self, threshold: f64, exclude: &[usize]) {
        debug!(
            "detecting first activation below {} on series '{}' excluding {:?}",
            threshold,
            self.current_datakey(),
            exclude
        );
        for episode in self.series_().iter_mut() {
            if !exclude.contains(&episode.n_episode()) {
                episode.detect_first_activation(threshold);
            }
        }
    }

    /// Concatenates the event tables of every episode in the current
    /// series, each row tagged with its episode index.
    ///
    /// Fails with `NotIdealized` if any episode lacks an idealization.
    fn get_events(&self) -> Result<Vec<EventRow>> {
        let mut rows = Vec::new();
        for episode in self.series() {
            let events = episode.events()?;
            rows.extend(
                events
                    .into_iter()
                    .map(|event| EventRow::new(event, episode.n_episode())),
            );
        }
        Ok(rows)
    }

    /// Histogram of the current samples of every episode in the current
    /// series, restricted by `selection`.
    ///
    /// Piezo selection silently degrades to no selection when the series
    /// carries no piezo channel.
    fn series_hist(
        &self,
        n_bins: usize,
        density: bool,
        selection: &Selection,
    ) -> Result<Histogram> {
        debug!("series_hist on '{}'", self.current_datakey());
        let selection = self.effective_selection(selection);
        let mut values = Vec::new();
        for episode in self.series() {
            values.extend(selected_trace_points(episode, &selection)?);
        }
        histogram(&values, n_bins, density)
    }

    /// Histogram of the current episode's samples, restricted by
    /// `selection`.
    fn episode_hist(
        &self,
        n_bins: usize,
        density: bool,
        selection: &Selection,
    ) -> Result<Histogram> {
        debug!(
            "episode_hist on episode {} of '{}'",
            self.n_episode(),
            self.current_datakey()
        );
        let selection = self.effective_selection(selection);
        let values = selected_trace_points(self.episode(), &selection)?;
        histogram(&values, n_bins, density)
    }

    // Failsafe: piezo selection without piezo data degrades to no
    // selection, matching the established front-end behavior.
    fn effective_selection(&self, selection: &Selection) -> Selection {
        if matches!(selection, Selection::Piezo { .. }) && !self.has_piezo() {
            debug!("piezo selection requested but there is no piezo data");
            return Selection::None;
        }
        selection.clone()
    }

    /// Registers an episode list under `name`, replacing any previous
    /// list with that name.
    fn new_list(&mut self, name: &str, indices: BTreeSet<usize>, color: &str, key: Option<char>) {
        debug!("creating episode list '{}' with {} indices", name, indices.len());
        self.lists_().insert(
            name.to_string(),
            EpisodeList {
                indices,
                color: color.to_string(),
                key,
            },
        );
    }

    /// Removes an episode list. The predefined `"all"` list is
    /// protected.
    fn remove_list(&mut self, name: &str) -> Result<()> {
        if name == ALL_LIST {
            return Err(Error::ProtectedList {
                name: name.to_string(),
            });
        }
        match self.lists_().shift_remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::UnknownList {
                name: name.to_string(),
                known: self.lists().keys().cloned().collect(),
            }),
        }
    }

    /// Adds an episode index to a list.
    fn add_to_list(&mut self, name: &str, n_episode: usize) -> Result<()> {
        let known: Vec<String> = self.lists().keys().cloned().collect();
        match self.lists_().get_mut(name) {
            Some(list) => {
                list.indices.insert(n_episode);
                Ok(())
            }
            None => Err(Error::UnknownList {
                name: name.to_string(),
                known,
            }),
        }
    }

    /// Removes an episode index from a list.
    fn remove_from_list(&mut self, name: &str, n_episode: usize) -> Result<()> {
        let known: Vec<String> = self.lists().keys().cloned().collect();
        match self.lists_().get_mut(name) {
            Some(list) => {
                list.indices.remove(&n_episode);
                Ok(())
            }
            None => Err(Error::UnknownList {
                name: name.to_string(),
                known,
            }),
        }
    }

    /// Union of the indices of the named lists, duplicates removed,
    /// ascending, restricted to the bounds of the current series.
    fn selected_indices(&self, list_names: &[&str]) -> Result<Vec<usize>> {
        let mut indices = BTreeSet::new();
        for &name in list_names {
            let list = self.lists().get(name).ok_or_else(|| Error::UnknownList {
                name: name.to_string(),
                known: self.lists().keys().cloned().collect(),
            })?;
            indices.extend(list.indices.iter().copied());
        }
        let len = self.series().len();
        Ok(indices.into_iter().filter(|&i| i < len).collect())
    }

    /// The episodes of the current series selected by the named lists.
    fn selected_episodes(&self, list_names: &[&str]) -> Result<Vec<&Episode>> {
        let indices = self.selected_indices(list_names)?;
        let series = self.series();
        Ok(indices
            .into_iter()
            .filter_map(|i| series.get(i))
            .collect())
    }
}

// The samples of one episode under a selection, as owned values.
fn selected_trace_points(episode: &Episode, selection: &Selection) -> Result<Vec<f64>> {
    match selection {
        Selection::None => Ok(episode.trace().to_vec()),
        Selection::Intervals(intervals) => {
            let (_, points) = interval_selection(
                episode.time(),
                episode.trace(),
                intervals,
                episode.sampling_rate(),
            );
            Ok(points.to_vec())
        }
        Selection::Piezo { active, deviation } => {
            let piezo = episode
                .piezo()
                .ok_or_else(|| Error::shape("piezo selection without piezo data"))?;
            let (_, _, points) =
                piezo_selection(episode.time(), piezo, episode.trace(), *active, *deviation)?;
            Ok(points.to_vec())
        }
    }
}

/// A concrete struct implementing the [`BaseRecording`] trait: the data
/// of one recording file across all its processing stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    sampling_rate: f64,
    series_map: IndexMap<String, Series>,
    current_datakey: String,
    n_episode: usize,
    lists: IndexMap<String, EpisodeList>,
}

impl BaseRecording for Recording {
    fn series_map(&self) -> &IndexMap<String, Series> {
        &self.series_map
    }
    fn series_map_(&mut self) -> &mut IndexMap<String, Series> {
        &mut self.series_map
    }
    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }
    fn current_datakey(&self) -> &str {
        &self.current_datakey
    }
    fn current_datakey_(&mut self) -> &mut String {
        &mut self.current_datakey
    }
    fn n_episode(&self) -> usize {
        self.n_episode
    }
    fn n_episode_(&mut self) -> &mut usize {
        &mut self.n_episode
    }
    fn lists(&self) -> &IndexMap<String, EpisodeList> {
        &self.lists
    }
    fn lists_(&mut self) -> &mut IndexMap<String, EpisodeList> {
        &mut self.lists
    }
}

impl Recording {
    /// Creates an empty recording holding an empty `raw_` series.
    pub fn new(sampling_rate: f64) -> Self {
        info!("initializing Recording");
        let mut series_map = IndexMap::new();
        series_map.insert(lineage::RAW_DATAKEY.to_string(), Series::default());
        let mut lists = IndexMap::new();
        lists.insert(
            ALL_LIST.to_string(),
            EpisodeList {
                indices: BTreeSet::new(),
                color: "white".to_string(),
                key: None,
            },
        );
        Recording {
            sampling_rate,
            series_map,
            current_datakey: lineage::RAW_DATAKEY.to_string(),
            n_episode: 0,
            lists,
        }
    }

    /// Builds a recording from loader output, converting every channel
    /// to SI units on ingest.
    pub fn from_raw(raw: &RawRecording, sampling_rate: f64, units: &InputUnits) -> Result<Self> {
        debug!(
            "Recording::from_raw with {} episodes, sampling_rate = {}",
            raw.currents.len(),
            sampling_rate
        );
        let n_episodes = raw.currents.len();
        for (name, channels) in [("piezo", &raw.piezos), ("command", &raw.commands)] {
            if let Some(channels) = channels {
                if channels.len() != n_episodes {
                    return Err(Error::shape(format!(
                        "{} {} traces for {} current traces",
                        channels.len(),
                        name,
                        n_episodes
                    )));
                }
            }
        }

        let time: ndarray::Array1<f64> =
            raw.time.iter().map(|&t| units.time.to_si(t)).collect();
        let mut episodes = Vec::with_capacity(n_episodes);
        for i in 0..n_episodes {
            let trace = raw.currents[i].iter().map(|&x| units.trace.to_si(x)).collect();
            let piezo = raw.piezos.as_ref().map(|p| {
                p[i].iter().map(|&x| units.piezo.to_si(x)).collect()
            });
            let command = raw.commands.as_ref().map(|c| {
                c[i].iter().map(|&x| units.command.to_si(x)).collect()
            });
            episodes.push(Episode::new(
                i,
                time.clone(),
                trace,
                piezo,
                command,
                sampling_rate,
            )?);
        }

        let mut recording = Recording::new(sampling_rate);
        recording.lists.get_mut(ALL_LIST).unwrap().indices = (0..n_episodes).collect();
        recording
            .series_map
            .insert(lineage::RAW_DATAKEY.to_string(), Series::new(episodes)?);
        Ok(recording)
    }
}
