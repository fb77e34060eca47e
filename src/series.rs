//! An ordered collection of episodes at one point of the processing
//! lineage.
//!
//! Stage operations (`baseline_correct_all`, `gauss_filter_all`,
//! `ck_filter_all`) are pure with respect to the series they are called
//! on: they deep-copy every episode, transform the copies and return
//! them as a new series, leaving the source untouched. Idealization and
//! first-activation detection, by contrast, mutate the episodes of the
//! series they run on.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{BaselineParams, CkParams, IdealizationParams};
use crate::episode::Episode;
use crate::error::{Error, Result};

/// Ordered list of structurally identical episodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Series {
    episodes: Vec<Episode>,
}

impl Series {
    /// Builds a series, validating that all episodes share the sample
    /// count and channel set of the first one.
    pub fn new(episodes: Vec<Episode>) -> Result<Self> {
        if let Some(first) = episodes.first() {
            for episode in &episodes[1..] {
                let same_shape = episode.time().len() == first.time().len()
                    && episode.piezo().is_some() == first.piezo().is_some()
                    && episode.command().is_some() == first.command().is_some();
                if !same_shape {
                    return Err(Error::shape(format!(
                        "episode {} differs in shape or channel set from episode {}",
                        episode.n_episode(),
                        first.n_episode()
                    )));
                }
            }
        }
        Ok(Series { episodes })
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn get(&self, n_episode: usize) -> Option<&Episode> {
        self.episodes.get(n_episode)
    }

    pub fn get_mut(&mut self, n_episode: usize) -> Option<&mut Episode> {
        self.episodes.get_mut(n_episode)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Episode> {
        self.episodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Episode> {
        self.episodes.iter_mut()
    }

    /// Whether the episodes carry a piezo channel.
    pub fn has_piezo(&self) -> bool {
        self.episodes.first().map_or(false, |e| e.piezo().is_some())
    }

    /// Whether the episodes carry a command-voltage channel.
    pub fn has_command(&self) -> bool {
        self.episodes
            .first()
            .map_or(false, |e| e.command().is_some())
    }

    /// Returns a new series in which every episode has been baseline
    /// corrected.
    pub fn baseline_correct_all(&self, params: &BaselineParams) -> Result<Series> {
        let mut output = self.clone();
        for episode in output.iter_mut() {
            episode.baseline_correct(params)?;
        }
        Ok(output)
    }

    /// Returns a new series in which every episode has been Gaussian
    /// filtered at `filter_freq` Hz.
    pub fn gauss_filter_all(&self, filter_freq: f64) -> Series {
        let mut output = self.clone();
        for episode in output.iter_mut() {
            episode.gauss_filter(filter_freq);
        }
        output
    }

    /// Returns a new series in which every episode has been run through
    /// the Chung-Kennedy filter bank.
    pub fn ck_filter_all(&self, params: &CkParams) -> Result<Series> {
        let mut output = self.clone();
        for episode in output.iter_mut() {
            episode.ck_filter(params)?;
        }
        Ok(output)
    }

    /// Idealizes every episode in place.
    pub fn idealize_all(&mut self, params: &IdealizationParams, rng: &mut impl Rng) -> Result<()> {
        for episode in self.iter_mut() {
            episode.idealize(params, rng)?;
        }
        Ok(())
    }

    /// Indices of episodes whose trace standard deviation exceeds
    /// `threshold` (amperes); a quality screen for suspect sweeps.
    pub fn check_std_all(&self, threshold: f64) -> Vec<usize> {
        self.episodes
            .iter()
            .filter(|e| e.trace_std() > threshold)
            .map(|e| e.n_episode())
            .collect()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Episode;
    type IntoIter = std::slice::Iter<'a, Episode>;

    fn into_iter(self) -> Self::IntoIter {
        self.episodes.iter()
    }
}
