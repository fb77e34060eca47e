//! The loader boundary.
//!
//! File parsing lives outside the core: a loader is any function from a
//! file path to a [`RawRecording`]. The core dispatches on the file
//! extension, interprets the values in the caller-supplied input units
//! and converts them to SI on ingest (see
//! [`Recording::from_raw`](crate::recording::Recording::from_raw)).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::units::{CurrentUnit, TimeUnit, VoltageUnit};

/// Loader output: the raw columns of a recording file, still in the
/// file's units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecording {
    /// Column names as found in the file.
    pub column_names: Vec<String>,
    /// The shared time vector.
    pub time: Vec<f64>,
    /// One current trace per episode.
    pub currents: Vec<Vec<f64>>,
    /// One piezo-voltage trace per episode, if recorded.
    pub piezos: Option<Vec<Vec<f64>>>,
    /// One command-voltage trace per episode, if recorded.
    pub commands: Option<Vec<Vec<f64>>>,
}

/// The file formats loaders exist for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filetype {
    /// MATLAB `.mat` export.
    Matlab,
    /// Axograph `.axgd` file.
    Axograph,
    /// The serialized native form of a whole recording (`.pkl`),
    /// including user lists and the lineage map.
    Native,
}

impl Filetype {
    /// Dispatches on the extension of `path`.
    ///
    /// # Example
    ///
    /// ```
    /// use patchclamp_backend::raw::Filetype;
    ///
    /// assert_eq!(Filetype::from_path("data/180426 000 Copy Export.mat").unwrap(),
    ///            Filetype::Matlab);
    /// assert!(Filetype::from_path("notes.txt").is_err());
    /// ```
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = path.rsplit('.').next().unwrap_or("");
        match extension {
            "mat" => Ok(Filetype::Matlab),
            "axgd" => Ok(Filetype::Axograph),
            "pkl" => Ok(Filetype::Native),
            _ => Err(Error::UnsupportedFiletype {
                path: path.to_string(),
            }),
        }
    }
}

/// The units the loaded values are given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputUnits {
    pub time: TimeUnit,
    pub trace: CurrentUnit,
    pub piezo: VoltageUnit,
    pub command: VoltageUnit,
}

impl Default for InputUnits {
    /// SI in, SI stored: no conversion.
    fn default() -> Self {
        InputUnits {
            time: TimeUnit::Second,
            trace: CurrentUnit::Ampere,
            piezo: VoltageUnit::Volt,
            command: VoltageUnit::Volt,
        }
    }
}
