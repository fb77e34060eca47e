//! Error types shared across the analysis backend.

use thiserror::Error;

/// Result type for all fallible backend operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the analysis backend.
///
/// Numerical anomalies (e.g. division by zero in the Chung-Kennedy
/// weights) are clipped, not raised; a resolution pass that cannot fully
/// converge is reported through a warning flag, not through this enum.
#[derive(Debug, Error)]
pub enum Error {
    /// The file extension matches no supported loader.
    #[error("cannot load from filetype of '{path}'")]
    UnsupportedFiletype { path: String },

    /// Too few samples left after selection for a polynomial fit.
    #[error("polynomial fit of degree {degree} is underdetermined by {n_samples} samples")]
    InsufficientSamples { degree: usize, n_samples: usize },

    /// A selection matched no samples.
    #[error("selection contains no samples ({context})")]
    EmptySelection { context: &'static str },

    /// Vector lengths or channel sets disagree.
    #[error("shape mismatch: {message}")]
    ShapeMismatch { message: String },

    /// Events were requested from an episode that has not been idealized.
    #[error("episode {n_episode} has no idealization")]
    NotIdealized { n_episode: usize },

    /// A unit label outside the supported closed sets.
    #[error("unknown unit '{unit}'")]
    UnknownUnit { unit: String },

    /// The recording holds no series under the given datakey.
    #[error("no series under datakey '{datakey}', registered datakeys are {known:?}")]
    UnknownDatakey { datakey: String, known: Vec<String> },

    /// A datakey that does not follow the lineage-key grammar.
    #[error("datakey '{datakey}' is not a valid lineage key")]
    InvalidDatakey { datakey: String },

    /// No episode list registered under the given name.
    #[error("no episode list named '{name}', registered lists are {known:?}")]
    UnknownList { name: String, known: Vec<String> },

    /// The predefined "all" list cannot be removed.
    #[error("episode list '{name}' is predefined and cannot be removed")]
    ProtectedList { name: String },

    /// Episode index outside the current series.
    #[error("episode index {n_episode} out of range for series of length {len}")]
    EpisodeOutOfRange { n_episode: usize, len: usize },
}

impl Error {
    /// Creates a shape-mismatch error.
    pub fn shape(message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: message.into(),
        }
    }
}
