//! # Single-channel patch-clamp analysis with `patchclamp_backend`
//!
//! Patch-clamp recordings of single ion channels arrive as a stack of
//! fixed-length episodes: each episode is a time series of measured
//! current from one stimulus presentation, optionally accompanied by the
//! piezo voltage that drove the mechanical stimulus and by the command
//! voltage. Turning those noisy traces into gating statistics takes a
//! pipeline of signal conditioning (baseline correction, filtering)
//! followed by idealization, the reduction of each trace to a
//! piecewise-constant signal over a handful of conductance levels from
//! which discrete open/closed events can be read off.
//!
//! `patchclamp_backend` is the analysis core of such a system. It owns
//! the data model and every analysis operation; file parsing and the
//! GUI live outside and talk to it through plain data records.
//!
//! ## History-aware pipeline
//!
//! Every conditioning stage reads the current series and writes a new,
//! deep-copied series under a datakey spelling out the stage lineage
//! (e.g. `BC_GFILTER1000_` for baseline correction followed by a 1 kHz
//! Gaussian filter). Earlier stages stay available, so any processing
//! state can be revisited by switching the current datakey.
//!
//! # Navigating the crate
//!
//! ### [`recording`] module: your starting point
//!
//! - **Overview**: A [`Recording`] maps lineage datakeys to series and
//!   tracks the current series, the current episode and the user-defined
//!   episode lists.
//! - **Key traits & implementations**: Refer to the [`BaseRecording`]
//!   trait for the full operation surface; [`Recording`] supplies the
//!   storage.
//!
//! ### [`series`] and [`episode`] modules: the data model
//!
//! - **Overview**: A [`Series`] is the ordered list of episodes at one
//!   point of the lineage; an [`Episode`] owns the vectors of one sweep
//!   together with its analysis artifacts. All values are SI.
//!
//! ### [`idealization`] module: events out of noise
//!
//! - **Overview**: Threshold-crossing idealization with optional cubic-
//!   spline upsampling and minimum-duration enforcement, event
//!   extraction, and first-activation detection. See [`Idealizer`].
//!
//! ### Supporting modules
//!
//! - [`baseline`], [`filters`], [`spline`], [`selection`],
//!   [`histogram`]: the numerical building blocks.
//! - [`lineage`]: datakey construction and validation.
//! - [`units`], [`raw`], [`export`], [`config`]: the loader/exporter
//!   boundary.

pub mod baseline;
pub mod config;
pub mod episode;
pub mod error;
pub mod export;
pub mod filters;
pub mod histogram;
pub mod idealization;
pub mod lineage;
pub mod raw;
pub mod recording;
pub mod selection;
pub mod series;
pub mod spline;
pub mod units;

pub use baseline::BaselineMethod;
pub use config::{BaselineParams, CkParams, IdealizationConfig, IdealizationParams};
pub use episode::Episode;
pub use error::{Error, Result};
pub use histogram::Histogram;
pub use idealization::{Event, EventRow, Idealizer};
pub use raw::{Filetype, InputUnits, RawRecording};
pub use recording::{BaseRecording, EpisodeList, Recording, ALL_LIST};
pub use selection::Selection;
pub use series::Series;
pub use units::{CurrentUnit, TimeUnit, VoltageUnit};
