//! Lineage keys (datakeys) for the stage pipeline.
//!
//! Every series in a recording is filed under a datakey that spells out
//! the stages applied to obtain it, e.g. `BC_GFILTER1000_` for a
//! baseline-corrected then Gaussian-filtered series. `raw_` denotes the
//! untouched loaded data and is dropped as soon as the first stage is
//! applied.

use regex::Regex;

/// Datakey of the untouched loaded series.
pub const RAW_DATAKEY: &str = "raw_";

/// Tag appended by baseline correction.
pub const BASELINE_TAG: &str = "BC_";

// Numeric tag components print without a trailing ".0" when integral,
// so a 1 kHz filter yields "GFILTER1000_".
fn format_tag_num(x: f64) -> String {
    if x.fract() == 0. && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}

/// Tag appended by a Gaussian filter at the given cutoff frequency (Hz).
pub fn gaussian_tag(filter_freq: f64) -> String {
    format!("GFILTER{}_", format_tag_num(filter_freq))
}

/// Tag appended by a Chung-Kennedy filter with `n_filters` window
/// lengths, weight exponent `p` and weight window `m`.
pub fn ck_tag(n_filters: usize, weight_exponent: f64, weight_window: usize) -> String {
    format!(
        "CKFILTER_K{}p{}M{}_",
        n_filters,
        format_tag_num(weight_exponent),
        weight_window
    )
}

/// Derives the datakey of a stage's output series from the key of its
/// input series: the tag is appended, and a leading `raw_` is dropped.
///
/// # Example
///
/// ```
/// use patchclamp_backend::lineage::*;
///
/// let key = derive_datakey(RAW_DATAKEY, BASELINE_TAG);
/// assert_eq!(key, "BC_");
/// let key = derive_datakey(&key, &gaussian_tag(1000.));
/// assert_eq!(key, "BC_GFILTER1000_");
/// ```
pub fn derive_datakey(current: &str, tag: &str) -> String {
    if current == RAW_DATAKEY {
        tag.to_string()
    } else {
        format!("{}{}", current, tag)
    }
}

/// Checks a datakey against the lineage-key grammar.
///
/// Keys built by the pipeline are valid by construction; this gate is
/// for keys entering from outside, e.g. when a serialized recording is
/// reconstructed.
pub fn is_valid_datakey(datakey: &str) -> bool {
    let re = Regex::new(
        r"^(raw_|(?:(?:BC|GFILTER\d+(?:\.\d+)?|CKFILTER_K\d+p\d+(?:\.\d+)?M\d+)_)+)$",
    )
    .unwrap();
    re.is_match(datakey)
}
