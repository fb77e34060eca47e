//! Unit handling at the loader/exporter boundary.
//!
//! Internally every trace is stored in SI units (seconds, amperes,
//! volts). The enums here are the closed sets of units the boundary
//! accepts; each carries a multiplier to SI. On ingest values are
//! *divided* by the factor, on export they are *multiplied*.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use maplit::hashmap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Units of electric current accepted at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentUnit {
    #[serde(rename = "fA")]
    FemtoAmpere,
    #[serde(rename = "pA")]
    PicoAmpere,
    #[serde(rename = "nA")]
    NanoAmpere,
    #[serde(rename = "µA")]
    MicroAmpere,
    #[serde(rename = "mA")]
    MilliAmpere,
    #[serde(rename = "A")]
    Ampere,
}

impl CurrentUnit {
    /// Multiplier from SI amperes to this unit.
    pub fn factor(self) -> f64 {
        match self {
            CurrentUnit::FemtoAmpere => 1e15,
            CurrentUnit::PicoAmpere => 1e12,
            CurrentUnit::NanoAmpere => 1e9,
            CurrentUnit::MicroAmpere => 1e6,
            CurrentUnit::MilliAmpere => 1e3,
            CurrentUnit::Ampere => 1.,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CurrentUnit::FemtoAmpere => "fA",
            CurrentUnit::PicoAmpere => "pA",
            CurrentUnit::NanoAmpere => "nA",
            CurrentUnit::MicroAmpere => "µA",
            CurrentUnit::MilliAmpere => "mA",
            CurrentUnit::Ampere => "A",
        }
    }

    /// Converts a value given in this unit to SI amperes.
    pub fn to_si(self, value: f64) -> f64 {
        value / self.factor()
    }

    /// Converts a value in SI amperes to this unit.
    pub fn from_si(self, value: f64) -> f64 {
        value * self.factor()
    }
}

impl fmt::Display for CurrentUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for CurrentUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fA" => Ok(CurrentUnit::FemtoAmpere),
            "pA" => Ok(CurrentUnit::PicoAmpere),
            "nA" => Ok(CurrentUnit::NanoAmpere),
            "µA" | "uA" => Ok(CurrentUnit::MicroAmpere),
            "mA" => Ok(CurrentUnit::MilliAmpere),
            "A" => Ok(CurrentUnit::Ampere),
            _ => Err(Error::UnknownUnit { unit: s.to_string() }),
        }
    }
}

/// Units of voltage (piezo and command channels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoltageUnit {
    #[serde(rename = "µV")]
    MicroVolt,
    #[serde(rename = "mV")]
    MilliVolt,
    #[serde(rename = "V")]
    Volt,
}

impl VoltageUnit {
    /// Multiplier from SI volts to this unit.
    pub fn factor(self) -> f64 {
        match self {
            VoltageUnit::MicroVolt => 1e6,
            VoltageUnit::MilliVolt => 1e3,
            VoltageUnit::Volt => 1.,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VoltageUnit::MicroVolt => "µV",
            VoltageUnit::MilliVolt => "mV",
            VoltageUnit::Volt => "V",
        }
    }

    pub fn to_si(self, value: f64) -> f64 {
        value / self.factor()
    }

    pub fn from_si(self, value: f64) -> f64 {
        value * self.factor()
    }
}

impl fmt::Display for VoltageUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for VoltageUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "µV" | "uV" => Ok(VoltageUnit::MicroVolt),
            "mV" => Ok(VoltageUnit::MilliVolt),
            "V" => Ok(VoltageUnit::Volt),
            _ => Err(Error::UnknownUnit { unit: s.to_string() }),
        }
    }
}

/// Units of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "µs")]
    MicroSecond,
    #[serde(rename = "ms")]
    MilliSecond,
    #[serde(rename = "s")]
    Second,
}

impl TimeUnit {
    /// Multiplier from SI seconds to this unit.
    pub fn factor(self) -> f64 {
        match self {
            TimeUnit::MicroSecond => 1e6,
            TimeUnit::MilliSecond => 1e3,
            TimeUnit::Second => 1.,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeUnit::MicroSecond => "µs",
            TimeUnit::MilliSecond => "ms",
            TimeUnit::Second => "s",
        }
    }

    pub fn to_si(self, value: f64) -> f64 {
        value / self.factor()
    }

    pub fn from_si(self, value: f64) -> f64 {
        value * self.factor()
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "µs" | "us" => Ok(TimeUnit::MicroSecond),
            "ms" => Ok(TimeUnit::MilliSecond),
            "s" => Ok(TimeUnit::Second),
            _ => Err(Error::UnknownUnit { unit: s.to_string() }),
        }
    }
}

/// Label-to-factor table for current units, for boundary callers that
/// enumerate the supported units (e.g. a unit picker).
pub fn current_unit_factors() -> HashMap<&'static str, f64> {
    hashmap! {
        "fA" => 1e15,
        "pA" => 1e12,
        "nA" => 1e9,
        "µA" => 1e6,
        "mA" => 1e3,
        "A" => 1.,
    }
}

/// Label-to-factor table for voltage units.
pub fn voltage_unit_factors() -> HashMap<&'static str, f64> {
    hashmap! {
        "µV" => 1e6,
        "mV" => 1e3,
        "V" => 1.,
    }
}

/// Label-to-factor table for time units.
pub fn time_unit_factors() -> HashMap<&'static str, f64> {
    hashmap! {
        "µs" => 1e6,
        "ms" => 1e3,
        "s" => 1.,
    }
}
