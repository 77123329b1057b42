//! Detector settings and their rotation angles
//!
//! Each detector has three positions. Setting `n` rotates its qubit about
//! the X axis by `π·n/3` before measurement.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::SETTING_COUNT;
use crate::error::{MerminError, Result};

/// One of the three admissible detector positions: 0, 1 or 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct DetectorSetting(u8);

impl DetectorSetting {
    /// Validate a raw setting value
    pub fn new(value: i64) -> Result<Self> {
        if (0..SETTING_COUNT as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(MerminError::InvalidSetting(value.to_string()))
        }
    }

    /// All three settings in ascending order
    pub fn all() -> impl Iterator<Item = DetectorSetting> {
        (0..SETTING_COUNT).map(DetectorSetting)
    }

    /// Raw value (0, 1 or 2)
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Rotation as a fraction of π
    pub fn angle_fraction(&self) -> AngleFraction {
        AngleFraction { numerator: self.0 }
    }
}

impl TryFrom<i64> for DetectorSetting {
    type Error = MerminError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DetectorSetting> for u8 {
    fn from(setting: DetectorSetting) -> u8 {
        setting.0
    }
}

impl FromStr for DetectorSetting {
    type Err = MerminError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let value = s
            .parse::<i64>()
            .map_err(|_| MerminError::InvalidSetting(s.to_string()))?;
        Self::new(value)
    }
}

impl std::fmt::Display for DetectorSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exact rotation fraction `n/3`, a multiple of π
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleFraction {
    numerator: u8,
}

impl AngleFraction {
    /// Denominator shared by every setting
    pub const DENOMINATOR: u8 = SETTING_COUNT;

    /// Fraction as a float: 0, 1/3 or 2/3
    pub fn value(&self) -> f64 {
        self.numerator as f64 / Self::DENOMINATOR as f64
    }

    /// Rotation angle in radians
    pub fn radians(&self) -> f64 {
        std::f64::consts::PI * self.value()
    }
}

impl std::fmt::Display for AngleFraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.numerator == 0 {
            write!(f, "0")
        } else {
            write!(f, "{}/{}", self.numerator, Self::DENOMINATOR)
        }
    }
}

/// Map a raw setting straight to its angle fraction
pub fn to_angle_fraction(setting: i64) -> Result<AngleFraction> {
    DetectorSetting::new(setting).map(|s| s.angle_fraction())
}

// =============================================================================
// TESTS
// =============================================================================
