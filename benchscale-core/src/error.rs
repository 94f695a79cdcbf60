// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::storage::StorageKey;
use core::fmt;

/// Persisted data that could not be used. The caller falls back to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    Unreadable(StorageKey),
    Corrupt(StorageKey),
    OutOfRange(StorageKey),
}

/// The prompt that was waiting when an input timeout fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flow {
    MemoryStore,
    ReferenceEntry,
    CalibrationEdit,
    Calibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavigationError {
    DepthExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Reference weight of zero, the constant would be infinite.
    ZeroReference,
    /// Nothing measurable on the scale, the constant would be zero.
    NoLoad,
    /// The load cell has no complete data set yet.
    NotReady,
}

/// Everything the controller can recover from. None of these stop the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScaleError {
    Config(ConfigError),
    InputTimeout(Flow),
    MeasurementUnavailable,
    Navigation(NavigationError),
    Calibration(CalibrationError),
    StorageWrite(StorageKey),
}

impl From<ConfigError> for ScaleError {
    fn from(err: ConfigError) -> Self {
        ScaleError::Config(err)
    }
}

impl From<NavigationError> for ScaleError {
    fn from(err: NavigationError) -> Self {
        ScaleError::Navigation(err)
    }
}

impl From<CalibrationError> for ScaleError {
    fn from(err: CalibrationError) -> Self {
        ScaleError::Calibration(err)
    }
}

impl fmt::Display for ScaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleError::Config(ConfigError::Unreadable(key)) => {
                write!(f, "stored value at {} unreadable", key.0)
            }
            ScaleError::Config(ConfigError::Corrupt(key)) => {
                write!(f, "stored value at {} corrupt", key.0)
            }
            ScaleError::Config(ConfigError::OutOfRange(key)) => {
                write!(f, "stored value at {} out of range", key.0)
            }
            ScaleError::InputTimeout(flow) => write!(f, "no input during {:?}", flow),
            ScaleError::MeasurementUnavailable => f.write_str("no data from load cell"),
            ScaleError::Navigation(NavigationError::DepthExceeded) => {
                f.write_str("menu stack depth exceeded")
            }
            ScaleError::Calibration(CalibrationError::ZeroReference) => {
                f.write_str("reference weight is zero")
            }
            ScaleError::Calibration(CalibrationError::NoLoad) => {
                f.write_str("no load measured for calibration")
            }
            ScaleError::Calibration(CalibrationError::NotReady) => {
                f.write_str("load cell not ready")
            }
            ScaleError::StorageWrite(key) => write!(f, "write to {} failed", key.0),
        }
    }
}
