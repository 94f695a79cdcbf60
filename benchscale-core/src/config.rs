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

use embassy_time::Duration;

/// Timings and step sizes used by the controller. `Default` matches the shipped scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaleConfig {
    /// Minimum time between two consumed weight samples.
    pub read_interval: Duration,
    /// Weight screen refresh period.
    pub display_refresh: Duration,
    /// Weight screen is only redrawn when the reading moved more than this (pounds).
    pub weight_change_threshold: f32,
    /// Dwell for short confirmations (stored, aborted, clearing, zeroing).
    pub message_dwell: Duration,
    /// Dwell for results the user has to read (new calibration constant, save).
    pub result_dwell: Duration,
    /// Settle window between re-initialising the load cell and the calibration tare.
    pub calibration_settle: Duration,
    pub startup_dwell: Duration,
    /// Any prompt waiting on the user gives up after this long.
    pub input_timeout: Duration,
    /// No fresh sample for this long raises a measurement warning.
    pub measurement_stale_after: Duration,
    pub reference_step: f32,
    pub calibration_step: f32,
    pub default_reference_weight: f32,
    pub default_calibration_constant: f32,
}

impl ScaleConfig {
    pub const fn new() -> Self {
        Self {
            read_interval: Duration::from_millis(100),
            display_refresh: Duration::from_millis(200),
            weight_change_threshold: 0.001,
            message_dwell: Duration::from_millis(1000),
            result_dwell: Duration::from_millis(2000),
            calibration_settle: Duration::from_millis(2000),
            startup_dwell: Duration::from_millis(1000),
            input_timeout: Duration::from_secs(30),
            measurement_stale_after: Duration::from_millis(2000),
            reference_step: 0.01,
            calibration_step: 1.0,
            default_reference_weight: 1.0,
            default_calibration_constant: 1.0,
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self::new()
    }
}
