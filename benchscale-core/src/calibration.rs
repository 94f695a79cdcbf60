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

//! Reference entry, the tare/load calibration run and manual editing of the constant.

use crate::config::ScaleConfig;
use crate::error::{ConfigError, Flow, ScaleError};
use crate::input::Direction;
use crate::measurement::{MeasurementSource, TareMode};
use crate::storage::StorageKey;
use embassy_time::Instant;
use micromath::F32Ext;
use strum::{EnumIter, IntoStaticStr};

/// Fixed texts shown by the controller. Each fits the four line display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prompt {
    #[strum(serialize = "Starting\nup...")]
    Startup,
    #[strum(serialize = "Double-clk\nto Store\nClick\nto Abort")]
    ConfirmStore,
    #[strum(serialize = "Stored\nWeight")]
    Stored,
    #[strum(serialize = "Store\nAborted")]
    StoreAborted,
    #[strum(serialize = "Clearing\nMemory...")]
    ClearingMemory,
    #[strum(serialize = "Zeroing\nScale...")]
    Zeroing,
    #[strum(serialize = "Rotate and\nClick To\nSet Ref")]
    EnterReference,
    #[strum(serialize = "Rotate and\nClick To\nEdit calVal")]
    EditConstant,
    #[strum(serialize = "Remove Any\nWeight on\nScale then\nclick")]
    ClearScale,
    #[strum(serialize = "Resetting\ncalVal\nFactor...")]
    Resetting,
    #[strum(serialize = "Place Ref\nWeight On\nScale Then\nclick")]
    PlaceReference,
    #[strum(serialize = "Calibrating")]
    Calibrating,
    #[strum(serialize = "New calVal")]
    NewConstant,
    #[strum(serialize = "Saving")]
    Saving,
    #[strum(serialize = "Calibration\nFailed")]
    CalibrationFailed,
    #[strum(serialize = "Calibration\nCancelled")]
    CalibrationCancelled,
    #[strum(serialize = "Rejected\ncalVal 0")]
    ZeroConstant,
    #[strum(serialize = "No Sensor Data")]
    NoSensorData,
}

impl Prompt {
    pub fn text(self) -> &'static str {
        self.into()
    }
}

/// Volatile calibration values. The constant only reaches storage through "Save Cal".
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationState {
    pub reference_weight: f32,
    pub constant: f32,
}

impl CalibrationState {
    pub fn new(config: &ScaleConfig, constant: f32) -> Self {
        Self {
            reference_weight: config.default_reference_weight,
            constant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EditTarget {
    ReferenceWeight,
    CalibrationConstant,
}

impl EditTarget {
    pub fn flow(self) -> Flow {
        match self {
            EditTarget::ReferenceWeight => Flow::ReferenceEntry,
            EditTarget::CalibrationConstant => Flow::CalibrationEdit,
        }
    }

    pub fn prompt(self) -> Prompt {
        match self {
            EditTarget::ReferenceWeight => Prompt::EnterReference,
            EditTarget::CalibrationConstant => Prompt::EditConstant,
        }
    }
}

/// A value being turned up and down with the encoder. Nothing changes until
/// [`CalibrationSession::commit`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSession {
    target: EditTarget,
    value: f32,
    step: f32,
}

impl CalibrationSession {
    pub fn reference_weight(current: f32, config: &ScaleConfig) -> Self {
        Self {
            target: EditTarget::ReferenceWeight,
            value: current,
            step: config.reference_step,
        }
    }

    /// Editing the constant starts from its nearest whole number.
    pub fn calibration_constant(current: f32, config: &ScaleConfig) -> Self {
        Self {
            target: EditTarget::CalibrationConstant,
            value: current.round(),
            step: config.calibration_step,
        }
    }

    pub fn rotate(&mut self, direction: Direction) {
        match direction {
            Direction::Clockwise => self.value += self.step,
            Direction::CounterClockwise => self.value -= self.step,
        }
    }

    pub fn target(&self) -> EditTarget {
        self.target
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Final value. A calibration constant of zero would turn every reading into
    /// infinity and is refused.
    pub fn commit(self) -> Result<f32, ConfigError> {
        if self.target == EditTarget::CalibrationConstant && self.value == 0.0 {
            return Err(ConfigError::OutOfRange(StorageKey::CALIBRATION_CONSTANT));
        }
        Ok(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunStep {
    /// Waiting for the user to empty the scale.
    AwaitClearScale,
    /// Load cell restarted, waiting out the settle window before the tare.
    Settling { until: Instant },
    /// Tared at unity factor, waiting for the reference weight to go on.
    AwaitReference,
    /// Collecting a fresh data set with the reference on the scale.
    Sampling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunOutcome {
    /// Still running. Carries a prompt when the screen has to change.
    Continue(Option<Prompt>),
    /// New constant installed in the measurement source.
    Finished(f32),
    /// Aborted, the previous factor is back in place.
    Failed(ScaleError),
    Cancelled,
}

/// The clear, tare, load, compute sequence without blocking the event loop.
///
/// Every step has a deadline. Prompts waiting for a click time out as an input
/// timeout, steps waiting for the load cell time out as missing measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRun {
    step: RunStep,
    previous_factor: f32,
    deadline: Instant,
}

impl CalibrationRun {
    pub fn start(previous_factor: f32, now: Instant, config: &ScaleConfig) -> Self {
        debug!("Calibration started, previous factor {}", previous_factor);
        Self {
            step: RunStep::AwaitClearScale,
            previous_factor,
            deadline: now + config.input_timeout,
        }
    }

    /// Fixed wait for the load cell to deliver: settle window plus the staleness bound.
    fn measurement_deadline(now: Instant, config: &ScaleConfig) -> Instant {
        now + config.calibration_settle + config.measurement_stale_after
    }

    pub fn click<M: MeasurementSource>(
        &mut self,
        source: &mut M,
        now: Instant,
        config: &ScaleConfig,
    ) -> RunOutcome {
        match self.step {
            RunStep::AwaitClearScale => {
                source.restart();
                let until = now + config.calibration_settle;
                self.step = RunStep::Settling { until };
                self.deadline = Self::measurement_deadline(now, config);
                trace!("Calibration settling");
                RunOutcome::Continue(Some(Prompt::Resetting))
            }
            RunStep::AwaitReference => {
                source.refresh_data_set();
                self.step = RunStep::Sampling;
                self.deadline = Self::measurement_deadline(now, config);
                trace!("Calibration sampling reference");
                RunOutcome::Continue(Some(Prompt::Calibrating))
            }
            RunStep::Settling { .. } | RunStep::Sampling => RunOutcome::Continue(None),
        }
    }

    pub fn cancel<M: MeasurementSource>(&mut self, source: &mut M) -> RunOutcome {
        debug!("Calibration cancelled");
        source.set_calibration_factor(self.previous_factor);
        RunOutcome::Cancelled
    }

    /// Advance on time and load cell progress. Call every tick.
    pub fn poll<M: MeasurementSource>(
        &mut self,
        source: &mut M,
        reference_weight: f32,
        now: Instant,
        config: &ScaleConfig,
    ) -> RunOutcome {
        match self.step {
            RunStep::Settling { until } if now >= until && source.data_ready() => {
                source.tare(TareMode::Blocking);
                source.set_calibration_factor(1.0);
                self.step = RunStep::AwaitReference;
                self.deadline = now + config.input_timeout;
                trace!("Calibration tared at unity factor");
                RunOutcome::Continue(Some(Prompt::PlaceReference))
            }
            RunStep::Sampling if source.data_ready() => {
                match source.compute_calibration_from_reference(reference_weight) {
                    Ok(constant) => {
                        debug!("New calibration constant {}", constant);
                        RunOutcome::Finished(constant)
                    }
                    Err(e) => self.fail(source, e.into()),
                }
            }
            _ if now >= self.deadline => {
                let error = match self.step {
                    RunStep::AwaitClearScale | RunStep::AwaitReference => {
                        ScaleError::InputTimeout(Flow::Calibration)
                    }
                    RunStep::Settling { .. } | RunStep::Sampling => {
                        ScaleError::MeasurementUnavailable
                    }
                };
                self.fail(source, error)
            }
            _ => RunOutcome::Continue(None),
        }
    }

    fn fail<M: MeasurementSource>(&mut self, source: &mut M, error: ScaleError) -> RunOutcome {
        warn!("Calibration failed: {:?}", error);
        source.set_calibration_factor(self.previous_factor);
        RunOutcome::Failed(error)
    }
}
