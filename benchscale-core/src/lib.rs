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

//! Board-agnostic logic for the load-cell bench scale.
//!
//! Everything here runs without hardware so it can be tested on the host:
//!
//! - the static menu tree and the stack based navigator
//! - the calibration workflow (reference entry, tare/load cycle, manual edit, save)
//! - the eight slot memory bank and re-zero
//! - [`controller::ScaleController`], the single event loop that ties them together
//! - the traits the firmware implements for the load cell, input, storage and display

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod calibration;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod load_cell;
pub mod measurement;
pub mod memory;
pub mod menu;
pub mod presenter;
pub mod storage;

pub use config::ScaleConfig;
pub use controller::ScaleController;
pub use error::ScaleError;
pub use input::{Direction, InputEvent, InputSource};
pub use measurement::{MeasurementSource, WeightReading};
pub use presenter::Presenter;
pub use storage::{PersistentStore, StorageKey};
