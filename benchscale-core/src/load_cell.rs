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

use crate::error::CalibrationError;
use crate::measurement::{MeasurementSource, TareMode};
use heapless::Deque;
use micromath::statistics::Mean;

pub const DATA_SET_SIZE: usize = 16;

/// Smallest tared signal, in counts, that a calibration is allowed to divide by.
const MIN_CALIBRATION_SIGNAL: f32 = 1.0;

/// Converts raw strain gauge counts into pounds.
///
/// Raw readings go into a moving data set of `N` samples. The weight is the data set
/// average minus the tare offset, divided by the calibration factor (counts per pound).
pub struct LoadCell<const N: usize = DATA_SET_SIZE> {
    data_set: Deque<i32, N>,
    fresh_samples: usize,
    tare_offset: f32,
    calibration_factor: f32,
    tare_pending: bool,
    new_data: bool,
}

impl<const N: usize> LoadCell<N> {
    pub const fn new(calibration_factor: f32) -> Self {
        Self {
            data_set: Deque::new(),
            fresh_samples: 0,
            tare_offset: 0.0,
            calibration_factor,
            tare_pending: false,
            new_data: false,
        }
    }

    pub fn push_raw(&mut self, raw: i32) {
        if self.data_set.is_full() {
            self.data_set.pop_front();
        }
        // cannot fail, a slot was freed above
        let _ = self.data_set.push_back(raw);
        self.fresh_samples = self.fresh_samples.saturating_add(1);
        self.new_data = true;

        if self.tare_pending && self.data_ready() {
            if let Some(average) = self.average() {
                self.tare_offset = average;
                self.tare_pending = false;
                debug!("Deferred tare complete, offset = {}", average);
            }
        }
    }

    fn average(&self) -> Option<f32> {
        if self.data_set.is_empty() {
            return None;
        }
        Some(self.data_set.iter().map(|&raw| raw as f32).mean())
    }

    pub fn tare_offset(&self) -> f32 {
        self.tare_offset
    }

    /// Current weight without consuming the new-data flag.
    pub fn weight(&self) -> Option<f32> {
        self.average()
            .map(|average| (average - self.tare_offset) / self.calibration_factor)
    }
}

impl<const N: usize> MeasurementSource for LoadCell<N> {
    fn sample(&mut self) -> Option<f32> {
        if !self.new_data || self.tare_pending {
            return None;
        }
        self.new_data = false;
        self.weight()
    }

    fn tare(&mut self, mode: TareMode) {
        match (mode, self.average()) {
            (TareMode::Blocking, Some(average)) => {
                self.tare_offset = average;
                self.tare_pending = false;
                debug!("Tare offset = {}", average);
            }
            _ => {
                self.tare_pending = true;
                self.fresh_samples = 0;
                trace!("Tare deferred until {} fresh samples", N);
            }
        }
    }

    fn tare_pending(&self) -> bool {
        self.tare_pending
    }

    fn restart(&mut self) {
        self.data_set.clear();
        self.fresh_samples = 0;
        self.tare_pending = false;
        self.new_data = false;
    }

    fn refresh_data_set(&mut self) {
        self.data_set.clear();
        self.fresh_samples = 0;
        self.new_data = false;
    }

    fn data_ready(&self) -> bool {
        self.fresh_samples >= N
    }

    fn set_calibration_factor(&mut self, factor: f32) {
        if factor == 0.0 || !factor.is_finite() {
            warn!("Ignoring unusable calibration factor {}", factor);
            return;
        }
        self.calibration_factor = factor;
    }

    fn calibration_factor(&self) -> f32 {
        self.calibration_factor
    }

    fn compute_calibration_from_reference(
        &mut self,
        reference_weight: f32,
    ) -> Result<f32, CalibrationError> {
        if reference_weight == 0.0 || !reference_weight.is_finite() {
            return Err(CalibrationError::ZeroReference);
        }
        if !self.data_ready() {
            return Err(CalibrationError::NotReady);
        }
        let average = self.average().ok_or(CalibrationError::NotReady)?;

        let tared = average - self.tare_offset;
        if tared.abs() < MIN_CALIBRATION_SIGNAL {
            return Err(CalibrationError::NoLoad);
        }

        let factor = tared / reference_weight;
        trace!("Calibration counts per pound = {}", factor);
        self.calibration_factor = factor;
        Ok(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFSET: i32 = 84_000;

    fn filled(raw: i32) -> LoadCell<4> {
        let mut cell = LoadCell::<4>::new(1.0);
        for _ in 0..4 {
            cell.push_raw(raw);
        }
        cell
    }

    #[test]
    fn blocking_tare_zeroes_current_average() {
        let mut cell = filled(OFFSET);
        cell.tare(TareMode::Blocking);
        assert_eq!(cell.sample(), Some(0.0));
    }

    #[test]
    fn sample_only_reports_new_data_once() {
        let mut cell = filled(100);
        assert!(cell.sample().is_some());
        assert_eq!(cell.sample(), None);
        cell.push_raw(100);
        assert!(cell.sample().is_some());
    }

    #[test]
    fn deferred_tare_waits_for_a_full_fresh_data_set() {
        let mut cell = filled(500);
        cell.tare(TareMode::Deferred);
        assert!(cell.tare_pending());

        for _ in 0..3 {
            cell.push_raw(1000);
            assert_eq!(cell.sample(), None);
        }
        cell.push_raw(1000);
        assert!(!cell.tare_pending());
        assert_eq!(cell.tare_offset(), 1000.0);
        assert_eq!(cell.sample(), Some(0.0));
    }

    #[test]
    fn blocking_tare_on_empty_data_set_is_deferred() {
        let mut cell = LoadCell::<4>::new(1.0);
        cell.tare(TareMode::Blocking);
        assert!(cell.tare_pending());
    }

    #[test]
    fn weight_divides_tared_counts_by_factor() {
        let mut cell = filled(OFFSET);
        cell.tare(TareMode::Blocking);
        cell.set_calibration_factor(400.0);
        for _ in 0..4 {
            cell.push_raw(OFFSET + 800);
        }
        assert_eq!(cell.sample(), Some(2.0));
    }

    #[test]
    fn calibration_constant_maps_reference_load_back_to_reference() {
        let counts_per_pound = 21_450.0_f32;
        let mut cell = filled(OFFSET);
        cell.tare(TareMode::Blocking);
        cell.set_calibration_factor(1.0);

        let loaded = OFFSET + counts_per_pound as i32;
        for _ in 0..4 {
            cell.push_raw(loaded);
        }
        let constant = cell.compute_calibration_from_reference(1.0).unwrap();

        let tared_raw = (loaded - OFFSET) as f32;
        assert!((tared_raw * (1.0 / constant) - 1.0).abs() < 1e-4);
        assert_eq!(cell.calibration_factor(), constant);
    }

    #[test]
    fn calibration_rejects_zero_reference_and_empty_scale() {
        let mut cell = filled(OFFSET);
        cell.tare(TareMode::Blocking);
        assert_eq!(
            cell.compute_calibration_from_reference(0.0),
            Err(CalibrationError::ZeroReference)
        );
        assert_eq!(
            cell.compute_calibration_from_reference(1.0),
            Err(CalibrationError::NoLoad)
        );
        assert_eq!(cell.calibration_factor(), 1.0);
    }

    #[test]
    fn refresh_requires_fresh_samples_before_calibrating() {
        let mut cell = filled(OFFSET + 1000);
        cell.refresh_data_set();
        assert!(!cell.data_ready());
        assert_eq!(
            cell.compute_calibration_from_reference(1.0),
            Err(CalibrationError::NotReady)
        );
    }

    #[test]
    fn zero_factor_is_never_installed() {
        let mut cell = LoadCell::<4>::new(250.0);
        cell.set_calibration_factor(0.0);
        cell.set_calibration_factor(f32::NAN);
        assert_eq!(cell.calibration_factor(), 250.0);
        cell.set_calibration_factor(-250.0);
        assert_eq!(cell.calibration_factor(), -250.0);
    }
}
