use crate::error::CalibrationError;

pub const KILOGRAMS_PER_POUND: f32 = 0.453_592_37;

/// How a tare request should complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TareMode {
    /// Take the current average as zero right away.
    Blocking,
    /// Zero on the average of the next complete data set.
    Deferred,
}

/// Calibrated weight source, usually a load cell behind an ADC.
pub trait MeasurementSource {
    /// Latest weight in pounds, `None` when nothing new arrived since the last call.
    fn sample(&mut self) -> Option<f32>;

    fn tare(&mut self, mode: TareMode);

    /// True while a deferred tare is still collecting its data set.
    fn tare_pending(&self) -> bool;

    /// Forget every sample and start filling the data set again.
    fn restart(&mut self);

    /// Drop the current data set so the next computation only sees fresh samples.
    fn refresh_data_set(&mut self);

    /// True once the data set is full since the last restart or refresh.
    fn data_ready(&self) -> bool;

    fn set_calibration_factor(&mut self, factor: f32);

    fn calibration_factor(&self) -> f32;

    /// Derive and install the calibration factor that makes the current load read as
    /// `reference_weight`.
    fn compute_calibration_from_reference(
        &mut self,
        reference_weight: f32,
    ) -> Result<f32, CalibrationError>;
}

/// The weight shown on the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeightReading {
    pub pounds: f32,
    pub kilograms: f32,
}

impl WeightReading {
    pub fn from_pounds(pounds: f32) -> Self {
        Self {
            pounds,
            kilograms: pounds * KILOGRAMS_PER_POUND,
        }
    }
}
