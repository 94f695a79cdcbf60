pub mod hx711async;

/// Bridge type ADC on the load cell.
pub trait AsyncStrainGaugeInterface {
    type Error;

    /// Power up and get the converter into a state where it produces readings.
    async fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Wait for the next conversion. Wakes the converter first if it was powered down.
    async fn get_next_reading(&mut self) -> Result<i32, Self::Error>;

    async fn power_down(&mut self) -> Result<(), Self::Error>;

    async fn power_up(&mut self) -> Result<(), Self::Error>;

    /// Resolution of one reading.
    fn get_adc_bit_count(&self) -> usize;
}
