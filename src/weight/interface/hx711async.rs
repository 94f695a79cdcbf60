//! Bit banged HX711 driver. DOUT drops low when a conversion is ready, the result is
//! clocked out MSB first and the number of extra clock pulses selects the next gain.

use crate::weight::interface::AsyncStrainGaugeInterface;
use embassy_time::{Duration, Ticker, Timer};

/// Input channel and gain for the conversion after the current one.
#[allow(dead_code)]
pub enum Hx711Gain {
    Gain128,
    Gain64,
    Gain32ChannelB,
}

impl Hx711Gain {
    /// Clock pulses per reading, 24 data bits plus the gain selection.
    fn tick_count(&self) -> usize {
        match self {
            Hx711Gain::Gain128 => 25,
            Hx711Gain::Gain64 => 27,
            Hx711Gain::Gain32ChannelB => 26,
        }
    }
}

/// PD_SCK high for longer than 60us powers the chip down.
const POWER_MODE_CHANGE_DELAY: Duration = Duration::from_micros(60);
const CLK_HALF_PERIOD: Duration = Duration::from_micros(1);
const VALID_DATA_BITS: usize = 24;

#[derive(Debug)]
pub enum Error<OutPinE, InPinE> {
    OutPin(OutPinE),
    InPin(InPinE),
}

pub struct Hx711Async<CLK, DATA> {
    clock_pin: CLK,
    data_pin: DATA,
    gain_clocks: usize,
    powered_up: bool,
}

impl<CLK, DATA, ClkE, DataE> Hx711Async<CLK, DATA>
where
    CLK: embedded_hal::digital::OutputPin<Error = ClkE>,
    DATA: embedded_hal_async::digital::Wait<Error = DataE>
        + embedded_hal::digital::InputPin<Error = DataE>,
{
    pub fn new(clock_pin: CLK, data_pin: DATA, gain: Hx711Gain) -> Self {
        Self {
            clock_pin,
            data_pin,
            gain_clocks: gain.tick_count(),
            powered_up: false,
        }
    }

    /// Sign extend a 24 bit two's complement conversion result.
    fn sign_extend(raw: u32) -> i32 {
        ((raw << (32 - VALID_DATA_BITS)) as i32) >> (32 - VALID_DATA_BITS)
    }
}

impl<CLK, DATA, ClkE, DataE> AsyncStrainGaugeInterface for Hx711Async<CLK, DATA>
where
    CLK: embedded_hal::digital::OutputPin<Error = ClkE>,
    DATA: embedded_hal_async::digital::Wait<Error = DataE>
        + embedded_hal::digital::InputPin<Error = DataE>,
{
    type Error = Error<ClkE, DataE>;

    async fn initialize(&mut self) -> Result<(), Self::Error> {
        self.power_up().await
    }

    async fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        if !self.powered_up {
            self.power_up().await?;
        }

        self.data_pin.wait_for_low().await.map_err(Error::InPin)?;

        let mut clock_ticker = Ticker::every(CLK_HALF_PERIOD);
        let mut data: u32 = 0;

        clock_ticker.next().await;
        for _ in 0..self.gain_clocks {
            self.clock_pin.set_high().map_err(Error::OutPin)?;
            clock_ticker.next().await;
            self.clock_pin.set_low().map_err(Error::OutPin)?;
            data = (data << 1) | self.data_pin.is_high().map_err(Error::InPin)? as u32;
            clock_ticker.next().await;
        }

        // the trailing gain pulses clock out nothing useful
        data >>= self.gain_clocks - VALID_DATA_BITS;
        Ok(Self::sign_extend(data & ((1 << VALID_DATA_BITS) - 1)))
    }

    async fn power_down(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        Timer::after(POWER_MODE_CHANGE_DELAY).await;
        self.powered_up = false;
        Ok(())
    }

    async fn power_up(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        Timer::after(POWER_MODE_CHANGE_DELAY).await;
        self.powered_up = true;
        Ok(())
    }

    fn get_adc_bit_count(&self) -> usize {
        VALID_DATA_BITS
    }
}
