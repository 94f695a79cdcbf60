use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

/// A little over a second of conversions at 10 SPS.
const CHANNEL_DEPTH: usize = 12;

/// Raw ADC counts from the strain gauge, oldest first.
pub type RawReadingChannel = Channel<CriticalSectionRawMutex, i32, CHANNEL_DEPTH>;
pub type RawReadingSender<'a> = Sender<'a, CriticalSectionRawMutex, i32, CHANNEL_DEPTH>;
pub type RawReadingReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, i32, CHANNEL_DEPTH>;
