#![no_std]
#![no_main]

mod application;
mod hmi;
mod storage;
mod weight;

use core::ops::Range;
use embassy_executor::{Executor, Spawner};
use embassy_time::Duration;
#[allow(unused_imports)]
use {defmt_rtt as _, panic_probe as _};

use crate::application::scale_manager::ScaleManager;
use crate::hmi::debouncer::Debouncer;
use crate::hmi::display::{display_update_handler, DisplaySignal, SignalPresenter};
use crate::hmi::event_channels::{InputEventChannel, QueuedInput};
use crate::hmi::inputs::hmi_input_handler;
use crate::hmi::rotary_encoder::RotaryEncoder;
use crate::storage::flash_store::{BlockingAsyncFlash, FlashStore};
use crate::weight::event_channels::RawReadingChannel;
use crate::weight::interface::hx711async::{Hx711Async, Hx711Gain};
use crate::weight::reader::strain_gauge_reader;
use assign_resources::assign_resources;
use defmt::{info, unwrap};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_rp::flash::{self, Flash};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, Config};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::I2C0;
use embassy_rp::{bind_interrupts, peripherals};
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use sh1106::{prelude::*, Builder};
use static_cell::StaticCell;

pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
const STORAGE_SIZE: usize = 64 * 1024;
/// Offsets into the flash, must match the hole left at the end of FLASH in memory.x.
const STORAGE_RANGE: Range<u32> = (FLASH_SIZE - STORAGE_SIZE) as u32..FLASH_SIZE as u32;

const BUTTON_DEBOUNCE: Duration = Duration::from_millis(20);

static INPUT_EVENT_CHANNEL: InputEventChannel = Channel::new();
static RAW_READING_CHANNEL: RawReadingChannel = Channel::new();
static DISPLAY_SIGNAL: DisplaySignal = Signal::new();

assign_resources! {
    display_i2c: DisplayI2cPins{
        sda_pin: PIN_4,
        scl_pin: PIN_5,
        i2c_peripheral: I2C0
    },
    hmi_inputs: HmiInputPins {
        rotary_dt_pin: PIN_7,
        rotary_clk_pin: PIN_8,
        push_btn_pin: PIN_6,
    },
    strain_gauge_io: StrainGaugeResources {
        clk_pin: PIN_14,
        data_pin: PIN_15,
    },
    storage: StorageResources {
        flash: FLASH,
    }
}

struct Core0Resources {
    hmi_inputs: HmiInputPins,
    strain_gauge_io: StrainGaugeResources,
    storage: StorageResources,
}

struct Core1Resources {
    display_i2c: DisplayI2cPins,
}

bind_interrupts!(struct I2cIrqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

static mut CORE1_STACK: Stack<4096> = Stack::new();
static EXECUTOR0: StaticCell<Executor> = StaticCell::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = embassy_rp::init(Default::default());
    let resources = split_resources! {p};

    let core0_resources = Core0Resources {
        hmi_inputs: resources.hmi_inputs,
        strain_gauge_io: resources.strain_gauge_io,
        storage: resources.storage,
    };
    let core1_resources = Core1Resources {
        display_i2c: resources.display_i2c,
    };

    info!("Bench scale starting, display on core 1");

    spawn_core1(
        p.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| core1_main(spawner, core1_resources));
        },
    );

    let executor0 = EXECUTOR0.init(Executor::new());
    executor0.run(|spawner| core0_main(spawner, core0_resources));
}

fn core0_main(spawner: Spawner, resources: Core0Resources) {
    unwrap!(spawner.spawn(hmi_input_task(resources.hmi_inputs)));
    unwrap!(spawner.spawn(weighing_task(resources.strain_gauge_io)));
    unwrap!(spawner.spawn(scale_task(resources.storage)));
}

fn core1_main(spawner: Spawner, resources: Core1Resources) {
    unwrap!(spawner.spawn(display_task(resources.display_i2c)));
}

#[embassy_executor::task]
async fn hmi_input_task(hmi_input_pins: HmiInputPins) {
    let debounced_btn = Debouncer::new(
        Input::new(hmi_input_pins.push_btn_pin, Pull::Up),
        BUTTON_DEBOUNCE,
    );
    let mut rotary_encoder = RotaryEncoder::new(
        Input::new(hmi_input_pins.rotary_dt_pin, Pull::Up),
        Input::new(hmi_input_pins.rotary_clk_pin, Pull::Up),
    );

    hmi_input_handler(
        INPUT_EVENT_CHANNEL.sender(),
        debounced_btn,
        &mut rotary_encoder,
    )
    .await;
}

#[embassy_executor::task]
async fn display_task(display_i2c_pins: DisplayI2cPins) {
    let i2c = i2c::I2c::new_async(
        display_i2c_pins.i2c_peripheral,
        display_i2c_pins.scl_pin,
        display_i2c_pins.sda_pin,
        I2cIrqs,
        Config::default(),
    );

    let mut display: GraphicsMode<_> = Builder::new().connect_i2c(i2c).into();

    display_update_handler(&DISPLAY_SIGNAL, &mut display).await;
}

#[embassy_executor::task]
async fn weighing_task(strain_gauge_resources: StrainGaugeResources) {
    let clk_pin_out = Output::new(strain_gauge_resources.clk_pin, Level::Low);
    let data_pin = Input::new(strain_gauge_resources.data_pin, Pull::Up);
    let strain_gauge = Hx711Async::new(clk_pin_out, data_pin, Hx711Gain::Gain128);

    strain_gauge_reader(strain_gauge, RAW_READING_CHANNEL.sender()).await;
}

#[embassy_executor::task]
async fn scale_task(storage_resources: StorageResources) {
    let flash = Flash::<_, flash::Blocking, FLASH_SIZE>::new_blocking(storage_resources.flash);
    let store: FlashStore<BlockingAsyncFlash> =
        FlashStore::new(BlockingAsync::new(flash), STORAGE_RANGE);

    let mut scale_manager = ScaleManager::new(
        store,
        SignalPresenter::new(&DISPLAY_SIGNAL),
        QueuedInput::new(INPUT_EVENT_CHANNEL.receiver()),
        RAW_READING_CHANNEL.receiver(),
    );
    scale_manager.run().await;
}
