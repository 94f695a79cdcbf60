#![allow(dead_code)]

use benchscale_core::load_cell::LoadCell;
use benchscale_core::presenter::{MenuView, Presenter};
use benchscale_core::storage::{RamStore, StorageKey};
use benchscale_core::{InputEvent, ScaleConfig, ScaleController, WeightReading};
use embassy_time::{Duration, Instant};
use std::ops::Range;

/// Raw counts with nothing on the scale.
pub const ZERO_COUNTS: i32 = 120_000;
pub const COUNTS_PER_POUND: f32 = 1_000.0;
/// The simulated HX711 delivers one conversion every this many milliseconds.
pub const SAMPLE_PERIOD_MS: u64 = 100;
pub const TICK_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Weight {
        reading: WeightReading,
        warning: Option<String>,
    },
    Menu {
        title: &'static str,
        cursor: usize,
        window: Range<usize>,
        rows: Vec<(String, Option<f32>)>,
    },
    Message {
        text: String,
        dwell: Duration,
    },
}

#[derive(Default)]
pub struct Recorder {
    pub screens: Vec<Screen>,
}

impl Presenter for Recorder {
    fn render_weight_screen(&mut self, reading: WeightReading, warning: Option<&str>) {
        self.screens.push(Screen::Weight {
            reading,
            warning: warning.map(String::from),
        });
    }

    fn render_menu(&mut self, menu: &MenuView<'_>) {
        self.screens.push(Screen::Menu {
            title: menu.level.title,
            cursor: menu.cursor,
            window: menu.window.clone(),
            rows: menu
                .rows()
                .map(|(_, label, value)| (label.to_string(), value))
                .collect(),
        });
    }

    fn render_message(&mut self, text: &str, dwell: Duration) {
        self.screens.push(Screen::Message {
            text: text.to_string(),
            dwell,
        });
    }
}

pub type Scale = ScaleController<LoadCell<4>, RamStore, Recorder>;

/// A scale on the bench: controller, simulated load cell and a clock.
pub struct Bench {
    pub scale: Scale,
    pub now: Instant,
    /// Counts the simulated ADC reports.
    pub raw: i32,
    /// Set to false to unplug the load cell.
    pub feeding: bool,
}

impl Bench {
    pub fn with_store(store: RamStore) -> Self {
        let now = Instant::from_millis(0);
        let scale = ScaleController::new(
            ScaleConfig::default(),
            LoadCell::new(1.0),
            store,
            Recorder::default(),
            now,
        );
        Self {
            scale,
            now,
            raw: ZERO_COUNTS,
            feeding: true,
        }
    }

    /// Scale calibrated to [`COUNTS_PER_POUND`], past the splash and tared.
    pub fn booted() -> Self {
        let mut store = RamStore::new();
        store
            .insert_raw(StorageKey::CALIBRATION_CONSTANT, COUNTS_PER_POUND)
            .unwrap();
        Self::booted_with(store)
    }

    pub fn booted_with(store: RamStore) -> Self {
        let mut bench = Self::with_store(store);
        bench.advance(1500);
        bench
    }

    /// Put `pounds` on the scale, relative to the boot time tare.
    pub fn load(&mut self, pounds: f32) {
        self.raw = ZERO_COUNTS + (pounds * COUNTS_PER_POUND) as i32;
    }

    pub fn advance(&mut self, ms: u64) {
        for _ in 0..ms / TICK_MS {
            self.now += Duration::from_millis(TICK_MS);
            if self.feeding && self.now.as_millis() % SAMPLE_PERIOD_MS == 0 {
                self.scale.measurement_mut().push_raw(self.raw);
            }
            self.scale.tick(&mut core::iter::empty::<InputEvent>(), self.now);
        }
    }

    pub fn input(&mut self, events: &[InputEvent]) {
        let mut source = events.iter().copied();
        self.scale.tick(&mut source, self.now);
    }

    pub fn click(&mut self) {
        self.input(&[InputEvent::Click]);
    }

    pub fn double_click(&mut self) {
        self.input(&[InputEvent::DoubleClick]);
    }

    /// Turn the knob `detents` times, one event each.
    pub fn turn(&mut self, detents: i32) {
        let step = detents.signum();
        for _ in 0..detents.abs() {
            self.input(&[InputEvent::Rotate(step)]);
        }
    }

    pub fn last_screen(&mut self) -> Screen {
        self.scale
            .presenter_mut()
            .screens
            .last()
            .cloned()
            .expect("nothing rendered yet")
    }

    pub fn last_message(&mut self) -> String {
        match self.last_screen() {
            Screen::Message { text, .. } => text,
            other => panic!("expected a message, got {:?}", other),
        }
    }

    pub fn stored(&mut self, key: StorageKey) -> Option<f32> {
        use benchscale_core::PersistentStore;
        self.scale.store_mut().get(key).unwrap()
    }

    /// From the weight screen into the main menu and down to item `main_item`.
    pub fn open_main_item(&mut self, main_item: i32) {
        self.click();
        self.turn(main_item);
        self.click();
    }
}
