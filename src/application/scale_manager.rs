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

use crate::hmi::display::SignalPresenter;
use crate::hmi::event_channels::QueuedInput;
use crate::weight::event_channels::RawReadingReceiver;
use benchscale_core::load_cell::LoadCell;
use benchscale_core::{PersistentStore, ScaleConfig, ScaleController};
use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Ticker};

/// Upper bound on input latency and on timer jitter in the controller.
const CONTROL_PERIOD: Duration = Duration::from_millis(10);

/// Owns the controller and feeds it: raw readings as they arrive, queued input and the
/// clock every [`CONTROL_PERIOD`].
pub struct ScaleManager<S>
where
    S: PersistentStore,
{
    controller: ScaleController<LoadCell, S, SignalPresenter>,
    input: QueuedInput<'static>,
    readings: RawReadingReceiver<'static>,
}

impl<S> ScaleManager<S>
where
    S: PersistentStore,
{
    pub fn new(
        store: S,
        presenter: SignalPresenter,
        input: QueuedInput<'static>,
        readings: RawReadingReceiver<'static>,
    ) -> Self {
        let config = ScaleConfig::default();
        let controller: ScaleController<LoadCell, S, SignalPresenter> = ScaleController::new(
            config,
            LoadCell::new(config.default_calibration_constant),
            store,
            presenter,
            Instant::now(),
        );
        if let Some(e) = controller.last_error() {
            warn!("Started with defaults after storage problem: {:?}", e);
        }
        info!(
            "Scale manager running, calibration constant {}",
            controller.calibration_constant()
        );

        Self {
            controller,
            input,
            readings,
        }
    }

    pub async fn run(&mut self) -> ! {
        let mut control_ticker = Ticker::every(CONTROL_PERIOD);
        loop {
            match select(self.readings.receive(), control_ticker.next()).await {
                Either::First(raw) => self.controller.measurement_mut().push_raw(raw),
                Either::Second(_) => {}
            }
            while let Ok(raw) = self.readings.try_receive() {
                self.controller.measurement_mut().push_raw(raw);
            }

            self.controller.tick(&mut self.input, Instant::now());
        }
    }
}
