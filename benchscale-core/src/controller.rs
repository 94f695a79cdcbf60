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

//! The scale's single event loop.
//!
//! Every [`ScaleController::tick`] runs the same sequence: drain pending input and run
//! whatever it triggers, advance timers of the active prompt, consume a weight sample,
//! refresh the display. Prompts that used to block are modes of the controller, so the
//! weight keeps being sampled while one of them is up.

use crate::calibration::{
    CalibrationRun, CalibrationSession, CalibrationState, EditTarget, Prompt, RunOutcome,
};
use crate::config::ScaleConfig;
use crate::error::{ConfigError, Flow, ScaleError};
use crate::input::{Direction, InputEvent, InputSource, RotaryAccumulator};
use crate::measurement::{MeasurementSource, TareMode, WeightReading};
use crate::memory::MemoryBank;
use crate::menu::{tree, Activation, Gesture, MenuAction, Navigator, UnwindCursor};
use crate::presenter::{MenuView, Presenter};
use crate::storage::{load_value, PersistentStore, StorageKey};
use core::fmt::Write;
use embassy_time::{Duration, Instant};
use heapless::String;

/// Dwell handed to the presenter for prompts that stay up until the user answers.
const UNTIL_ANSWERED: Duration = Duration::from_ticks(0);

type MessageText = String<64>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum AfterMessage {
    Unwind { levels: u8, cursor: UnwindCursor },
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Browsing,
    ConfirmStore {
        slot: u8,
        unwind: u8,
        deadline: Instant,
    },
    Editing {
        session: CalibrationSession,
        unwind: u8,
        deadline: Instant,
    },
    Calibrating {
        run: CalibrationRun,
        unwind: u8,
    },
    Message {
        until: Instant,
        then: AfterMessage,
    },
}

pub struct ScaleController<M, S, P> {
    config: ScaleConfig,
    measurement: M,
    store: S,
    presenter: P,
    navigator: Navigator,
    memory: MemoryBank,
    calibration: CalibrationState,
    rotary: RotaryAccumulator,
    mode: Mode,
    reading: WeightReading,
    last_displayed_pounds: Option<f32>,
    next_read: Instant,
    next_refresh: Instant,
    last_sample_at: Instant,
    warning: Option<&'static str>,
    last_error: Option<ScaleError>,
}

impl<M, S, P> ScaleController<M, S, P>
where
    M: MeasurementSource,
    S: PersistentStore,
    P: Presenter,
{
    /// Load persisted state, prime the load cell and show the splash screen.
    ///
    /// Unusable stored values fall back to defaults and are reported through
    /// [`ScaleController::last_error`], they are never fatal.
    pub fn new(
        config: ScaleConfig,
        mut measurement: M,
        mut store: S,
        mut presenter: P,
        now: Instant,
    ) -> Self {
        let mut last_error = None;

        let constant = match load_value(&mut store, StorageKey::CALIBRATION_CONSTANT) {
            Ok(Some(c)) if c != 0.0 => c,
            Ok(Some(_)) => {
                let e = ConfigError::OutOfRange(StorageKey::CALIBRATION_CONSTANT);
                last_error = Some(e.into());
                config.default_calibration_constant
            }
            Ok(None) => {
                info!("No stored calibration constant, using default");
                config.default_calibration_constant
            }
            Err(e) => {
                last_error = Some(e.into());
                config.default_calibration_constant
            }
        };
        if let Some(e) = last_error {
            warn!("Calibration constant unusable: {:?}", e);
        }

        let (memory, memory_error) = MemoryBank::load(&mut store);
        if let Some(e) = memory_error {
            last_error = Some(e.into());
        }

        measurement.set_calibration_factor(constant);
        measurement.tare(TareMode::Deferred);
        presenter.render_message(Prompt::Startup.text(), config.startup_dwell);
        debug!("Scale started, calibration constant {}", constant);

        Self {
            config,
            measurement,
            store,
            presenter,
            navigator: Navigator::new(&tree::ROOT),
            memory,
            calibration: CalibrationState::new(&config, constant),
            rotary: RotaryAccumulator::new(),
            mode: Mode::Message {
                until: now + config.startup_dwell,
                then: AfterMessage::Nothing,
            },
            reading: WeightReading::default(),
            last_displayed_pounds: None,
            next_read: now,
            next_refresh: now,
            last_sample_at: now,
            warning: None,
            last_error,
        }
    }

    pub fn tick<I: InputSource>(&mut self, input: &mut I, now: Instant) {
        while let Some(event) = input.poll() {
            self.handle_event(event, now);
        }
        self.service_timers(now);
        self.update_measurement(now);
        self.refresh_display(now);
    }

    pub fn handle_event(&mut self, event: InputEvent, now: Instant) {
        if event == InputEvent::Release {
            self.navigator.release();
        }
        // only a change of the running count turns into a step
        let direction = match event {
            InputEvent::Rotate(delta) => match self.rotary.update(delta) {
                Some(direction) => Some(direction),
                None => return,
            },
            _ => None,
        };

        match self.mode {
            Mode::Browsing => self.browse(event, direction, now),
            Mode::ConfirmStore { slot, unwind, .. } => match event {
                InputEvent::DoubleClick => {
                    let pounds = self.reading.pounds;
                    let result = self.memory.store(&mut self.store, slot as usize, pounds);
                    self.record(result);
                    info!("Stored {} in M{}", pounds, slot);
                    self.confirm(Prompt::Stored, unwind, now);
                }
                InputEvent::Click => {
                    debug!("Store to M{} aborted", slot);
                    self.confirm(Prompt::StoreAborted, unwind, now);
                }
                _ => {}
            },
            Mode::Editing { mut session, unwind, .. } => match (event, direction) {
                (_, Some(direction)) => {
                    session.rotate(direction);
                    self.mode = Mode::Editing {
                        session,
                        unwind,
                        deadline: now + self.config.input_timeout,
                    };
                    self.render_session(&session);
                }
                (InputEvent::Click, _) => self.commit_session(session, unwind, now),
                (InputEvent::DoubleClick, _) => {
                    debug!("Edit of {:?} cancelled", session.target());
                    self.end_prompt(unwind);
                }
                _ => {}
            },
            Mode::Calibrating { mut run, unwind } => {
                let outcome = match event {
                    InputEvent::Click => run.click(&mut self.measurement, now, &self.config),
                    InputEvent::DoubleClick => run.cancel(&mut self.measurement),
                    _ => return,
                };
                self.mode = Mode::Calibrating { run, unwind };
                self.calibration_progress(outcome, unwind, now);
            }
            // input is dropped while a message is up
            Mode::Message { .. } => {}
        }
    }

    fn browse(&mut self, event: InputEvent, direction: Option<Direction>, now: Instant) {
        let activated = match (event, direction) {
            (_, Some(direction)) => {
                self.navigator.rotate(direction);
                return;
            }
            (InputEvent::Click, _) => self.navigator.activate(Gesture::Click),
            (InputEvent::HoldStart, _) => self.navigator.activate(Gesture::Hold),
            (InputEvent::DoubleClick, _) => {
                self.navigator.back();
                return;
            }
            _ => return,
        };

        match activated {
            Ok(Some(activation)) => self.dispatch(activation, now),
            Ok(None) => {}
            Err(e) => self.report(e.into()),
        }
    }

    fn dispatch(&mut self, activation: Activation, now: Instant) {
        info!("'{}' -> {:?}", activation.label, activation.action);
        let config = self.config;

        match activation.action {
            MenuAction::NoOp | MenuAction::Navigate => {}
            MenuAction::MemoryStore { slot, unwind } => {
                self.mode = Mode::ConfirmStore {
                    slot,
                    unwind,
                    deadline: now + config.input_timeout,
                };
                self.presenter
                    .render_message(Prompt::ConfirmStore.text(), UNTIL_ANSWERED);
            }
            MenuAction::MemoryClear { slot, unwind } => {
                let result = self.memory.clear(&mut self.store, slot as usize);
                self.record(result);
                self.navigator.unwind(unwind, UnwindCursor::Restore);
            }
            MenuAction::ClearAllMemory { unwind } => {
                let result = self.memory.clear_all(&mut self.store);
                self.record(result);
                self.confirm(Prompt::ClearingMemory, unwind, now);
            }
            MenuAction::Rezero { unwind } => {
                self.measurement.tare(TareMode::Deferred);
                self.show(
                    Prompt::Zeroing.text(),
                    config.message_dwell,
                    now,
                    AfterMessage::Unwind {
                        levels: unwind,
                        cursor: UnwindCursor::Reset,
                    },
                );
            }
            MenuAction::EnterRef { unwind } => {
                let current = self.calibration.reference_weight;
                let session = CalibrationSession::reference_weight(current, &config);
                self.start_session(session, unwind, now);
            }
            MenuAction::EditCal { unwind } => {
                let current = self.calibration.constant;
                let session = CalibrationSession::calibration_constant(current, &config);
                self.start_session(session, unwind, now);
            }
            MenuAction::RunCalibration { unwind } => {
                let previous = self.measurement.calibration_factor();
                let run = CalibrationRun::start(previous, now, &config);
                self.mode = Mode::Calibrating { run, unwind };
                self.presenter
                    .render_message(Prompt::ClearScale.text(), UNTIL_ANSWERED);
            }
            MenuAction::SaveCal { unwind } => {
                let constant = self.calibration.constant;
                let key = StorageKey::CALIBRATION_CONSTANT;
                match self.store.put(key, constant) {
                    Ok(()) => info!("Calibration constant {} saved", constant),
                    Err(_) => self.report(ScaleError::StorageWrite(key)),
                }
                let text = Self::with_value(Prompt::Saving, constant, Some("to EEPROM"));
                self.show(&text, config.result_dwell, now, Self::unwind_to_item(unwind));
            }
        }
    }

    fn start_session(&mut self, session: CalibrationSession, unwind: u8, now: Instant) {
        self.mode = Mode::Editing {
            session,
            unwind,
            deadline: now + self.config.input_timeout,
        };
        self.render_session(&session);
    }

    fn render_session(&mut self, session: &CalibrationSession) {
        let unit = match session.target() {
            EditTarget::ReferenceWeight => Some("lbs"),
            EditTarget::CalibrationConstant => None,
        };
        let mut text = Self::with_value(session.target().prompt(), session.value(), None);
        if let Some(unit) = unit {
            let _ = write!(text, " {}", unit);
        }
        self.presenter.render_message(&text, UNTIL_ANSWERED);
    }

    fn commit_session(&mut self, session: CalibrationSession, unwind: u8, now: Instant) {
        match (session.target(), session.commit()) {
            (EditTarget::ReferenceWeight, Ok(value)) => {
                debug!("Reference weight {}", value);
                self.calibration.reference_weight = value;
            }
            (EditTarget::CalibrationConstant, Ok(value)) => {
                debug!("Calibration constant {}", value);
                self.calibration.constant = value;
                self.measurement.set_calibration_factor(value);
            }
            (_, Err(e)) => {
                self.report(e.into());
                self.confirm(Prompt::ZeroConstant, unwind, now);
                return;
            }
        }
        self.end_prompt(unwind);
    }

    fn end_prompt(&mut self, unwind: u8) {
        self.mode = Mode::Browsing;
        self.navigator.unwind(unwind, UnwindCursor::Restore);
    }

    fn calibration_progress(&mut self, outcome: RunOutcome, unwind: u8, now: Instant) {
        let after = Self::unwind_to_item(unwind);
        match outcome {
            RunOutcome::Continue(Some(prompt)) => {
                self.presenter.render_message(prompt.text(), UNTIL_ANSWERED);
            }
            RunOutcome::Continue(None) => {}
            RunOutcome::Finished(constant) => {
                self.calibration.constant = constant;
                let text = Self::with_value(Prompt::NewConstant, constant, None);
                let dwell = self.config.result_dwell;
                self.show(&text, dwell, now, after);
            }
            RunOutcome::Failed(e) => {
                self.report(e);
                let dwell = self.config.result_dwell;
                self.show(Prompt::CalibrationFailed.text(), dwell, now, after);
            }
            RunOutcome::Cancelled => {
                self.confirm(Prompt::CalibrationCancelled, unwind, now);
            }
        }
    }

    fn service_timers(&mut self, now: Instant) {
        match self.mode {
            Mode::Browsing => {}
            Mode::Message { until, then } if now >= until => {
                self.mode = Mode::Browsing;
                match then {
                    AfterMessage::Unwind { levels, cursor } => {
                        self.navigator.unwind(levels, cursor)
                    }
                    AfterMessage::Nothing => self.navigator.request_redraw(),
                }
                self.last_displayed_pounds = None;
                self.next_refresh = now;
            }
            Mode::Message { .. } => {}
            Mode::ConfirmStore { unwind, deadline, .. } if now >= deadline => {
                self.report(ScaleError::InputTimeout(Flow::MemoryStore));
                self.confirm(Prompt::StoreAborted, unwind, now);
            }
            Mode::ConfirmStore { .. } => {}
            Mode::Editing { session, unwind, deadline } if now >= deadline => {
                self.report(ScaleError::InputTimeout(session.target().flow()));
                self.end_prompt(unwind);
            }
            Mode::Editing { .. } => {}
            Mode::Calibrating { mut run, unwind } => {
                let outcome = run.poll(
                    &mut self.measurement,
                    self.calibration.reference_weight,
                    now,
                    &self.config,
                );
                self.mode = Mode::Calibrating { run, unwind };
                self.calibration_progress(outcome, unwind, now);
            }
        }
    }

    fn update_measurement(&mut self, now: Instant) {
        if now >= self.next_read {
            self.next_read = now + self.config.read_interval;
            if let Some(pounds) = self.measurement.sample() {
                self.reading = WeightReading::from_pounds(pounds);
                self.last_sample_at = now;
                if self.warning.take().is_some() {
                    info!("Load cell data back");
                    self.navigator.request_redraw();
                }
            }
        }

        let silent_for = now.saturating_duration_since(self.last_sample_at);
        if self.warning.is_none() && silent_for > self.config.measurement_stale_after {
            warn!("No load cell data for {} ms", silent_for.as_millis());
            self.warning = Some(Prompt::NoSensorData.text());
            self.last_error = Some(ScaleError::MeasurementUnavailable);
            self.navigator.request_redraw();
        }
    }

    fn refresh_display(&mut self, now: Instant) {
        if self.mode != Mode::Browsing {
            return;
        }

        if self.navigator.depth() == 0 {
            if now < self.next_refresh {
                return;
            }
            self.next_refresh = now + self.config.display_refresh;

            let pounds = self.reading.pounds;
            let moved = self.last_displayed_pounds.map_or(true, |last| {
                (pounds - last).abs() > self.config.weight_change_threshold
            });
            if moved || self.navigator.needs_redraw() {
                self.presenter.render_weight_screen(self.reading, self.warning);
                self.last_displayed_pounds = Some(pounds);
                self.navigator.redraw_done();
            }
        } else if self.navigator.needs_redraw() {
            self.navigator.clamp_cursor();
            if let Some(level) = self.navigator.current_level() {
                let view = MenuView {
                    level,
                    cursor: self.navigator.cursor(),
                    window: self.navigator.visible_window(),
                    values: level.is_memory().then(|| &self.memory.values()[..]),
                };
                self.presenter.render_menu(&view);
            }
            self.navigator.redraw_done();
        }
    }

    fn show(&mut self, text: &str, dwell: Duration, now: Instant, then: AfterMessage) {
        self.presenter.render_message(text, dwell);
        self.mode = Mode::Message {
            until: now + dwell,
            then,
        };
    }

    /// Short confirmation, then back to the item that started the action.
    fn confirm(&mut self, prompt: Prompt, unwind: u8, now: Instant) {
        let dwell = self.config.message_dwell;
        self.show(prompt.text(), dwell, now, Self::unwind_to_item(unwind));
    }

    fn unwind_to_item(levels: u8) -> AfterMessage {
        AfterMessage::Unwind {
            levels,
            cursor: UnwindCursor::Restore,
        }
    }

    fn with_value(prompt: Prompt, value: f32, trailer: Option<&str>) -> MessageText {
        let mut text = MessageText::new();
        let _ = write!(text, "{}\n{:.2}", prompt.text(), value);
        if let Some(trailer) = trailer {
            let _ = write!(text, "\n{}", trailer);
        }
        text
    }

    fn record<T>(&mut self, result: Result<T, ScaleError>) {
        if let Err(e) = result {
            self.report(e);
        }
    }

    fn report(&mut self, error: ScaleError) {
        warn!("{:?}", error);
        self.last_error = Some(error);
    }

    pub fn depth(&self) -> usize {
        self.navigator.depth()
    }

    pub fn cursor(&self) -> usize {
        self.navigator.cursor()
    }

    pub fn memory(&self) -> &MemoryBank {
        &self.memory
    }

    pub fn reading(&self) -> WeightReading {
        self.reading
    }

    pub fn calibration_constant(&self) -> f32 {
        self.calibration.constant
    }

    pub fn reference_weight(&self) -> f32 {
        self.calibration.reference_weight
    }

    pub fn last_error(&self) -> Option<ScaleError> {
        self.last_error
    }

    pub fn measurement_mut(&mut self) -> &mut M {
        &mut self.measurement
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }
}
