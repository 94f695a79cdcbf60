use embassy_time::{Duration, Instant};

/// Discrete user input as delivered to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Signed number of detents turned since the previous event.
    Rotate(i32),
    Click,
    DoubleClick,
    HoldStart,
    Release,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// Lazy source of input events. Returns `None` once nothing is pending.
pub trait InputSource {
    fn poll(&mut self) -> Option<InputEvent>;
}

impl<I> InputSource for I
where
    I: Iterator<Item = InputEvent>,
{
    fn poll(&mut self) -> Option<InputEvent> {
        self.next()
    }
}

/// Running encoder counter. Only a change since the last update moves anything, and it
/// moves by one step whatever the magnitude.
#[derive(Debug, Default)]
pub struct RotaryAccumulator {
    value: i32,
    last: i32,
}

impl RotaryAccumulator {
    pub const fn new() -> Self {
        Self { value: 0, last: 0 }
    }

    pub fn update(&mut self, delta: i32) -> Option<Direction> {
        self.value = self.value.wrapping_add(delta);
        let change = self.value.wrapping_sub(self.last);
        self.last = self.value;

        match change {
            0 => None,
            c if c > 0 => Some(Direction::Clockwise),
            _ => Some(Direction::CounterClockwise),
        }
    }
}

/// Press length after which a press becomes a hold.
pub const HOLD_TIME: Duration = Duration::from_millis(1200);
/// Second press must start within this long of the first release to count as a double click.
pub const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    Pressed { since: Instant },
    Held,
    /// Released after the hold time but before a service call reported the hold.
    HeldReleased,
    Released { at: Instant },
    PressedAgain,
}

/// Turns debounced button edges into clicks, double clicks and holds.
///
/// A single click is only reported once the double click window has closed, so
/// [`ButtonGestures::service`] has to be called periodically.
pub struct ButtonGestures {
    state: GestureState,
    hold_time: Duration,
    double_click_time: Duration,
}

impl ButtonGestures {
    pub const fn new() -> Self {
        Self::with_timing(HOLD_TIME, DOUBLE_CLICK_TIME)
    }

    pub const fn with_timing(hold_time: Duration, double_click_time: Duration) -> Self {
        Self {
            state: GestureState::Idle,
            hold_time,
            double_click_time,
        }
    }

    /// Feed a debounced edge of the push button.
    pub fn button_changed(&mut self, pressed: bool, now: Instant) -> Option<InputEvent> {
        let (next, event) = match (self.state, pressed) {
            (GestureState::Idle, true) => (GestureState::Pressed { since: now }, None),
            (GestureState::Pressed { since }, false) => {
                if now.saturating_duration_since(since) >= self.hold_time {
                    (GestureState::HeldReleased, Some(InputEvent::HoldStart))
                } else {
                    (GestureState::Released { at: now }, None)
                }
            }
            (GestureState::Held, false) => (GestureState::Idle, Some(InputEvent::Release)),
            (GestureState::HeldReleased, true) => {
                (GestureState::Pressed { since: now }, Some(InputEvent::Release))
            }
            (GestureState::Released { at }, true) => {
                if now.saturating_duration_since(at) <= self.double_click_time {
                    (GestureState::PressedAgain, None)
                } else {
                    // window expired without a service call, the first press was a click
                    (GestureState::Pressed { since: now }, Some(InputEvent::Click))
                }
            }
            (GestureState::PressedAgain, false) => {
                (GestureState::Idle, Some(InputEvent::DoubleClick))
            }
            (state, _) => (state, None),
        };
        self.state = next;
        event
    }

    /// Advance the timers. Reports holds and single clicks whose window has closed.
    pub fn service(&mut self, now: Instant) -> Option<InputEvent> {
        match self.state {
            GestureState::Pressed { since }
                if now.saturating_duration_since(since) >= self.hold_time =>
            {
                self.state = GestureState::Held;
                Some(InputEvent::HoldStart)
            }
            GestureState::HeldReleased => {
                self.state = GestureState::Idle;
                Some(InputEvent::Release)
            }
            GestureState::Released { at }
                if now.saturating_duration_since(at) > self.double_click_time =>
            {
                self.state = GestureState::Idle;
                Some(InputEvent::Click)
            }
            _ => None,
        }
    }
}

impl Default for ButtonGestures {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn accumulator_reports_sign_not_magnitude() {
        let mut acc = RotaryAccumulator::new();
        assert_eq!(acc.update(3), Some(Direction::Clockwise));
        assert_eq!(acc.update(-7), Some(Direction::CounterClockwise));
        assert_eq!(acc.update(0), None);
        assert_eq!(acc.update(1), Some(Direction::Clockwise));
    }

    #[test]
    fn accumulator_survives_counter_wrap() {
        let mut acc = RotaryAccumulator::new();
        acc.update(i32::MAX);
        assert_eq!(acc.update(1), Some(Direction::Clockwise));
    }

    #[test]
    fn single_click_reported_after_double_click_window() {
        let mut gestures = ButtonGestures::new();
        assert_eq!(gestures.button_changed(true, at(0)), None);
        assert_eq!(gestures.button_changed(false, at(80)), None);
        assert_eq!(gestures.service(at(500)), None);
        assert_eq!(gestures.service(at(681)), Some(InputEvent::Click));
        assert_eq!(gestures.service(at(2000)), None);
    }

    #[test]
    fn two_quick_presses_are_a_double_click() {
        let mut gestures = ButtonGestures::new();
        gestures.button_changed(true, at(0));
        gestures.button_changed(false, at(80));
        assert_eq!(gestures.button_changed(true, at(300)), None);
        assert_eq!(
            gestures.button_changed(false, at(380)),
            Some(InputEvent::DoubleClick)
        );
        assert_eq!(gestures.service(at(2000)), None);
    }

    #[test]
    fn long_press_holds_once_then_releases() {
        let mut gestures = ButtonGestures::new();
        gestures.button_changed(true, at(0));
        assert_eq!(gestures.service(at(1000)), None);
        assert_eq!(gestures.service(at(1200)), Some(InputEvent::HoldStart));
        assert_eq!(gestures.service(at(3000)), None);
        assert_eq!(
            gestures.button_changed(false, at(3100)),
            Some(InputEvent::Release)
        );
    }

    #[test]
    fn hold_released_between_service_calls_still_holds() {
        let mut gestures = ButtonGestures::new();
        gestures.button_changed(true, at(0));
        assert_eq!(gestures.service(at(1180)), None);
        assert_eq!(
            gestures.button_changed(false, at(1210)),
            Some(InputEvent::HoldStart)
        );
        assert_eq!(gestures.service(at(1220)), Some(InputEvent::Release));
        assert_eq!(gestures.service(at(2000)), None);
    }

    #[test]
    fn new_press_flushes_pending_release() {
        let mut gestures = ButtonGestures::new();
        gestures.button_changed(true, at(0));
        assert_eq!(
            gestures.button_changed(false, at(1300)),
            Some(InputEvent::HoldStart)
        );
        assert_eq!(
            gestures.button_changed(true, at(1310)),
            Some(InputEvent::Release)
        );
        gestures.button_changed(false, at(1400));
        assert_eq!(gestures.service(at(2100)), Some(InputEvent::Click));
    }

    #[test]
    fn late_second_press_without_service_yields_click_first() {
        let mut gestures = ButtonGestures::new();
        gestures.button_changed(true, at(0));
        gestures.button_changed(false, at(50));
        assert_eq!(
            gestures.button_changed(true, at(1000)),
            Some(InputEvent::Click)
        );
        gestures.button_changed(false, at(1050));
        assert_eq!(gestures.service(at(1700)), Some(InputEvent::Click));
    }

    #[test]
    fn iterator_is_an_input_source() {
        let mut source = [InputEvent::Click, InputEvent::Rotate(1)].into_iter();
        assert_eq!(source.poll(), Some(InputEvent::Click));
        assert_eq!(source.poll(), Some(InputEvent::Rotate(1)));
        assert_eq!(source.poll(), None);
    }
}
