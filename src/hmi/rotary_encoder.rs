use crate::hmi::debouncer::Debouncer;
use benchscale_core::Direction;
use embassy_futures::select::select;
use embassy_rp::gpio::{Input, Level};
use embassy_time::Duration;

const PIN_DEBOUNCE: Duration = Duration::from_micros(500);
/// Quadrature transitions between two detents of the knob.
const TRANSITIONS_PER_DETENT: i8 = 4;

/// Decode a 4 bit `old_dt old_clk new_dt new_clk` (low bits new) quadrature transition.
fn decode(transition: u8) -> Option<Direction> {
    match transition {
        0b0001 | 0b0111 | 0b1000 | 0b1110 => Some(Direction::Clockwise),
        0b0010 | 0b0100 | 0b1011 | 0b1101 => Some(Direction::CounterClockwise),
        _ => None,
    }
}

pub struct RotaryEncoder<'a> {
    debounced_dt: Debouncer<'a>,
    debounced_clk: Debouncer<'a>,
    last_state: u8,
    transitions: i8,
}

impl<'a> RotaryEncoder<'a> {
    pub fn new(pin_dt: Input<'a>, pin_clk: Input<'a>) -> Self {
        let mut encoder = Self {
            debounced_dt: Debouncer::new(pin_dt, PIN_DEBOUNCE),
            debounced_clk: Debouncer::new(pin_clk, PIN_DEBOUNCE),
            last_state: 0,
            transitions: 0,
        };
        encoder.last_state = encoder.raw_state();
        encoder
    }

    fn raw_state(&self) -> u8 {
        let mut s = 0u8;
        if self.debounced_dt.level() == Level::High {
            s |= 0b01;
        }
        if self.debounced_clk.level() == Level::High {
            s |= 0b10;
        }
        s
    }

    /// Wait for the next settled change on either line and decode it.
    pub async fn state_change(&mut self) -> Option<Direction> {
        if self.raw_state() == self.last_state {
            select(
                self.debounced_dt.wait_for_edge(),
                self.debounced_clk.wait_for_edge(),
            )
            .await;
        }
        self.debounced_dt.debounce().await;
        self.debounced_clk.debounce().await;

        let state = self.raw_state();
        let transition = (self.last_state << 2) | state;
        self.last_state = state;
        decode(transition)
    }

    /// Wait for a full detent. Cancel safe, partial turns are kept for the next call.
    pub async fn next_detent(&mut self) -> Direction {
        loop {
            match self.state_change().await {
                Some(Direction::Clockwise) => self.transitions += 1,
                Some(Direction::CounterClockwise) => self.transitions -= 1,
                None => {}
            }

            if self.transitions >= TRANSITIONS_PER_DETENT {
                self.transitions = 0;
                return Direction::Clockwise;
            }
            if self.transitions <= -TRANSITIONS_PER_DETENT {
                self.transitions = 0;
                return Direction::CounterClockwise;
            }
        }
    }
}
