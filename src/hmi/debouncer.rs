use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Level};
use embassy_time::{Duration, Timer};

/// GPIO input that only reports a level once it has held still for `debounce_time`.
pub struct Debouncer<'a> {
    input: Input<'a>,
    debounce_time: Duration,
}

impl<'a> Debouncer<'a> {
    pub fn new(input: Input<'a>, debounce: Duration) -> Self {
        Self {
            input,
            debounce_time: debounce,
        }
    }

    /// Wait until the input has been quiet for the debounce time and return its level.
    pub async fn debounce(&mut self) -> Level {
        loop {
            let io_changed = select(
                self.input.wait_for_any_edge(),
                Timer::after(self.debounce_time),
            )
            .await;

            match io_changed {
                // still bouncing
                Either::First(_) => continue,
                Either::Second(_) => break self.input.get_level(),
            }
        }
    }

    pub async fn wait_for_edge(&mut self) {
        self.input.wait_for_any_edge().await;
    }

    /// Raw level, no settling.
    pub fn level(&self) -> Level {
        self.input.get_level()
    }

    /// Wait for a settled transition to `target_level`. Cancel safe, a level already
    /// reached is picked up on the next call.
    pub async fn wait_for_change_to(&mut self, target_level: Level) {
        loop {
            if self.input.get_level() != target_level {
                match target_level {
                    Level::High => self.input.wait_for_high().await,
                    Level::Low => self.input.wait_for_low().await,
                }
            }

            if self.debounce().await == target_level {
                break;
            }
        }
    }
}
