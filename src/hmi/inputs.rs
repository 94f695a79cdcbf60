use crate::hmi::debouncer::Debouncer;
use crate::hmi::event_channels::InputEventSender;
use crate::hmi::rotary_encoder::RotaryEncoder;
use benchscale_core::input::ButtonGestures;
use benchscale_core::{Direction, InputEvent};
use defmt::{trace, warn};
use embassy_futures::select::{select3, Either3};
use embassy_rp::gpio::Level;
use embassy_time::{Duration, Instant, Ticker};

/// How often pending clicks and holds are checked for expiry. Must stay longer than the
/// button debounce time, every tick restarts a debounce in progress.
const GESTURE_SERVICE_PERIOD: Duration = Duration::from_millis(40);

/// Turns knob detents and button edges into [`InputEvent`]s. The button is active low.
pub async fn hmi_input_handler(
    input_events: InputEventSender<'static>,
    mut debounced_btn: Debouncer<'_>,
    rotary_encoder: &mut RotaryEncoder<'_>,
) -> ! {
    let mut gestures = ButtonGestures::new();
    let mut service_ticker = Ticker::every(GESTURE_SERVICE_PERIOD);
    let mut next_btn_level = Level::Low;

    loop {
        let hmi_io_event = select3(
            rotary_encoder.next_detent(),
            debounced_btn.wait_for_change_to(next_btn_level),
            service_ticker.next(),
        )
        .await;

        let event = match hmi_io_event {
            Either3::First(direction) => Some(InputEvent::Rotate(match direction {
                Direction::Clockwise => 1,
                Direction::CounterClockwise => -1,
            })),
            Either3::Second(_) => {
                let pressed = next_btn_level == Level::Low;
                next_btn_level = match next_btn_level {
                    Level::High => Level::Low,
                    Level::Low => Level::High,
                };
                trace!("Button pressed {}", pressed);
                gestures.button_changed(pressed, Instant::now())
            }
            Either3::Third(_) => gestures.service(Instant::now()),
        };

        if let Some(event) = event {
            if input_events.try_send(event).is_err() {
                warn!("Input queue full, dropped {:?}", event);
            }
        }
    }
}
