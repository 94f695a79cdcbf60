use benchscale_core::menu::WINDOW_ROWS;
use benchscale_core::presenter::{MenuView, Presenter};
use benchscale_core::WeightReading;
use core::fmt::Write;
use defmt::{debug, error, trace};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::Point;
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_graphics::Drawable;
use heapless::{String, Vec};
use sh1106::mode::GraphicsMode;

const MESSAGE_CAPACITY: usize = 64;
const LABEL_CAPACITY: usize = 24;

const DEFAULT_TEXT_STYLE: MonoTextStyle<BinaryColor> = MonoTextStyleBuilder::new()
    .font(&FONT_6X10)
    .text_color(BinaryColor::On)
    .build();

const WEIGHT_TEXT_STYLE: MonoTextStyle<BinaryColor> = MonoTextStyleBuilder::new()
    .font(&FONT_10X20)
    .text_color(BinaryColor::On)
    .build();

/// One row of a menu screen.
#[derive(Debug, Clone)]
pub struct MenuRow {
    pub label: &'static str,
    pub value: Option<f32>,
    pub selected: bool,
}

/// A full screen worth of content, owned so it can cross to the display core.
#[derive(Debug, Clone)]
pub enum DisplayCommand {
    Weight {
        reading: WeightReading,
        warning: Option<String<LABEL_CAPACITY>>,
    },
    Menu {
        title: &'static str,
        rows: Vec<MenuRow, WINDOW_ROWS>,
    },
    Message(String<MESSAGE_CAPACITY>),
}

/// Latest screen wins, the display never draws a stale one.
pub type DisplaySignal = Signal<CriticalSectionRawMutex, DisplayCommand>;

/// Copy as much of `text` as fits.
fn bounded<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// [`Presenter`] for the firmware: hands each screen to the display task.
pub struct SignalPresenter {
    signal: &'static DisplaySignal,
}

impl SignalPresenter {
    pub fn new(signal: &'static DisplaySignal) -> Self {
        Self { signal }
    }
}

impl Presenter for SignalPresenter {
    fn render_weight_screen(&mut self, reading: WeightReading, warning: Option<&str>) {
        self.signal.signal(DisplayCommand::Weight {
            reading,
            warning: warning.map(bounded::<LABEL_CAPACITY>),
        });
    }

    fn render_menu(&mut self, menu: &MenuView<'_>) {
        let mut rows = Vec::new();
        for (index, label, value) in menu.rows() {
            let row = MenuRow {
                label,
                value,
                selected: index == menu.cursor,
            };
            if rows.push(row).is_err() {
                break;
            }
        }
        self.signal.signal(DisplayCommand::Menu {
            title: menu.level.title,
            rows,
        });
    }

    fn render_message(&mut self, text: &str, dwell: Duration) {
        trace!("Message for {} ms", dwell.as_millis());
        self.signal.signal(DisplayCommand::Message(bounded(text)));
    }
}

/// Centre `message` on the screen, one line per `\n`.
fn draw_message_screen<D: DrawTarget<Color = BinaryColor>>(
    display: &mut D,
    message: &str,
) -> Result<(), D::Error> {
    let centred_text_style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();

    let line_count = message.lines().count().max(1) as i32;
    let line_offset_pixels = (line_count - 1) * DEFAULT_TEXT_STYLE.line_height() as i32 / 2;
    let x_pos = display.bounding_box().size.width as i32 / 2;
    let y_pos = display.bounding_box().size.height as i32 / 2 - line_offset_pixels;
    Text::with_text_style(
        message,
        Point::new(x_pos, y_pos),
        DEFAULT_TEXT_STYLE,
        centred_text_style,
    )
    .draw(display)?;
    Ok(())
}

fn draw_weight_screen<D: DrawTarget<Color = BinaryColor>>(
    display: &mut D,
    reading: &WeightReading,
    warning: Option<&str>,
) -> Result<(), D::Error> {
    let centred = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();
    let x_pos = display.bounding_box().size.width as i32 / 2;

    let mut line: String<LABEL_CAPACITY> = String::new();
    // a full buffer only truncates the text
    let _ = write!(line, "{:.2} lbs", reading.pounds);
    Text::with_text_style(&line, Point::new(x_pos, 4), WEIGHT_TEXT_STYLE, centred).draw(display)?;

    line.clear();
    let _ = write!(line, "{:.2} kg", reading.kilograms);
    Text::with_text_style(&line, Point::new(x_pos, 28), WEIGHT_TEXT_STYLE, centred).draw(display)?;

    if let Some(warning) = warning {
        Text::with_text_style(warning, Point::new(x_pos, 52), DEFAULT_TEXT_STYLE, centred)
            .draw(display)?;
    }
    Ok(())
}

fn draw_menu_screen<D: DrawTarget<Color = BinaryColor>>(
    display: &mut D,
    title: &str,
    rows: &[MenuRow],
) -> Result<(), D::Error> {
    let line_height = DEFAULT_TEXT_STYLE.line_height() as i32 + 2;
    let title_style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();
    let row_style = TextStyleBuilder::new()
        .alignment(Alignment::Left)
        .baseline(Baseline::Top)
        .build();

    let x_centre = display.bounding_box().size.width as i32 / 2;
    Text::with_text_style(title, Point::new(x_centre, 0), DEFAULT_TEXT_STYLE, title_style)
        .draw(display)?;

    let mut line: String<LABEL_CAPACITY> = String::new();
    for (row_index, row) in rows.iter().enumerate() {
        line.clear();
        let marker = if row.selected { '>' } else { ' ' };
        let _ = match row.value {
            Some(value) => write!(line, "{}{:<4}{:>9.2} lbs", marker, row.label, value),
            None => write!(line, "{}{}", marker, row.label),
        };
        let y_pos = (row_index as i32 + 1) * line_height;
        Text::with_text_style(&line, Point::new(0, y_pos), DEFAULT_TEXT_STYLE, row_style)
            .draw(display)?;
    }
    Ok(())
}

/// Draw every screen the controller publishes. Runs forever.
pub async fn display_update_handler<DI>(
    signal: &'static DisplaySignal,
    display: &mut GraphicsMode<DI>,
) -> !
where
    DI: sh1106::interface::DisplayInterface,
{
    let _ = display.init().map_err(|_| error!("Failed to init display"));
    display.clear();
    let _ = display.flush().map_err(|_| error!("Failed to flush display"));

    loop {
        let command = signal.wait().await;
        display.clear();

        let drawn = match &command {
            DisplayCommand::Weight { reading, warning } => {
                draw_weight_screen(display, reading, warning.as_deref())
            }
            DisplayCommand::Menu { title, rows } => draw_menu_screen(display, title, rows),
            DisplayCommand::Message(text) => {
                debug!("Showing message");
                draw_message_screen(display, text)
            }
        };
        if drawn.is_err() {
            error!("Failed to draw screen");
        }

        let _ = display.flush().map_err(|_| error!("Display flush failed"));
    }
}
