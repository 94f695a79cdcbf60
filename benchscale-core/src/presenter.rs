use crate::measurement::WeightReading;
use crate::menu::MenuLevel;
use core::ops::Range;
use embassy_time::Duration;

/// Everything needed to draw one menu screen.
#[derive(Debug, Clone)]
pub struct MenuView<'a> {
    pub level: &'static MenuLevel,
    pub cursor: usize,
    /// Item indices to draw, see [`crate::menu::Navigator::visible_window`].
    pub window: Range<usize>,
    /// Stored value per item, only given for the memory level.
    pub values: Option<&'a [f32]>,
}

impl<'a> MenuView<'a> {
    /// Rows of the window as (index, label, stored value).
    pub fn rows(&self) -> impl Iterator<Item = (usize, &'static str, Option<f32>)> + 'a {
        let level = self.level;
        let values = self.values;
        self.window.clone().filter_map(move |i| {
            level
                .items
                .get(i)
                .map(|item| (i, item.label, values.and_then(|v| v.get(i).copied())))
        })
    }
}

/// Output side of the scale. Rendering is fire and forget, the display owns its errors.
pub trait Presenter {
    fn render_weight_screen(&mut self, reading: WeightReading, warning: Option<&str>);

    fn render_menu(&mut self, menu: &MenuView<'_>);

    /// Show `text` on its own. `dwell` is how long the controller keeps it up, zero when
    /// the controller decides.
    fn render_message(&mut self, text: &str, dwell: Duration);
}
