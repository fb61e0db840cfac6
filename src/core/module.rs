//! Panel trait shared by display elements, call forms and compound forms

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{Action, Context};

/// A dashboard panel bound to one contract function (or compound read)
pub trait Module {
    /// React to a key while the panel is selected
    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action;

    /// Draw into `area`; `focused` panels get the highlighted border
    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context, focused: bool);
}
