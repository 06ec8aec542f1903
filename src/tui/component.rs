use ratatui::layout::Rect;
use ratatui::Frame;

/// A reusable UI component.
///
/// Components receive their data as props (struct fields), borrowed from
/// `App` for the duration of one frame, and render into a given `Rect`.
///
/// `render` takes `&mut self` so a component may keep presentation caches
/// between frames, the way ratatui's `StatefulWidget` does.
pub trait Component {
    /// Render the component into the given area.
    fn render(&mut self, frame: &mut Frame, area: Rect);
}
