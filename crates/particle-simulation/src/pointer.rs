//! Pointer input sampled by the physics step

use glam::Vec2;

/// Latest known pointer input
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    /// `None` until the pointer first moves
    pub position: Option<Vec2>,
    /// Primary button held; suspends the repulsion field
    pub pressed: bool,
}

impl PointerState {
    /// Position at which the pointer currently pushes particles, if any
    pub fn active_position(&self) -> Option<Vec2> {
        if self.pressed {
            None
        } else {
            self.position
        }
    }
}

/// Cursor appearance requested by a pointer transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorStyle {
    Default,
    Grab,
}

/// Folds raw pointer events into a [`PointerState`]
///
/// Events overwrite the state immediately; the next tick reads whatever was
/// written last.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    state: PointerState,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moved(&mut self, position: Vec2) {
        self.state.position = Some(position);
    }

    pub fn primary_pressed(&mut self) -> CursorStyle {
        self.state.pressed = true;
        CursorStyle::Grab
    }

    pub fn primary_released(&mut self) -> CursorStyle {
        self.state.pressed = false;
        CursorStyle::Default
    }

    pub fn state(&self) -> PointerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_until_moved() {
        let tracker = PointerTracker::new();
        assert_eq!(tracker.state().position, None);
        assert_eq!(tracker.state().active_position(), None);
    }

    #[test]
    fn test_last_move_wins() {
        let mut tracker = PointerTracker::new();
        tracker.moved(Vec2::new(1.0, 2.0));
        tracker.moved(Vec2::new(3.0, 4.0));
        assert_eq!(tracker.state().active_position(), Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_press_suspends_field() {
        let mut tracker = PointerTracker::new();
        tracker.moved(Vec2::new(5.0, 5.0));

        assert_eq!(tracker.primary_pressed(), CursorStyle::Grab);
        assert_eq!(tracker.state().active_position(), None);

        // Moving while held still updates the position
        tracker.moved(Vec2::new(6.0, 6.0));
        assert_eq!(tracker.state().position, Some(Vec2::new(6.0, 6.0)));

        assert_eq!(tracker.primary_released(), CursorStyle::Default);
        assert_eq!(tracker.state().active_position(), Some(Vec2::new(6.0, 6.0)));
    }
}
