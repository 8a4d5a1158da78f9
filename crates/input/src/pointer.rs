use crate::action::Action;
use glam::Vec2;

/// Turns primary-button press/move/release events into actions.
///
/// A press followed by a release within `click_slop` pixels of total travel
/// is a pick; anything longer is a drag, reported as incremental orbits.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    pub click_slop: f32,
    position: Vec2,
    pressed: bool,
    travelled: f32,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self {
            click_slop: 4.0,
            position: Vec2::ZERO,
            pressed: false,
            travelled: 0.0,
        }
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known pointer position in pixels.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn press(&mut self) {
        self.pressed = true;
        self.travelled = 0.0;
    }

    pub fn moved(&mut self, to: Vec2) -> Action {
        let delta = to - self.position;
        self.position = to;
        if !self.pressed {
            return Action::Noop;
        }
        self.travelled += delta.length();
        Action::Orbit(delta)
    }

    pub fn release(&mut self) -> Action {
        if !self.pressed {
            return Action::Noop;
        }
        self.pressed = false;
        if self.travelled <= self.click_slop {
            Action::Pick(self.position)
        } else {
            tracing::trace!("drag of {:.1}px ended", self.travelled);
            Action::Noop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_release_in_place_is_pick() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::new(400.0, 383.0));
        p.press();
        assert_eq!(p.release(), Action::Pick(Vec2::new(400.0, 383.0)));
    }

    #[test]
    fn small_jitter_still_picks() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::new(10.0, 10.0));
        p.press();
        p.moved(Vec2::new(11.0, 11.0));
        assert!(matches!(p.release(), Action::Pick(_)));
    }

    #[test]
    fn drag_orbits_and_does_not_pick() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::new(10.0, 10.0));
        p.press();
        assert_eq!(p.moved(Vec2::new(30.0, 10.0)), Action::Orbit(Vec2::new(20.0, 0.0)));
        assert_eq!(p.release(), Action::Noop);
    }

    #[test]
    fn hover_and_stray_release_do_nothing() {
        let mut p = PointerTracker::new();
        assert_eq!(p.moved(Vec2::new(5.0, 5.0)), Action::Noop);
        assert_eq!(p.release(), Action::Noop);
        assert!(!p.is_pressed());
    }
}
