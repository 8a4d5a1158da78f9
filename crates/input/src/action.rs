use glam::Vec2;

/// A high-level action produced from raw window input.
///
/// The overlay and camera consume actions, never raw events, so any host
/// (desktop window, headless CLI, tests) drives them the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Rotate the camera by a pointer delta in pixels.
    Orbit(Vec2),
    /// Pick whatever lies under the pointer at this pixel position.
    Pick(Vec2),
    /// Clear the current selection.
    Dismiss,
    /// Input that maps to nothing.
    Noop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_pick_carries_position() {
        let a = Action::Pick(Vec2::new(400.0, 383.0));
        assert!(matches!(a, Action::Pick(p) if p.x == 400.0));
    }

    #[test]
    fn action_orbit_and_dismiss() {
        assert!(matches!(Action::Orbit(Vec2::X), Action::Orbit(_)));
        assert_ne!(Action::Dismiss, Action::Noop);
    }
}
