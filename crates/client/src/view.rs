//! Camera state machine: keyboard deltas over [`ViewState`] with clamping.

use cellular_protocol::ViewState;

/// Recognized camera keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKey {
    ZoomOut,
    ZoomIn,
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
}

impl ViewKey {
    /// Map a pressed character to a camera key. Anything else means "do
    /// nothing at all": no message, no state change.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(ViewKey::ZoomOut),
            'e' => Some(ViewKey::ZoomIn),
            'w' => Some(ViewKey::PanUp),
            's' => Some(ViewKey::PanDown),
            'a' => Some(ViewKey::PanLeft),
            'd' => Some(ViewKey::PanRight),
            _ => None,
        }
    }
}

/// Applies key deltas to a working copy of the view, clamps, commits.
///
/// `zoom` is the edge length of the visible window, so zooming in shrinks
/// it. Pan steps scale with the current zoom so movement stays proportional
/// to what is on screen. Updates are optimistic: the new state is local
/// truth immediately and the server applies the same value without any
/// acknowledgment.
#[derive(Debug, Clone)]
pub struct ViewController {
    state: ViewState,
    zoom_velocity: f64,
    move_velocity: f64,
    min_zoom: f64,
}

impl ViewController {
    pub fn new(zoom_velocity: f64, move_velocity: f64, min_zoom: f64) -> Self {
        Self {
            state: ViewState::default(),
            zoom_velocity,
            move_velocity,
            min_zoom,
        }
    }

    /// Current committed view.
    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Apply one camera key and return the committed state, to be sent as a
    /// `video` message.
    pub fn apply(&mut self, key: ViewKey) -> ViewState {
        let mut next = self.state;
        // Pan speed is proportional to the pre-update zoom level.
        let pan = self.move_velocity * self.state.zoom;

        match key {
            ViewKey::ZoomOut => next.zoom += self.zoom_velocity,
            ViewKey::ZoomIn => next.zoom -= self.zoom_velocity,
            ViewKey::PanDown => next.position.y += pan,
            ViewKey::PanUp => next.position.y -= pan,
            ViewKey::PanRight => next.position.x += pan,
            ViewKey::PanLeft => next.position.x -= pan,
        }

        // Zoom first; position clamps against the already-clamped zoom.
        next.zoom = next.zoom.clamp(self.min_zoom, 1.0);
        next.position.x = next.position.x.clamp(0.0, 1.0 - next.zoom);
        next.position.y = next.position.y.clamp(0.0, 1.0 - next.zoom);

        self.state = next;
        next
    }

    /// Apply a raw key press; `None` when the key is not a camera key.
    pub fn press(&mut self, c: char) -> Option<ViewState> {
        ViewKey::from_char(c).map(|key| self.apply(key))
    }
}
