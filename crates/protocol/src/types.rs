//! Data model shared by client and server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display color as an RGB triple of 0–255 components.
pub type Rgb = [u8; 3];

/// A server-defined discrete simulation value with its display color.
///
/// `value` is unique and server-assigned. Roster order is the server's
/// insertion order and is meaningful for display, so it must be preserved
/// across color updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState {
    pub value: u32,
    pub color: Rgb,
}

/// The fixed set of simulations the server can run.
///
/// Selecting one asks the server to switch; the client only ever holds the
/// last-known value and none of the simulation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniverseKind {
    GameOfLife,
    FallingSand,
    Growth,
}

impl UniverseKind {
    /// All selectable universes, in display order.
    pub const ALL: [UniverseKind; 3] = [
        UniverseKind::GameOfLife,
        UniverseKind::FallingSand,
        UniverseKind::Growth,
    ];

    /// The wire name of this universe.
    pub fn as_str(&self) -> &'static str {
        match self {
            UniverseKind::GameOfLife => "game_of_life",
            UniverseKind::FallingSand => "falling_sand",
            UniverseKind::Growth => "growth",
        }
    }
}

impl fmt::Display for UniverseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UniverseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "game_of_life" => Ok(UniverseKind::GameOfLife),
            "falling_sand" => Ok(UniverseKind::FallingSand),
            "growth" => Ok(UniverseKind::Growth),
            other => Err(format!("unknown universe kind: {other}")),
        }
    }
}

/// Top-left corner of the visible window, in unit-square coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// The client's camera window into the unit-square universe.
///
/// `zoom` is the edge length of the visible square, so smaller means more
/// zoomed in. Invariant: `zoom ∈ [min_zoom, 1]` and each position axis stays
/// in `[0, 1 − zoom]` so the window never leaves the universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: f64,
    pub position: Position,
}

impl ViewState {
    /// The whole universe in view.
    pub fn full() -> Self {
        Self {
            zoom: 1.0,
            position: Position { x: 0.0, y: 0.0 },
        }
    }

    /// Check the camera-window invariant against a given minimum zoom.
    pub fn is_valid(&self, min_zoom: f64) -> bool {
        self.zoom >= min_zoom
            && self.zoom <= 1.0
            && self.position.x >= 0.0
            && self.position.x <= 1.0 - self.zoom
            && self.position.y >= 0.0
            && self.position.y <= 1.0 - self.zoom
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::full()
    }
}

/// One stamp of a cell state at a normalized position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawCommand {
    pub x: f64,
    pub y: f64,
    pub size: u32,
    pub cell_state: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_kind_wire_names_round_trip() {
        for kind in UniverseKind::ALL {
            assert_eq!(kind.as_str().parse::<UniverseKind>(), Ok(kind));
        }
        assert!("life".parse::<UniverseKind>().is_err());
    }

    #[test]
    fn universe_kind_serializes_snake_case() {
        let json = serde_json::to_string(&UniverseKind::GameOfLife).unwrap();
        assert_eq!(json, "\"game_of_life\"");
    }

    #[test]
    fn full_view_is_valid() {
        let view = ViewState::full();
        assert!(view.is_valid(0.05));
        assert_eq!(view.zoom, 1.0);
    }

    #[test]
    fn view_outside_unit_square_is_invalid() {
        let view = ViewState {
            zoom: 0.5,
            position: Position { x: 0.6, y: 0.0 },
        };
        assert!(!view.is_valid(0.05));
    }

    #[test]
    fn draw_command_uses_camel_case_on_the_wire() {
        let cmd = DrawCommand {
            x: 0.5,
            y: 0.5,
            size: 10,
            cell_state: 2,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert!(json.get("cellState").is_some());
        assert!(json.get("cell_state").is_none());
    }
}
