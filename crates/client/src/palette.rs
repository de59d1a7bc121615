//! Cell-state roster and selection.
//!
//! The roster is authoritative on the server: `init` pushes replace it
//! wholesale, `color` pushes recolor single entries, and local color edits
//! apply no optimistic update at all — the displayed color changes only when
//! the server echoes the push back. Selection is the one purely local piece
//! of state.

use cellular_protocol::{CellState, Rgb};
use tracing::debug;

/// Selection the roster resets to on every `init` push.
pub const DEFAULT_SELECTION: u32 = 1;

/// Cell-state roster plus the locally selected value.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    cell_states: Vec<CellState>,
    selected: u32,
}

impl Palette {
    /// The roster, in server-defined order.
    pub fn cell_states(&self) -> &[CellState] {
        &self.cell_states
    }

    /// Currently selected cell-state value.
    pub fn selected(&self) -> u32 {
        self.selected
    }

    /// Color of the selected entry, if the roster has been populated.
    pub fn selected_color(&self) -> Option<Rgb> {
        self.cell_states
            .iter()
            .find(|c| c.value == self.selected)
            .map(|c| c.color)
    }

    /// `init` push: replace the roster wholesale and reset the selection.
    ///
    /// Falls back to the first entry when the roster has no value matching
    /// [`DEFAULT_SELECTION`].
    pub fn apply_init(&mut self, cell_states: Vec<CellState>) {
        self.selected = if cell_states.iter().any(|c| c.value == DEFAULT_SELECTION) {
            DEFAULT_SELECTION
        } else {
            cell_states.first().map(|c| c.value).unwrap_or(0)
        };
        self.cell_states = cell_states;
        debug!(
            states = self.cell_states.len(),
            selected = self.selected,
            "roster replaced"
        );
    }

    /// `color` push: recolor only the matching entry. Order and all other
    /// entries stay untouched; unknown values are ignored.
    pub fn apply_color(&mut self, value: u32, color: Rgb) {
        match self.cell_states.iter_mut().find(|c| c.value == value) {
            Some(entry) => entry.color = color,
            None => debug!(value, "color push for unknown cell state ignored"),
        }
    }

    /// Local selection change. Pure local state, no message; values not in
    /// the roster are rejected.
    pub fn select(&mut self, value: u32) -> bool {
        if self.cell_states.iter().any(|c| c.value == value) {
            self.selected = value;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<CellState> {
        vec![
            CellState {
                value: 0,
                color: [0, 0, 0],
            },
            CellState {
                value: 1,
                color: [255, 255, 255],
            },
            CellState {
                value: 2,
                color: [0, 255, 0],
            },
        ]
    }

    #[test]
    fn init_replaces_roster_and_resets_selection() {
        let mut palette = Palette::default();
        palette.apply_init(roster());
        palette.select(2);

        palette.apply_init(vec![
            CellState {
                value: 0,
                color: [0, 0, 0],
            },
            CellState {
                value: 1,
                color: [0, 0, 255],
            },
        ]);

        assert_eq!(palette.cell_states().len(), 2);
        assert_eq!(palette.selected(), DEFAULT_SELECTION);
        assert_eq!(palette.selected_color(), Some([0, 0, 255]));
    }

    #[test]
    fn init_without_default_value_selects_first_entry() {
        let mut palette = Palette::default();
        palette.apply_init(vec![CellState {
            value: 7,
            color: [1, 2, 3],
        }]);
        assert_eq!(palette.selected(), 7);
    }

    #[test]
    fn color_push_mutates_only_the_matching_entry() {
        let mut palette = Palette::default();
        palette.apply_init(roster());

        palette.apply_color(1, [10, 20, 30]);

        let states = palette.cell_states();
        assert_eq!(states[0].color, [0, 0, 0]);
        assert_eq!(states[1].color, [10, 20, 30]);
        assert_eq!(states[2].color, [0, 255, 0]);
        // Order preserved.
        assert_eq!(
            states.iter().map(|c| c.value).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn color_push_for_unknown_value_is_ignored() {
        let mut palette = Palette::default();
        palette.apply_init(roster());
        let before = palette.cell_states().to_vec();

        palette.apply_color(99, [1, 1, 1]);
        assert_eq!(palette.cell_states(), &before[..]);
    }

    #[test]
    fn local_color_request_applies_no_optimistic_update() {
        use cellular_protocol::ClientMessage;

        let mut palette = Palette::default();
        palette.apply_init(roster());

        let request = ClientMessage::Color {
            cell_state: palette.selected(),
            color: [200, 10, 10],
        };
        assert!(request.encode().is_ok());

        // Building the request changes nothing locally; the color moves
        // only when the server echoes the push back.
        assert_eq!(palette.selected_color(), Some([255, 255, 255]));
        palette.apply_color(1, [200, 10, 10]);
        assert_eq!(palette.selected_color(), Some([200, 10, 10]));
    }

    #[test]
    fn selection_requires_a_known_value() {
        let mut palette = Palette::default();
        palette.apply_init(roster());

        assert!(palette.select(2));
        assert_eq!(palette.selected(), 2);

        assert!(!palette.select(42));
        assert_eq!(palette.selected(), 2);
    }

    #[test]
    fn empty_palette_has_no_selected_color() {
        let palette = Palette::default();
        assert_eq!(palette.selected_color(), None);
        assert!(palette.cell_states().is_empty());
    }
}
