//! Wire protocol for the cellular universe control channel.
//!
//! Everything crossing the data channel is a UTF-8 JSON text frame with a
//! `{"type": ..., "value": ...}` envelope. [`ClientMessage`] and
//! [`ServerMessage`] are the two directions of that envelope; the data model
//! they carry lives in [`types`].
//!
//! The channel itself is reliable and ordered, so the codec makes no
//! provisions for loss or reordering.

#![warn(clippy::all)]

pub mod message;
pub mod types;

pub use message::{ClientMessage, ServerMessage};
pub use types::{CellState, DrawCommand, Position, Rgb, UniverseKind, ViewState};
