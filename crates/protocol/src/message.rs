//! Data-channel message envelope and codec.
//!
//! Every frame is `{"type": <string>, "value": <payload>}`. The two enums
//! below cover the client→server and server→client halves of the table; the
//! adjacently-tagged serde representation produces the envelope directly.

use crate::types::{CellState, DrawCommand, Rgb, UniverseKind, ViewState};
use serde::{Deserialize, Serialize};

/// Messages sent client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Request recoloring a cell state. The server is the color authority:
    /// it may accept (and echo a [`ServerMessage::Color`] push), reject, or
    /// ignore the request, and the client never blocks on a reply.
    #[serde(rename_all = "camelCase")]
    Color { cell_state: u32, color: Rgb },

    /// One stamp of the selected cell state at the pointer position.
    Draw(DrawCommand),

    /// The client's new camera window.
    Video(ViewState),

    /// Ask the server to switch simulations.
    Universe(UniverseKind),
}

impl ClientMessage {
    /// Encode to a transport frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages pushed server → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Initial handshake, also re-pushed on universe switches: replaces the
    /// whole cell-state roster.
    #[serde(rename_all = "camelCase")]
    Init {
        universe: UniverseKind,
        cell_states: Vec<CellState>,
    },

    /// Authoritative recolor of a single cell state.
    #[serde(rename_all = "camelCase")]
    Color { cell_state: u32, color: Rgb },

    /// Current player count.
    Players(u32),
}

/// Envelope probe used to separate "unknown type" from "unparseable text".
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

impl ServerMessage {
    /// Decode one inbound frame.
    ///
    /// A well-formed envelope whose `type` this client does not recognize
    /// decodes to `Ok(None)` so a single unexpected frame cannot take the
    /// session down. Unparseable text or a malformed payload is a hard
    /// failure the caller propagates.
    pub fn decode(frame: &str) -> Result<Option<Self>, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(frame)?;
        match envelope.kind.as_str() {
            "init" | "color" | "players" => serde_json::from_str(frame).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;
    use serde_json::json;

    #[test]
    fn draw_round_trip() {
        let msg = ClientMessage::Draw(DrawCommand {
            x: 0.25,
            y: 0.75,
            size: 15,
            cell_state: 1,
        });
        let frame = msg.encode().unwrap();
        let decoded: ClientMessage = serde_json::from_str(&frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn video_round_trip() {
        let msg = ClientMessage::Video(ViewState {
            zoom: 0.9,
            position: Position { x: 0.05, y: 0.1 },
        });
        let frame = msg.encode().unwrap();
        let decoded: ClientMessage = serde_json::from_str(&frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn universe_round_trip() {
        let msg = ClientMessage::Universe(UniverseKind::FallingSand);
        let frame = msg.encode().unwrap();
        let decoded: ClientMessage = serde_json::from_str(&frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn color_request_round_trip() {
        let msg = ClientMessage::Color {
            cell_state: 2,
            color: [255, 128, 0],
        };
        let frame = msg.encode().unwrap();
        let decoded: ClientMessage = serde_json::from_str(&frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn draw_wire_shape_matches_server_contract() {
        let msg = ClientMessage::Draw(DrawCommand {
            x: 0.5,
            y: 0.5,
            size: 10,
            cell_state: 2,
        });
        let value: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "draw",
                "value": {"x": 0.5, "y": 0.5, "size": 10, "cellState": 2}
            })
        );
    }

    #[test]
    fn universe_wire_shape_is_a_bare_string() {
        let msg = ClientMessage::Universe(UniverseKind::GameOfLife);
        let value: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "universe", "value": "game_of_life"}));
    }

    #[test]
    fn decode_init_handshake() {
        let frame = r#"{"type":"init","value":{"universe":"game_of_life","cellStates":[{"value":0,"color":[0,0,0]},{"value":1,"color":[255,255,255]}]}}"#;
        let decoded = ServerMessage::decode(frame).unwrap().unwrap();
        match decoded {
            ServerMessage::Init {
                universe,
                cell_states,
            } => {
                assert_eq!(universe, UniverseKind::GameOfLife);
                assert_eq!(cell_states.len(), 2);
                assert_eq!(cell_states[0].value, 0);
                assert_eq!(cell_states[1].color, [255, 255, 255]);
            }
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn decode_players_push() {
        let decoded = ServerMessage::decode(r#"{"type":"players","value":3}"#)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, ServerMessage::Players(3));
    }

    #[test]
    fn unknown_type_is_a_no_op() {
        let decoded = ServerMessage::decode(r#"{"type":"telemetry","value":{"x":1}}"#).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn garbage_is_a_hard_failure() {
        assert!(ServerMessage::decode("not json at all").is_err());
        assert!(ServerMessage::decode(r#"{"no_type": true}"#).is_err());
    }

    #[test]
    fn malformed_payload_is_a_hard_failure() {
        // Recognized type, payload of the wrong shape.
        assert!(ServerMessage::decode(r#"{"type":"players","value":"many"}"#).is_err());
    }
}
