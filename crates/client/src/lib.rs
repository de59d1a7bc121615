//! WebRTC client for a server-simulated cellular automaton.
//!
//! The server runs the universe and streams it back as live video; this
//! client negotiates the peer connection, hands the inbound video track to a
//! renderer sink, and drives the simulation over a reliable, ordered data
//! channel: draw strokes, camera pan/zoom, palette edits, and universe
//! selection. No simulation state is rendered or interpreted locally.
//!
//! # Architecture
//!
//! ```text
//! Session (composition root)
//! ├─ negotiate       offer/answer over HTTP signaling → RTCPeerConnection
//! ├─ data channel    ClientMessage out, ServerMessage in ("datachannel")
//! ├─ ViewController  zoom/pan state machine → `video` messages
//! ├─ DrawSampler     fixed-frequency pointer sampling → `draw` messages
//! └─ Palette         server-authoritative cell-state roster + selection
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cellular_client::{ClientConfig, Session};
//!
//! # async fn example() -> cellular_client::Result<()> {
//! let config = ClientConfig::new("http://127.0.0.1:8080/offer");
//! let (mut session, mut video) = Session::connect(config).await?;
//!
//! let _track = video.recv().await; // hand to the renderer
//! session.press_key('e').await?;   // zoom in
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod draw;
pub mod error;
pub mod negotiate;
pub mod palette;
pub mod session;
pub mod signaling;
pub mod view;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use negotiate::{ConnectionState, NegotiatedSession, SessionEvent};
pub use palette::Palette;
pub use session::Session;
pub use view::{ViewController, ViewKey};

pub use cellular_protocol as protocol;

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
