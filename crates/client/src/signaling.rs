//! HTTP offer/answer exchange with the signaling endpoint.
//!
//! The endpoint contract is a single round trip: `POST` the finalized local
//! description as `{"sdp": ..., "type": "offer"}` and receive
//! `{"sdp": ..., "type": "answer"}` back. No authentication, no retries;
//! any failure is fatal for the negotiation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// JSON body shared by both directions of the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SdpEnvelope {
    sdp: String,
    #[serde(rename = "type")]
    kind: String,
}

/// One-shot signaling client for the offer/answer round trip.
pub struct SignalingClient {
    url: String,
    http: reqwest::Client,
}

impl SignalingClient {
    /// Create a client for the given endpoint URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Submit the finalized local offer and return the server's answer.
    ///
    /// The offer must already carry its ICE candidates; this is a vanilla
    /// (non-trickle) exchange.
    pub async fn exchange(&self, offer: &RTCSessionDescription) -> Result<RTCSessionDescription> {
        let body = SdpEnvelope {
            sdp: offer.sdp.clone(),
            kind: offer.sdp_type.to_string(),
        };

        debug!(url = %self.url, "submitting offer to signaling endpoint");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::SignalingError(format!("endpoint rejected offer: {e}")))?;

        let answer: SdpEnvelope = response
            .json()
            .await
            .map_err(|e| Error::SignalingError(format!("malformed answer body: {e}")))?;

        if answer.kind != "answer" {
            return Err(Error::SdpError(format!(
                "expected an answer, got {:?}",
                answer.kind
            )));
        }

        debug!(sdp_len = answer.sdp.len(), "received answer");

        RTCSessionDescription::answer(answer.sdp)
            .map_err(|e| Error::SdpError(format!("invalid answer SDP: {e}")))
    }
}
