//! Session negotiation.
//!
//! One asynchronous flow that builds the peer connection, puts the control
//! channel into the offer, waits out ICE gathering, runs the signaling
//! exchange, and hands back the connection plus channel. Any failed step
//! rejects the whole flow; there is no retry and no gathering timeout (a
//! stalled network path stalls startup — accepted risk).

use crate::config::ClientConfig;
use crate::signaling::SignalingClient;
use crate::{Error, Result};
use cellular_protocol::ServerMessage;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_remote::TrackRemote;

/// Client connection lifecycle.
///
/// Transitions are forward-only (`Idle → Negotiating → Connected`), except
/// that `Connected` drops to `Closed` on teardown or connection loss. A
/// failed negotiation leaves the state at `Negotiating` with no recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Negotiating,
    Connected,
    Closed,
}

/// Events surfaced by the negotiated session's callbacks.
#[derive(Debug)]
pub enum SessionEvent {
    /// A recognized server push arrived on the control channel.
    Message(ServerMessage),

    /// The control channel delivered a frame this client cannot parse.
    /// Corrupted transport is fatal for the session.
    ProtocolFailure(String),

    /// The control channel reported open; senders may start.
    ChannelOpen,

    /// The peer connection reported disconnected, failed or closed.
    ConnectionLost,
}

/// Connection, control channel and correlation id handed back by
/// [`negotiate`]. The caller owns both exclusively for their lifetime.
pub struct NegotiatedSession {
    pub connection: Arc<RTCPeerConnection>,
    pub channel: Arc<RTCDataChannel>,
    pub session_id: String,
}

/// Negotiate a session against the configured signaling endpoint.
///
/// * `video_tx` receives the first inbound media track; later tracks are
///   ignored.
/// * `event_tx` receives decoded server pushes and lifecycle events, in
///   arrival order.
pub async fn negotiate(
    config: &ClientConfig,
    video_tx: mpsc::Sender<Arc<TrackRemote>>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) -> Result<NegotiatedSession> {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, url = %config.signaling_url, "negotiating session");

    let mut media_engine = MediaEngine::default();
    media_engine
        .register_default_codecs()
        .map_err(|e| Error::WebRtcError(format!("failed to register codecs: {e}")))?;

    let registry = register_default_interceptors(Default::default(), &mut media_engine)
        .map_err(|e| Error::WebRtcError(format!("failed to register interceptors: {e}")))?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let ice_servers: Vec<RTCIceServer> = config
        .ice_servers()
        .into_iter()
        .map(|url| RTCIceServer {
            urls: vec![url],
            ..Default::default()
        })
        .collect();
    debug!(count = ice_servers.len(), "configured ICE servers");

    let connection = Arc::new(
        api.new_peer_connection(RTCConfiguration {
            ice_servers,
            ..Default::default()
        })
        .await
        .map_err(|e| Error::WebRtcError(format!("failed to create peer connection: {e}")))?,
    );

    // From here on a failed step must tear the connection down again, or
    // its ICE and DTLS tasks keep running in the background.
    let channel = match establish(&connection, config, video_tx, event_tx).await {
        Ok(channel) => channel,
        Err(e) => {
            if let Err(close_err) = connection.close().await {
                warn!(error = %close_err, "error closing connection after failed negotiation");
            }
            return Err(e);
        }
    };

    info!(session_id = %session_id, "session description exchange complete");

    Ok(NegotiatedSession {
        connection,
        channel,
        session_id,
    })
}

/// Wire the callbacks, create the control channel, and run the offer/answer
/// exchange on an already-created peer connection.
async fn establish(
    connection: &Arc<RTCPeerConnection>,
    config: &ClientConfig,
    video_tx: mpsc::Sender<Arc<TrackRemote>>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) -> Result<Arc<RTCDataChannel>> {
    // Surface only the first remote stream to the renderer.
    let video_slot = Arc::new(Mutex::new(Some(video_tx)));
    connection.on_track(Box::new(move |track, _receiver, _transceiver| {
        let video_slot = Arc::clone(&video_slot);
        Box::pin(async move {
            let Some(tx) = video_slot.lock().await.take() else {
                debug!(kind = %track.kind(), "ignoring additional remote track");
                return;
            };
            info!(kind = %track.kind(), "remote media track attached");
            if tx.send(track).await.is_err() {
                warn!("remote track receiver dropped before handoff");
            }
        })
    }));

    let state_tx = event_tx.clone();
    connection.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
        let state_tx = state_tx.clone();
        Box::pin(async move {
            debug!(?state, "peer connection state changed");
            if matches!(
                state,
                RTCPeerConnectionState::Disconnected
                    | RTCPeerConnectionState::Failed
                    | RTCPeerConnectionState::Closed
            ) {
                let _ = state_tx.send(SessionEvent::ConnectionLost);
            }
        })
    }));

    // The control channel must exist before the offer so it lands in the
    // offer SDP. Default init = reliable, ordered.
    let channel = connection
        .create_data_channel(&config.data_channel_label, None)
        .await
        .map_err(|e| Error::DataChannelError(format!("failed to create control channel: {e}")))?;
    attach_channel_handlers(&channel, event_tx);

    // Inbound video only; this client produces no media.
    connection
        .add_transceiver_from_kind(
            RTPCodecType::Video,
            Some(RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Recvonly,
                send_encodings: Vec::new(),
            }),
        )
        .await
        .map_err(|e| Error::WebRtcError(format!("failed to add video transceiver: {e}")))?;

    let offer = connection
        .create_offer(None)
        .await
        .map_err(|e| Error::SdpError(format!("failed to create offer: {e}")))?;

    // One-shot gathering watch: the vanilla exchange needs the
    // candidate-complete SDP before the POST.
    let mut gathering_done = connection.gathering_complete_promise().await;
    connection
        .set_local_description(offer)
        .await
        .map_err(|e| Error::SdpError(format!("failed to set local description: {e}")))?;
    let _ = gathering_done.recv().await;

    let local = connection
        .local_description()
        .await
        .ok_or_else(|| Error::SdpError("no local description after ICE gathering".to_string()))?;

    let answer = SignalingClient::new(&config.signaling_url)
        .exchange(&local)
        .await?;

    connection
        .set_remote_description(answer)
        .await
        .map_err(|e| Error::SdpError(format!("failed to apply remote answer: {e}")))?;

    Ok(channel)
}

/// Decode inbound frames and forward them (and channel lifecycle) as events.
///
/// Registered before the offer is sent so the server's initial `init` push
/// can never race the handler.
fn attach_channel_handlers(
    channel: &Arc<RTCDataChannel>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) {
    let open_tx = event_tx.clone();
    channel.on_open(Box::new(move || {
        let open_tx = open_tx.clone();
        Box::pin(async move {
            debug!("control channel open");
            let _ = open_tx.send(SessionEvent::ChannelOpen);
        })
    }));

    channel.on_message(Box::new(move |message| {
        let event_tx = event_tx.clone();
        Box::pin(async move {
            let frame = match std::str::from_utf8(&message.data) {
                Ok(text) => text.to_owned(),
                Err(e) => {
                    let _ = event_tx.send(SessionEvent::ProtocolFailure(format!(
                        "non-UTF-8 frame: {e}"
                    )));
                    return;
                }
            };

            match ServerMessage::decode(&frame) {
                Ok(Some(decoded)) => {
                    debug!(bytes = frame.len(), "control message received");
                    let _ = event_tx.send(SessionEvent::Message(decoded));
                }
                Ok(None) => debug!(%frame, "ignoring unrecognized message type"),
                Err(e) => {
                    let _ = event_tx.send(SessionEvent::ProtocolFailure(format!(
                        "unparseable frame: {e}"
                    )));
                }
            }
        })
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_defaults_to_idle() {
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }
}
