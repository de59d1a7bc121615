//! Session controller: the composition root.
//!
//! Owns the peer connection and control channel for their lifetime, runs the
//! inbound dispatch loop, and translates UI input (pointer, keyboard,
//! palette actions) into protocol messages through the view, draw and
//! palette sub-state.

use crate::config::ClientConfig;
use crate::draw::{Brush, DrawSampler};
use crate::negotiate::{negotiate, ConnectionState, SessionEvent};
use crate::palette::{Palette, DEFAULT_SELECTION};
use crate::view::ViewController;
use crate::{Error, Result};
use cellular_protocol::{CellState, ClientMessage, Rgb, ServerMessage, UniverseKind, ViewState};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::data_channel::RTCDataChannel;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::track::track_remote::TrackRemote;

/// Client-side session state fed by server pushes.
///
/// Roster and universe are authoritative on the server; everything here is
/// the last-pushed value, and a later push always wins.
#[derive(Debug)]
struct SessionState {
    palette: Palette,
    universe: Option<UniverseKind>,
    players: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            universe: None,
            // You are always your own first player.
            players: 1,
        }
    }
}

impl SessionState {
    /// Dispatch one server push to the right sub-state, in arrival order.
    fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Init {
                universe,
                cell_states,
            } => {
                debug!(%universe, states = cell_states.len(), "handshake state received");
                self.universe = Some(universe);
                self.palette.apply_init(cell_states);
            }
            ServerMessage::Color { cell_state, color } => {
                self.palette.apply_color(cell_state, color);
            }
            ServerMessage::Players(count) => {
                self.players = count;
            }
        }
    }
}

/// A connected session.
///
/// Constructed only by a successful [`Session::connect`], so every sender in
/// here is structurally gated behind an established data channel.
pub struct Session {
    config: ClientConfig,
    session_id: String,
    connection: Arc<RTCPeerConnection>,
    channel: Arc<RTCDataChannel>,
    state: Arc<RwLock<SessionState>>,
    lifecycle: Arc<watch::Sender<ConnectionState>>,
    brush: Arc<RwLock<Brush>>,
    view: ViewController,
    draw: DrawSampler,
    draw_tx: mpsc::Sender<ClientMessage>,
    pump_task: JoinHandle<()>,
    event_task: JoinHandle<()>,
}

impl Session {
    /// Negotiate and wire a session.
    ///
    /// Returns the session plus a one-shot receiver carrying the first
    /// inbound video track for the renderer. A failed negotiation returns
    /// the error with nothing handed back; there is no retry.
    pub async fn connect(config: ClientConfig) -> Result<(Self, mpsc::Receiver<Arc<TrackRemote>>)> {
        let (lifecycle, _) = watch::channel(ConnectionState::Idle);
        Self::connect_with_lifecycle(config, lifecycle).await
    }

    /// [`Session::connect`] with a caller-provided lifecycle channel.
    ///
    /// The channel sees `Idle → Negotiating → Connected`. A failed
    /// negotiation returns the error and leaves the channel at
    /// `Negotiating`, so the terminal state stays observable even though no
    /// session is handed back.
    pub async fn connect_with_lifecycle(
        config: ClientConfig,
        lifecycle: watch::Sender<ConnectionState>,
    ) -> Result<(Self, mpsc::Receiver<Arc<TrackRemote>>)> {
        config.validate()?;
        let _ = lifecycle.send(ConnectionState::Negotiating);

        let (video_tx, video_rx) = mpsc::channel(1);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let negotiated = negotiate(&config, video_tx, event_tx).await?;
        let session_id = negotiated.session_id;
        let _ = lifecycle.send(ConnectionState::Connected);
        let lifecycle = Arc::new(lifecycle);
        info!(session_id = %session_id, "session connected");

        let state = Arc::new(RwLock::new(SessionState::default()));
        let brush = Arc::new(RwLock::new(Brush {
            pointer: (0.0, 0.0),
            size: config.draw_size,
            cell_state: DEFAULT_SELECTION,
        }));

        // Outbound pump for the draw sampler. Capacity 1 bounds the sampler
        // to one pending send per tick.
        let (draw_tx, mut draw_rx) = mpsc::channel::<ClientMessage>(1);
        let pump_channel = Arc::clone(&negotiated.channel);
        let pump_task = tokio::spawn(async move {
            while let Some(message) = draw_rx.recv().await {
                if let Err(e) = send_on(&pump_channel, &message).await {
                    warn!(error = %e, "dropping outbound draw message");
                }
            }
        });

        // Inbound dispatch loop, processing events in arrival order.
        let dispatch_state = Arc::clone(&state);
        let dispatch_lifecycle = Arc::clone(&lifecycle);
        let dispatch_brush = Arc::clone(&brush);
        let dispatch_connection = Arc::clone(&negotiated.connection);
        let dispatch_id = session_id.clone();
        let event_task = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match event {
                    SessionEvent::ChannelOpen => {
                        info!(session_id = %dispatch_id, "control channel open");
                    }
                    SessionEvent::Message(message) => {
                        let mut state = dispatch_state.write().await;
                        state.apply(message);
                        // Keep the brush in step with the (possibly reset)
                        // selection.
                        dispatch_brush.write().await.cell_state = state.palette.selected();
                    }
                    SessionEvent::ProtocolFailure(reason) => {
                        error!(session_id = %dispatch_id, %reason, "corrupted control transport, closing session");
                        let _ = dispatch_lifecycle.send(ConnectionState::Closed);
                        if let Err(e) = dispatch_connection.close().await {
                            warn!(error = %e, "error closing connection");
                        }
                        break;
                    }
                    SessionEvent::ConnectionLost => {
                        warn!(session_id = %dispatch_id, "peer connection lost");
                        let _ = dispatch_lifecycle.send(ConnectionState::Closed);
                        break;
                    }
                }
            }
            debug!(session_id = %dispatch_id, "event loop ended");
        });

        let view = ViewController::new(config.zoom_velocity, config.move_velocity, config.min_zoom);
        let draw = DrawSampler::new(config.draw_frequency, Arc::clone(&brush));

        let session = Self {
            config,
            session_id,
            connection: negotiated.connection,
            channel: negotiated.channel,
            state,
            lifecycle,
            brush,
            view,
            draw,
            draw_tx,
            pump_task,
            event_task,
        };

        Ok((session, video_rx))
    }

    /// Correlation id for this session's logs.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.lifecycle.borrow()
    }

    /// Whether the session still considers itself connected.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.lifecycle.subscribe()
    }

    /// Whether the control channel is open for sending.
    pub fn channel_ready(&self) -> bool {
        self.channel.ready_state() == RTCDataChannelState::Open
    }

    /// Last-pushed cell-state roster, in server order.
    pub async fn cell_states(&self) -> Vec<CellState> {
        self.state.read().await.palette.cell_states().to_vec()
    }

    /// Currently selected cell-state value.
    pub async fn selected_cell_state(&self) -> u32 {
        self.state.read().await.palette.selected()
    }

    /// Last-pushed player count.
    pub async fn player_count(&self) -> u32 {
        self.state.read().await.players
    }

    /// Last-known universe kind.
    pub async fn universe(&self) -> Option<UniverseKind> {
        self.state.read().await.universe
    }

    /// Current (optimistic) camera window.
    pub fn view_state(&self) -> ViewState {
        self.view.state()
    }

    /// Current brush size.
    pub async fn draw_size(&self) -> u32 {
        self.brush.read().await.size
    }

    /// Whether a draw gesture is currently held.
    pub fn draw_active(&self) -> bool {
        self.draw.is_active()
    }

    /// Select a cell state. Pure local state; values not in the roster are
    /// rejected and `false` is returned.
    pub async fn select_cell_state(&mut self, value: u32) -> bool {
        let selected = self.state.write().await.palette.select(value);
        if selected {
            self.brush.write().await.cell_state = value;
        }
        selected
    }

    /// Set the brush size, clamped to `[1, max_draw_size]`.
    pub async fn set_draw_size(&mut self, size: u32) {
        let clamped = clamp_draw_size(size, self.config.max_draw_size);
        self.brush.write().await.size = clamped;
    }

    /// Request recoloring the selected cell state.
    ///
    /// No optimistic update: the palette changes only when the server echoes
    /// a `color` push back.
    pub async fn request_color(&self, color: Rgb) -> Result<()> {
        let cell_state = self.selected_cell_state().await;
        self.send(&ClientMessage::Color { cell_state, color }).await
    }

    /// Ask the server to switch universes. The local universe value updates
    /// only when the server answers with a fresh `init` push.
    pub async fn request_universe(&self, kind: UniverseKind) -> Result<()> {
        self.send(&ClientMessage::Universe(kind)).await
    }

    /// Apply one key press to the camera.
    ///
    /// A recognized key commits the clamped state locally and sends exactly
    /// one `video` message; anything else does nothing and returns `false`.
    pub async fn press_key(&mut self, key: char) -> Result<bool> {
        match self.view.press(key) {
            Some(state) => {
                self.send(&ClientMessage::Video(state)).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Record a pointer move in normalized video coordinates. Out-of-range
    /// values are corrected locally, never rejected.
    pub async fn pointer_moved(&mut self, x: f64, y: f64) {
        self.brush.write().await.pointer = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
    }

    /// Begin a draw gesture (pointer-down).
    pub fn pointer_down(&mut self) {
        self.draw.start(self.draw_tx.clone());
    }

    /// End a draw gesture (pointer-up, or the pointer leaving the draw
    /// surface).
    pub fn pointer_up(&mut self) {
        self.draw.stop();
    }

    /// Tear the session down: stop the sampler, cancel the loops, close the
    /// channel and the connection. In-flight sends are neither awaited nor
    /// rolled back.
    pub async fn close(&mut self) -> Result<()> {
        info!(session_id = %self.session_id, "closing session");

        self.draw.stop();
        self.event_task.abort();
        self.pump_task.abort();

        let _ = self.lifecycle.send(ConnectionState::Closed);

        if let Err(e) = self.channel.close().await {
            warn!(error = %e, "error closing control channel");
        }
        if let Err(e) = self.connection.close().await {
            warn!(error = %e, "error closing peer connection");
        }

        Ok(())
    }

    async fn send(&self, message: &ClientMessage) -> Result<()> {
        send_on(&self.channel, message).await
    }
}

/// Clamp a requested brush size to `[1, max_draw_size]`. Out-of-range
/// values are corrected, never rejected.
fn clamp_draw_size(size: u32, max_draw_size: u32) -> u32 {
    size.clamp(1, max_draw_size)
}

/// Encode and send one message on the control channel.
async fn send_on(channel: &RTCDataChannel, message: &ClientMessage) -> Result<()> {
    if channel.ready_state() != RTCDataChannelState::Open {
        return Err(Error::InvalidState(format!(
            "control channel is not open (state: {:?})",
            channel.ready_state()
        )));
    }

    let frame = message.encode()?;
    channel
        .send_text(frame)
        .await
        .map_err(|e| Error::DataChannelError(format!("send failed: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_message() -> ServerMessage {
        ServerMessage::Init {
            universe: UniverseKind::GameOfLife,
            cell_states: vec![
                CellState {
                    value: 0,
                    color: [0, 0, 0],
                },
                CellState {
                    value: 1,
                    color: [255, 255, 255],
                },
            ],
        }
    }

    #[test]
    fn init_dispatch_replaces_roster_and_resets_selection() {
        let mut state = SessionState::default();
        state.apply(init_message());

        assert_eq!(state.universe, Some(UniverseKind::GameOfLife));
        assert_eq!(state.palette.cell_states().len(), 2);
        assert_eq!(state.palette.selected(), 1);
        assert_eq!(
            state
                .palette
                .cell_states()
                .iter()
                .map(|c| c.value)
                .collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn color_dispatch_recolors_a_single_entry() {
        let mut state = SessionState::default();
        state.apply(init_message());
        state.apply(ServerMessage::Color {
            cell_state: 0,
            color: [9, 9, 9],
        });

        assert_eq!(state.palette.cell_states()[0].color, [9, 9, 9]);
        assert_eq!(state.palette.cell_states()[1].color, [255, 255, 255]);
    }

    #[test]
    fn draw_size_is_clamped_to_the_configured_bounds() {
        assert_eq!(clamp_draw_size(0, 75), 1);
        assert_eq!(clamp_draw_size(76, 75), 75);
        assert_eq!(clamp_draw_size(40, 75), 40);
        assert_eq!(clamp_draw_size(1, 1), 1);
    }

    #[test]
    fn players_dispatch_updates_the_count() {
        let mut state = SessionState::default();
        assert_eq!(state.players, 1);

        state.apply(ServerMessage::Players(4));
        assert_eq!(state.players, 4);
    }

    #[test]
    fn a_later_push_always_wins() {
        let mut state = SessionState::default();
        state.apply(init_message());
        state.apply(ServerMessage::Color {
            cell_state: 1,
            color: [1, 1, 1],
        });
        state.apply(ServerMessage::Color {
            cell_state: 1,
            color: [2, 2, 2],
        });
        assert_eq!(state.palette.cell_states()[1].color, [2, 2, 2]);

        // A fresh init (e.g. after a universe switch) discards everything.
        state.apply(init_message());
        assert_eq!(state.palette.cell_states()[1].color, [255, 255, 255]);
    }
}
