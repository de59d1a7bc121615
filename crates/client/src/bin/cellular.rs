//! Headless demo client.
//!
//! Connects to a cellular-automaton server, logs the handshake state, drives
//! a short scripted camera/draw interaction, then keeps consuming the video
//! track (discarding frames) until Ctrl-C.

use anyhow::Result;
use cellular_client::protocol::UniverseKind;
use cellular_client::{ClientConfig, Session};
use clap::Parser;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "cellular", version, about = "Cellular automaton WebRTC client")]
struct Args {
    /// Signaling endpoint accepting POST {sdp, type}
    #[arg(long, env = "CELLULAR_SIGNALING_URL", default_value = "http://127.0.0.1:8080/offer")]
    signaling_url: String,

    /// Draw messages per second while the scripted gesture is held
    #[arg(long, default_value_t = 60)]
    draw_frequency: u32,

    /// Ask the server to switch universes after connecting
    /// (game_of_life, falling_sand, growth)
    #[arg(long)]
    universe: Option<UniverseKind>,

    /// Skip the scripted interaction and just watch the stream
    #[arg(long)]
    watch_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cellular=info,cellular_client=info".into()),
        )
        .init();

    let args = Args::parse();
    info!(version = cellular_client::version(), url = %args.signaling_url, "starting client");

    let config =
        ClientConfig::new(&args.signaling_url).with_draw_frequency(args.draw_frequency);
    let (mut session, mut video) = Session::connect(config).await?;

    // Drain the inbound stream; a real frontend would decode and render it.
    let video_task = tokio::spawn(async move {
        let Some(track) = video.recv().await else {
            warn!("no video track received");
            return;
        };
        info!(codec = %track.codec().capability.mime_type, "video track attached");
        let mut packets: u64 = 0;
        while let Ok((_packet, _attrs)) = track.read_rtp().await {
            packets += 1;
            if packets % 500 == 0 {
                debug!(packets, "video packets received");
            }
        }
        info!(packets, "video track ended");
    });

    // Give the server a moment to push the handshake state.
    tokio::time::sleep(Duration::from_secs(1)).await;
    info!(
        universe = ?session.universe().await,
        cell_states = session.cell_states().await.len(),
        players = session.player_count().await,
        "handshake state"
    );

    if let Some(kind) = args.universe {
        info!(%kind, "requesting universe switch");
        session.request_universe(kind).await?;
    }

    if !args.watch_only {
        run_script(&mut session).await?;
    }

    info!("running until Ctrl-C");
    tokio::signal::ctrl_c().await?;

    session.close().await?;
    video_task.abort();
    info!("session closed");
    Ok(())
}

/// Zoom in, pan, and hold a one-second draw stroke across the view.
async fn run_script(session: &mut Session) -> Result<()> {
    for _ in 0..3 {
        session.press_key('e').await?;
    }
    session.press_key('d').await?;
    session.press_key('s').await?;
    info!(view = ?session.view_state(), "camera moved");

    session.pointer_moved(0.2, 0.5).await;
    session.pointer_down();
    for step in 1..=10 {
        session
            .pointer_moved(0.2 + 0.06 * f64::from(step), 0.5)
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    session.pointer_up();
    info!("draw stroke complete");

    Ok(())
}
