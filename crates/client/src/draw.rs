//! Fixed-frequency draw sampling.
//!
//! While a draw gesture is held (pointer-down until pointer-up or
//! pointer-leave) a tick task emits one `draw` message per tick carrying the
//! freshest pointer sample and the current brush. Pointer moves only update
//! the sample; they never send, which decouples input-event rate from
//! network-send rate.

use cellular_protocol::{ClientMessage, DrawCommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Brush settings plus the latest pointer sample, shared with the tick task.
#[derive(Debug, Clone, Copy)]
pub struct Brush {
    /// Latest pointer position in normalized video coordinates.
    pub pointer: (f64, f64),
    /// Stamp size in universe cells.
    pub size: u32,
    /// Currently selected cell state value.
    pub cell_state: u32,
}

/// Samples the pointer at a fixed frequency while a gesture is active.
pub struct DrawSampler {
    brush: Arc<RwLock<Brush>>,
    frequency: u32,
    task: Option<JoinHandle<()>>,
}

impl DrawSampler {
    /// Create an inactive sampler around a shared brush.
    pub fn new(frequency: u32, brush: Arc<RwLock<Brush>>) -> Self {
        Self {
            brush,
            frequency,
            task: None,
        }
    }

    /// Whether a draw gesture is currently held.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start the tick task (pointer-down). Idempotent while active.
    ///
    /// Each tick reads the brush and emits exactly one message; a full
    /// outbound queue drops that tick's message rather than stalling, since
    /// the next tick supersedes it anyway.
    pub fn start(&mut self, out: mpsc::Sender<ClientMessage>) {
        if self.is_active() {
            return;
        }

        let brush = Arc::clone(&self.brush);
        let period = Duration::from_secs_f64(1.0 / f64::from(self.frequency));

        debug!(frequency = self.frequency, "draw gesture started");
        self.task = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let brush = *brush.read().await;
                let message = ClientMessage::Draw(DrawCommand {
                    x: brush.pointer.0,
                    y: brush.pointer.1,
                    size: brush.size,
                    cell_state: brush.cell_state,
                });
                if out.try_send(message).is_err() {
                    debug!("outbound queue full, dropping draw tick");
                }
            }
        }));
    }

    /// Stop the tick task (pointer-up or pointer-leave). No final flush is
    /// sent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("draw gesture ended");
        }
    }
}

impl Drop for DrawSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
