use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use cueshot_core::events::{GameEvent, RenderUpdate, ShotResult};
use cueshot_core::game_trait::Minigame;

/// Commands sent from the embedding UI to the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// MessagePack-encoded game input.
    Input(Vec<u8>),
    Stop,
}

/// Broadcasts sent from the session loop to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionBroadcast {
    /// Render writes produced on frame `tick`.
    Frame {
        tick: u32,
        updates: Vec<RenderUpdate>,
    },
    /// A shot came to rest; emitted once per shot.
    ShotSettled(ShotResult),
    /// The loop has exited.
    SessionEnded,
}

/// Spawn a frame loop for `game` as a tokio task.
/// Returns the command sender and broadcast receiver.
pub fn spawn_table_session(
    mut game: Box<dyn Minigame>,
) -> (
    mpsc::UnboundedSender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionBroadcast>,
    JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        run_session_loop(&mut *game, cmd_rx, broadcast_tx).await;
    });

    (cmd_tx, broadcast_rx, handle)
}

async fn run_session_loop(
    game: &mut dyn Minigame,
    mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    broadcast_tx: mpsc::UnboundedSender<SessionBroadcast>,
) {
    let mut tick_rate = game.tick_rate();
    if !(tick_rate.is_finite() && tick_rate > 0.0) {
        tracing::warn!(tick_rate, "Invalid tick rate, using 60 Hz");
        tick_rate = 60.0;
    }
    let frame_dt = 1.0 / tick_rate;
    let mut interval = tokio::time::interval(Duration::from_secs_f32(frame_dt));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let meta = game.metadata();
    tracing::info!(
        game = %meta.name,
        balls = meta.ball_count,
        zones = meta.zone_count,
        tick_rate,
        "Session started"
    );

    let mut tick: u32 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick = tick.wrapping_add(1);
                for event in game.update(frame_dt) {
                    let broadcast = match event {
                        GameEvent::Frame(updates) => SessionBroadcast::Frame { tick, updates },
                        GameEvent::BallStopped(result) => {
                            tracing::info!(
                                tick,
                                zone = %result.name,
                                discount = result.discount,
                                "Shot settled"
                            );
                            SessionBroadcast::ShotSettled(result)
                        },
                    };
                    let _ = broadcast_tx.send(broadcast);
                }
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Input(data)) => game.apply_input(&data),
                    Some(SessionCommand::Stop) | None => break,
                }
            }
        }
    }

    tracing::info!(tick, "Session ended");
    let _ = broadcast_tx.send(SessionBroadcast::SessionEnded);
}
