use serde::{Deserialize, Serialize};

use crate::events::{GameEvent, ShotResult};

/// Core trait a frame-driven minigame implements.
///
/// The host owns the frame scheduler and input plumbing; the game only
/// advances its own state when `update` is called.
pub trait Minigame: Send {
    /// Metadata shown by the host.
    fn metadata(&self) -> GameMetadata;

    /// Called once per host frame. Returns render and terminal events.
    fn update(&mut self, dt: f32) -> Vec<GameEvent>;

    /// Apply an encoded input (pointer event, shoot, reset, ...).
    fn apply_input(&mut self, input: &[u8]);

    /// Serialize the current state.
    fn serialize_state(&self) -> Vec<u8>;

    /// Replace the current state with a previously serialized one.
    fn apply_state(&mut self, state: &[u8]);

    /// Whether nothing is moving and no shot is pending.
    fn is_settled(&self) -> bool;

    /// Result of the most recently completed shot, if any.
    fn last_result(&self) -> Option<ShotResult>;

    /// Frame rate in Hz the host should call `update` at.
    fn tick_rate(&self) -> f32 {
        60.0
    }
}

/// Descriptive metadata for a minigame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub ball_count: usize,
    pub zone_count: usize,
}
