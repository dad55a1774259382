use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Reward resolved for a completed shot. Also used as the payload a zone
/// carries, so a matching zone is reported as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotResult {
    pub discount: u32,
    pub name: String,
    pub color: String,
}

impl ShotResult {
    pub fn new(discount: u32, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            discount,
            name: name.into(),
            color: color.into(),
        }
    }

    /// Result reported when the scoring ball rests outside every zone.
    pub fn no_zone() -> Self {
        Self::new(0, "No Zone", "gray")
    }

    pub fn is_no_zone(&self) -> bool {
        *self == Self::no_zone()
    }
}

impl Default for ShotResult {
    fn default() -> Self {
        Self::no_zone()
    }
}

/// Visual transform of the aim indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTransform {
    /// Rendered length in pixels.
    pub length: f32,
    /// Rotation in degrees, same convention as the aim angle.
    pub rotation_deg: f32,
    /// Point the indicator pivots around (the cue ball center).
    pub anchor: Vec2,
    pub locked: bool,
}

/// A single write the presentation layer should apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderUpdate {
    /// Ball `index` moved; offsets are relative to the table's own frame.
    BallMoved { index: usize, left: f32, top: f32 },
    Indicator(IndicatorTransform),
}

/// Events emitted by a game during `update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Render writes produced since the previous event.
    Frame(Vec<RenderUpdate>),
    /// Terminal event of a shot; emitted exactly once per completed shot.
    BallStopped(ShotResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_result_is_no_zone() {
        let r = ShotResult::default();
        assert_eq!(r.discount, 0);
        assert_eq!(r.name, "No Zone");
        assert_eq!(r.color, "gray");
        assert!(r.is_no_zone());
    }

    #[test]
    fn zone_payload_is_not_no_zone() {
        assert!(!ShotResult::new(40, "Gold Zone", "gold").is_no_zone());
    }
}
