use serde::{Deserialize, Serialize};

use cueshot_core::events::ShotResult;
use cueshot_core::geometry::{Rect, Vec2};

/// Annular reward zone. A disc is a ring with `inner_radius == 0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    /// Center in table-local pixels.
    pub center: Vec2,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub reward: ShotResult,
}

impl Zone {
    pub fn new(center: Vec2, inner_radius: f32, outer_radius: f32, reward: ShotResult) -> Self {
        Self {
            center,
            inner_radius,
            outer_radius,
            reward,
        }
    }

    /// Zone whose center is implied by its rendered rect.
    pub fn from_rect(rect: Rect, inner_radius: f32, outer_radius: f32, reward: ShotResult) -> Self {
        Self::new(rect.center(), inner_radius, outer_radius, reward)
    }

    /// Whether `point` lies in the ring. Both radii are inclusive.
    pub fn contains(&self, point: Vec2) -> bool {
        let d = self.center.distance(point);
        d.is_finite() && d >= self.inner_radius && d <= self.outer_radius
    }
}

/// Resolve the reward for a ball centered at `ball_center`.
///
/// Zones are tested in order and the **last** match wins, so callers list
/// zones from outermost to innermost to give the inner ring priority. At a
/// shared boundary radius two rings both match and the later one is
/// reported; ordering is therefore part of the reward rules, not a detail.
pub fn resolve_zone(zones: &[Zone], ball_center: Vec2) -> ShotResult {
    zones
        .iter()
        .rev()
        .find(|zone| zone.contains(ball_center))
        .map(|zone| zone.reward.clone())
        .unwrap_or_else(ShotResult::no_zone)
}

/// Load a zone list from a JSON file, returning `None` if the file is missing or invalid.
pub fn load_zones_from_file(path: &str) -> Option<Vec<Zone>> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Vec<Zone>>(&content) {
            Ok(zones) => Some(zones),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}");
                None
            },
        },
        Err(_) => None,
    }
}
