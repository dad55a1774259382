use rand::Rng;
use serde::{Deserialize, Serialize};

use cueshot_core::events::ShotResult;
use cueshot_core::geometry::{TableGeometry, Vec2};

use crate::config::{LayoutConfig, LayoutMode};
use crate::zones::Zone;

/// Everything the host supplies about a table: geometry, bodies, and zones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableLayout {
    pub name: String,
    pub geometry: TableGeometry,
    /// Ball bounding-box sizes; index 0 is the cue ball.
    pub ball_sizes: Vec<Vec2>,
    /// Ordered outermost to innermost.
    pub zones: Vec<Zone>,
    /// Ball whose rest position is scored; `None` means the last ball.
    pub scoring_index: Option<usize>,
}

/// Stock table: 600x600 interior, three 40 px balls, three nested rings.
///
/// Rings share edges (Blue 60..90, Red 35..60, Gold 0..35) and are listed
/// outer to inner so the inner ring wins on a shared edge.
pub fn default_layout() -> TableLayout {
    let geometry = TableGeometry::new(620.0, 620.0, 10.0);
    let zone_center = Vec2::new(geometry.width / 2.0, geometry.height * 0.3);
    TableLayout {
        name: "Reward Table".to_string(),
        geometry,
        ball_sizes: vec![Vec2::new(40.0, 40.0); 3],
        zones: vec![
            Zone::new(
                zone_center,
                60.0,
                90.0,
                ShotResult::new(20, "Blue Zone", "blue"),
            ),
            Zone::new(
                zone_center,
                35.0,
                60.0,
                ShotResult::new(30, "Red Zone", "red"),
            ),
            Zone::new(
                zone_center,
                0.0,
                35.0,
                ShotResult::new(40, "Gold Zone", "gold"),
            ),
        ],
        scoring_index: None,
    }
}

/// Compute non-overlapping starting positions for every ball.
///
/// Balls share one column: the cue ball near the bottom, the rest stacked
/// upward `spacing` apart. If the stack would poke through the top cushion
/// it is shifted down as a whole. Every position ends inside the interior.
pub fn starting_layout<R: Rng>(
    geometry: &TableGeometry,
    sizes: &[Vec2],
    config: &LayoutConfig,
    rng: &mut R,
) -> Vec<Vec2> {
    let Some(cue) = sizes.first() else {
        return Vec::new();
    };

    let widest = sizes.iter().fold(Vec2::ZERO, |acc, s| {
        Vec2::new(acc.x.max(s.x), acc.y.max(s.y))
    });

    let (min_x, max_x) = geometry.x_range(widest);
    let column_left = match config.mode {
        LayoutMode::Stacked => geometry.border + (geometry.interior_width() - widest.x) / 2.0,
        LayoutMode::Randomized { .. } if max_x > min_x => rng.random_range(min_x..=max_x),
        LayoutMode::Randomized { .. } => min_x,
    };
    let column_center = column_left + widest.x / 2.0;

    let spacing = config.vertical_offset.max(widest.y + 1.0);
    let (min_y, _) = geometry.y_range(*cue);
    let fraction = config.cue_height_fraction.clamp(0.0, 1.0);
    let mut cue_top = geometry.border + geometry.interior_height() * fraction;
    let top_of_stack = cue_top - spacing * (sizes.len() - 1) as f32;
    if top_of_stack < min_y {
        cue_top += min_y - top_of_stack;
    }

    sizes
        .iter()
        .enumerate()
        .map(|(i, size)| {
            let raw = Vec2::new(column_center - size.x / 2.0, cue_top - spacing * i as f32);
            geometry.clamp_position(raw, *size)
        })
        .collect()
}
