//! Translates engine state into presentation writes.

use cueshot_core::events::RenderUpdate;

use crate::aiming::AimingEngine;
use crate::physics::MotionEngine;

/// One `BallMoved` per ball, offsets relative to the table frame.
pub fn ball_frame(engine: &MotionEngine) -> Vec<RenderUpdate> {
    engine
        .balls()
        .iter()
        .enumerate()
        .map(|(index, ball)| RenderUpdate::BallMoved {
            index,
            left: ball.position.x,
            top: ball.position.y,
        })
        .collect()
}

pub fn indicator_update(aim: &AimingEngine) -> RenderUpdate {
    RenderUpdate::Indicator(aim.indicator())
}

/// Full redraw: every ball followed by the indicator.
pub fn full_frame(engine: &MotionEngine, aim: &AimingEngine) -> Vec<RenderUpdate> {
    let mut updates = ball_frame(engine);
    updates.push(indicator_update(aim));
    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aiming::AimInput;
    use crate::config::{LayoutConfig, PhysicsConfig};
    use cueshot_core::geometry::{TableGeometry, Vec2};

    fn engine() -> MotionEngine {
        MotionEngine::new(
            &[Vec2::new(40.0, 40.0), Vec2::new(40.0, 40.0)],
            TableGeometry::default(),
            PhysicsConfig::default(),
            LayoutConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn ball_frame_reports_every_ball_in_order() {
        let engine = engine();
        let frame = ball_frame(&engine);
        assert_eq!(frame.len(), 2);
        for (i, update) in frame.iter().enumerate() {
            let ball = &engine.balls()[i];
            assert_eq!(
                *update,
                RenderUpdate::BallMoved {
                    index: i,
                    left: ball.position.x,
                    top: ball.position.y,
                }
            );
        }
    }

    #[test]
    fn indicator_update_mirrors_aim() {
        let mut aim = AimingEngine::default();
        aim.set_anchor(Vec2::new(10.0, 10.0));
        aim.handle_input(AimInput::PointerMove { x: 10.0, y: 60.0 });
        aim.lock();
        match indicator_update(&aim) {
            RenderUpdate::Indicator(ind) => {
                assert!(ind.locked);
                assert_eq!(ind.anchor, Vec2::new(10.0, 10.0));
                assert!((ind.length - 50.0).abs() < 1e-3);
            },
            other => panic!("expected indicator, got {other:?}"),
        }
    }

    #[test]
    fn full_frame_ends_with_indicator() {
        let frame = full_frame(&engine(), &AimingEngine::default());
        assert_eq!(frame.len(), 3);
        assert!(matches!(frame.last(), Some(RenderUpdate::Indicator(_))));
    }
}
