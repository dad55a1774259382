pub mod aiming;
pub mod config;
pub mod physics;
pub mod render;
pub mod table;
pub mod zones;

use serde::{Deserialize, Serialize};

use cueshot_core::error::EngineError;
use cueshot_core::events::{GameEvent, ShotResult};
use cueshot_core::game_trait::{GameMetadata, Minigame};
use cueshot_core::geometry::TableGeometry;
use cueshot_core::snapshot;
use cueshot_core::time::FixedTimestep;

use aiming::{AimInput, AimState, AimingEngine};
use config::TableConfig;
use physics::{BallState, BallStopCallback, GeometryUpdate, MotionEngine, StepOutcome};
use table::{TableLayout, default_layout};
use zones::Zone;

/// Commands accepted by the table, typed or MessagePack-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableInput {
    Aim(AimInput),
    LockAim,
    /// Lock the aim and strike the cue ball along it.
    Shoot { power: u8 },
    Reset,
    Resize(TableGeometry),
    SetZones(Vec<Zone>),
}

/// Serializable session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub balls: Vec<BallState>,
    pub shot_active: bool,
    pub aim: AimState,
    pub last_result: Option<ShotResult>,
    pub shots_taken: u32,
}

/// The reward table minigame: one motion engine plus one aiming engine.
pub struct RewardTable {
    name: String,
    engine: MotionEngine,
    aim: AimingEngine,
    timestep: FixedTimestep,
    tick_rate_hz: f32,
    last_result: Option<ShotResult>,
    shots_taken: u32,
    /// Indicator changed since the last frame.
    indicator_dirty: bool,
    /// Ball positions changed outside of stepping (reset, resize, restore).
    balls_dirty: bool,
}

impl RewardTable {
    /// Stock table with config from [`TableConfig::load`].
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(TableConfig::load(), default_layout())
    }

    pub fn with_config(config: TableConfig, layout: TableLayout) -> Result<Self, EngineError> {
        let mut engine = MotionEngine::new(
            &layout.ball_sizes,
            layout.geometry,
            config.physics,
            config.layout,
        )?;
        if let Some(index) = layout.scoring_index {
            engine.set_scoring_index(index)?;
        }
        engine.set_zones(layout.zones);

        let physics_hz = positive_or(config.physics_hz, 60.0);
        let mut table = Self {
            name: layout.name,
            engine,
            aim: AimingEngine::new(config.aim),
            timestep: FixedTimestep::new(1.0 / physics_hz),
            tick_rate_hz: positive_or(config.tick_rate_hz, 60.0),
            last_result: None,
            shots_taken: 0,
            indicator_dirty: true,
            balls_dirty: true,
        };
        table.anchor_aim();
        Ok(table)
    }

    pub fn engine(&self) -> &MotionEngine {
        &self.engine
    }

    pub fn aim(&self) -> &AimingEngine {
        &self.aim
    }

    pub fn shots_taken(&self) -> u32 {
        self.shots_taken
    }

    /// Forwarded to [`MotionEngine::set_on_ball_stop`].
    pub fn set_on_ball_stop(&mut self, callback: BallStopCallback) {
        self.engine.set_on_ball_stop(callback);
    }

    /// Apply a typed command.
    pub fn handle_input(&mut self, input: TableInput) -> Result<(), EngineError> {
        match input {
            TableInput::Aim(event) => {
                if self.aim.handle_input(event) {
                    self.indicator_dirty = true;
                }
            },
            TableInput::LockAim => {
                self.aim.lock();
                self.indicator_dirty = true;
            },
            TableInput::Shoot { power } => {
                self.aim.lock();
                self.indicator_dirty = true;
                self.engine.shoot(self.aim.angle(), power)?;
                self.shots_taken += 1;
            },
            TableInput::Reset => {
                self.engine.reset(self.engine.latest_geometry())?;
                self.timestep.clear();
                self.aim.reset();
                self.anchor_aim();
            },
            TableInput::Resize(geometry) => {
                if self.engine.refresh_geometry(geometry)? == GeometryUpdate::Applied {
                    self.anchor_aim();
                }
            },
            TableInput::SetZones(zones) => self.engine.set_zones(zones),
        }
        Ok(())
    }

    fn anchor_aim(&mut self) {
        self.aim.set_anchor(self.engine.cue_ball().center());
        self.indicator_dirty = true;
        self.balls_dirty = true;
    }

    fn state(&self) -> TableState {
        TableState {
            balls: self.engine.balls().to_vec(),
            shot_active: self.engine.is_running(),
            aim: self.aim.state(),
            last_result: self.last_result.clone(),
            shots_taken: self.shots_taken,
        }
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        tracing::warn!(value, fallback, "Rate must be positive, using fallback");
        fallback
    }
}

impl Minigame for RewardTable {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: self.name.clone(),
            description: "Aim, shoot, and land the ball in a zone to win a discount.".to_string(),
            ball_count: self.engine.balls().len(),
            zone_count: self.engine.zones().len(),
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut moved = false;
        let mut settled = None;

        if self.engine.is_running() {
            let steps = self.timestep.accumulate(dt);
            for _ in 0..steps {
                match self.engine.step() {
                    StepOutcome::Idle => break,
                    StepOutcome::Running => moved = true,
                    StepOutcome::Settled(result) => {
                        moved = true;
                        settled = Some(result);
                        break;
                    },
                }
            }
        }

        if let Some(result) = &settled {
            self.timestep.clear();
            self.last_result = Some(result.clone());
            self.aim.reset();
            self.anchor_aim();
        }

        let mut updates = Vec::new();
        if moved || self.balls_dirty {
            updates.extend(render::ball_frame(&self.engine));
        }
        if self.indicator_dirty {
            updates.push(render::indicator_update(&self.aim));
        }
        self.balls_dirty = false;
        self.indicator_dirty = false;

        let mut events = Vec::new();
        if !updates.is_empty() {
            events.push(GameEvent::Frame(updates));
        }
        if let Some(result) = settled {
            events.push(GameEvent::BallStopped(result));
        }
        events
    }

    fn apply_input(&mut self, input: &[u8]) {
        let command: TableInput = match snapshot::decode(input) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "Dropped malformed table input");
                return;
            },
        };
        if let Err(e) = self.handle_input(command) {
            tracing::debug!(error = %e, "Rejected table input");
        }
    }

    fn serialize_state(&self) -> Vec<u8> {
        match snapshot::encode(&self.state()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize table state");
                Vec::new()
            },
        }
    }

    fn apply_state(&mut self, state: &[u8]) {
        match snapshot::decode::<TableState>(state) {
            Ok(s) => {
                self.engine.restore(&s.balls, s.shot_active);
                self.aim.restore(s.aim);
                self.last_result = s.last_result;
                self.shots_taken = s.shots_taken;
                self.indicator_dirty = true;
                self.balls_dirty = true;
            },
            Err(e) => tracing::debug!(error = %e, "Ignored invalid table state"),
        }
    }

    fn is_settled(&self) -> bool {
        !self.engine.is_running()
    }

    fn last_result(&self) -> Option<ShotResult> {
        self.last_result.clone()
    }

    fn tick_rate(&self) -> f32 {
        self.tick_rate_hz
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use cueshot_core::events::RenderUpdate;
    use cueshot_core::geometry::Vec2;
    use cueshot_core::test_helpers::{
        contract_idle_update_emits_no_result, contract_malformed_input_ignored,
        contract_shot_settles_once, contract_state_roundtrip_preserves, run_game_ticks,
        shot_results, square_balls, standard_geometry,
    };

    fn stock_table() -> RewardTable {
        RewardTable::with_config(TableConfig::default(), default_layout()).unwrap()
    }

    fn encode(input: &TableInput) -> Vec<u8> {
        snapshot::encode(input).unwrap()
    }

    /// Tick until settled, returning every event seen.
    fn run_to_rest(table: &mut RewardTable) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..30_000 {
            events.extend(table.update(1.0 / 60.0));
            if table.is_settled() {
                break;
            }
        }
        assert!(table.is_settled(), "table never settled");
        events
    }

    // ---- Minigame contract ----

    #[test]
    fn contract_idle() {
        contract_idle_update_emits_no_result(&mut stock_table());
    }

    #[test]
    fn contract_shot() {
        let shoot = encode(&TableInput::Shoot { power: 10 });
        contract_shot_settles_once(&mut stock_table(), &shoot, 30_000);
    }

    #[test]
    fn contract_roundtrip() {
        contract_state_roundtrip_preserves(&mut stock_table());
    }

    #[test]
    fn contract_roundtrip_mid_shot() {
        let mut table = stock_table();
        table.handle_input(TableInput::Shoot { power: 7 }).unwrap();
        run_game_ticks(&mut table, 5, 1.0 / 60.0);
        contract_state_roundtrip_preserves(&mut table);
    }

    #[test]
    fn contract_malformed() {
        contract_malformed_input_ignored(&mut stock_table());
    }

    // ---- Session behaviour ----

    #[test]
    fn metadata_reports_layout() {
        let meta = stock_table().metadata();
        assert_eq!(meta.name, "Reward Table");
        assert_eq!(meta.ball_count, 3);
        assert_eq!(meta.zone_count, 3);
    }

    #[test]
    fn first_update_draws_everything() {
        let mut table = stock_table();
        let events = table.update(1.0 / 60.0);
        match events.as_slice() {
            [GameEvent::Frame(updates)] => {
                assert_eq!(updates.len(), 4, "three balls and the indicator");
            },
            other => panic!("expected one frame, got {other:?}"),
        }
        assert!(table.update(1.0 / 60.0).is_empty(), "nothing changed");
    }

    #[test]
    fn aim_anchors_on_cue_ball() {
        let table = stock_table();
        assert_eq!(table.aim().anchor(), table.engine().cue_ball().center());
    }

    #[test]
    fn shoot_locks_aim_and_uses_its_angle() {
        let mut table = stock_table();
        let anchor = table.aim().anchor();
        // Pointer below the ball: angle 90, so the ball travels up.
        table
            .handle_input(TableInput::Aim(AimInput::PointerMove {
                x: anchor.x,
                y: anchor.y + 50.0,
            }))
            .unwrap();
        table.handle_input(TableInput::Shoot { power: 10 }).unwrap();

        assert!(table.aim().is_locked());
        let cue = table.engine().cue_ball();
        assert!(cue.velocity.y < 0.0, "cue should travel up, got {:?}", cue.velocity);
        assert!(cue.velocity.x.abs() < 1e-3);
        assert_eq!(table.shots_taken(), 1);
    }

    #[test]
    fn pointer_moves_during_shot_do_not_change_angle() {
        let mut table = stock_table();
        table.handle_input(TableInput::Shoot { power: 5 }).unwrap();
        let angle = table.aim().angle();
        for i in 0..10 {
            table
                .handle_input(TableInput::Aim(AimInput::PointerMove {
                    x: i as f32 * 37.0,
                    y: 500.0 - i as f32 * 11.0,
                }))
                .unwrap();
            table.update(1.0 / 60.0);
        }
        assert_eq!(table.aim().angle(), angle);
    }

    #[test]
    fn settle_unlocks_aim_and_reanchors() {
        let mut table = stock_table();
        table.handle_input(TableInput::Shoot { power: 10 }).unwrap();
        let events = run_to_rest(&mut table);

        let results = shot_results(&events);
        assert_eq!(results.len(), 1);
        assert_eq!(table.last_result(), results.first().cloned());
        assert!(!table.aim().is_locked());
        assert_eq!(table.aim().anchor(), table.engine().cue_ball().center());
    }

    #[test]
    fn frame_precedes_ball_stopped() {
        let mut table = stock_table();
        table.handle_input(TableInput::Shoot { power: 3 }).unwrap();
        let events = run_to_rest(&mut table);
        let last_two = &events[events.len() - 2..];
        assert!(matches!(last_two[0], GameEvent::Frame(_)));
        assert!(matches!(last_two[1], GameEvent::BallStopped(_)));
    }

    #[test]
    fn moving_frames_report_balls() {
        let mut table = stock_table();
        table.update(1.0 / 60.0);
        table.handle_input(TableInput::Shoot { power: 10 }).unwrap();
        let events = table.update(1.0 / 60.0);
        let Some(GameEvent::Frame(updates)) = events.first() else {
            panic!("expected a frame, got {events:?}");
        };
        let cue = table.engine().cue_ball().position;
        assert!(updates.contains(&RenderUpdate::BallMoved {
            index: 0,
            left: cue.x,
            top: cue.y,
        }));
    }

    #[test]
    fn reset_restores_layout_and_unlocks() {
        let mut table = stock_table();
        let start: Vec<Vec2> = table.engine().balls().iter().map(|b| b.position).collect();
        table.handle_input(TableInput::Shoot { power: 10 }).unwrap();
        run_game_ticks(&mut table, 20, 1.0 / 60.0);

        table.handle_input(TableInput::Reset).unwrap();
        assert!(table.is_settled());
        assert!(!table.aim().is_locked());
        let now: Vec<Vec2> = table.engine().balls().iter().map(|b| b.position).collect();
        assert_eq!(start, now);

        let events = run_game_ticks(&mut table, 100, 1.0 / 60.0);
        assert!(shot_results(&events).is_empty(), "cancelled shot must not report");
    }

    #[test]
    fn resize_mid_shot_is_deferred_until_settle() {
        let mut table = stock_table();
        table.handle_input(TableInput::Shoot { power: 10 }).unwrap();
        let smaller = TableGeometry::new(420.0, 420.0, 10.0);
        table.handle_input(TableInput::Resize(smaller)).unwrap();
        assert_eq!(table.engine().geometry(), standard_geometry());

        run_to_rest(&mut table);
        assert_eq!(table.engine().geometry(), smaller);
        for ball in table.engine().balls() {
            let (min_x, max_x) = smaller.x_range(ball.size);
            assert!(ball.position.x >= min_x && ball.position.x <= max_x);
        }
    }

    #[test]
    fn invalid_resize_is_rejected() {
        let mut table = stock_table();
        let bad = TableGeometry::new(f32::NAN, 100.0, 10.0);
        assert_eq!(
            table.handle_input(TableInput::Resize(bad)),
            Err(EngineError::InvalidGeometry)
        );
    }

    #[test]
    fn encoded_input_drives_the_table() {
        let mut table = stock_table();
        table.apply_input(&encode(&TableInput::LockAim));
        assert!(table.aim().is_locked());
        table.apply_input(&encode(&TableInput::SetZones(Vec::new())));
        assert_eq!(table.engine().zones().len(), 0);
    }

    #[test]
    fn empty_zone_list_reports_no_zone() {
        let mut table = stock_table();
        table.handle_input(TableInput::SetZones(Vec::new())).unwrap();
        table.handle_input(TableInput::Shoot { power: 4 }).unwrap();
        let results = shot_results(&run_to_rest(&mut table));
        assert_eq!(results, vec![ShotResult::no_zone()]);
    }

    #[test]
    fn callback_sees_the_same_result_as_the_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut table = stock_table();
        table.set_on_ball_stop(Box::new(move |r| sink.lock().unwrap().push(r.clone())));
        table.handle_input(TableInput::Shoot { power: 6 }).unwrap();
        let results = shot_results(&run_to_rest(&mut table));
        assert_eq!(*seen.lock().unwrap(), results);
    }

    #[test]
    fn single_ball_table_scores_the_cue_ball() {
        let layout = TableLayout {
            ball_sizes: square_balls(1, 50.0),
            ..default_layout()
        };
        let mut table = RewardTable::with_config(TableConfig::default(), layout).unwrap();
        assert_eq!(table.engine().scoring_index(), 0);
        table.handle_input(TableInput::Shoot { power: 10 }).unwrap();
        assert_eq!(shot_results(&run_to_rest(&mut table)).len(), 1);
    }

    #[test]
    fn bad_scoring_index_is_rejected() {
        let layout = TableLayout {
            scoring_index: Some(9),
            ..default_layout()
        };
        assert!(matches!(
            RewardTable::with_config(TableConfig::default(), layout),
            Err(EngineError::ScoringIndexOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn zero_physics_rate_falls_back() {
        let config = TableConfig {
            physics_hz: 0.0,
            tick_rate_hz: -5.0,
            ..TableConfig::default()
        };
        let table = RewardTable::with_config(config, default_layout()).unwrap();
        assert_eq!(table.tick_rate(), 60.0);
    }
}
