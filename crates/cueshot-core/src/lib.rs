pub mod error;
pub mod events;
pub mod game_trait;
pub mod geometry;
pub mod snapshot;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::events::{GameEvent, ShotResult};
    use crate::game_trait::Minigame;
    use crate::geometry::{TableGeometry, Vec2};

    /// Table with a 600x600 interior and a 10 px border.
    pub fn standard_geometry() -> TableGeometry {
        TableGeometry::new(620.0, 620.0, 10.0)
    }

    /// `n` square balls of `size` pixels.
    pub fn square_balls(n: usize, size: f32) -> Vec<Vec2> {
        vec![Vec2::new(size, size); n]
    }

    /// Run `n` updates of `dt` seconds, returning all accumulated events.
    pub fn run_game_ticks(game: &mut dyn Minigame, n: usize, dt: f32) -> Vec<GameEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(game.update(dt));
        }
        all_events
    }

    /// Collect every `BallStopped` payload from a list of events.
    pub fn shot_results(events: &[GameEvent]) -> Vec<ShotResult> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::BallStopped(r) => Some(r.clone()),
                GameEvent::Frame(_) => None,
            })
            .collect()
    }

    // ================================================================
    // Minigame Contract Tests
    // ================================================================
    // Generic checks every Minigame implementation must pass. Game crates
    // call them from their own #[cfg(test)] modules.

    /// A settled game must not produce terminal events when ticked.
    pub fn contract_idle_update_emits_no_result(game: &mut dyn Minigame) {
        assert!(game.is_settled(), "game must start settled");
        let events = run_game_ticks(game, 30, 1.0 / 60.0);
        assert!(
            shot_results(&events).is_empty(),
            "idle updates must not emit a result, got {events:?}"
        );
    }

    /// After `shoot_input` is applied, ticking must eventually settle with
    /// exactly one result.
    pub fn contract_shot_settles_once(game: &mut dyn Minigame, shoot_input: &[u8], max_ticks: usize) {
        game.apply_input(shoot_input);
        assert!(!game.is_settled(), "game must be moving after a shot");
        let mut results = Vec::new();
        for _ in 0..max_ticks {
            results.extend(shot_results(&game.update(1.0 / 60.0)));
            if game.is_settled() {
                break;
            }
        }
        assert!(game.is_settled(), "shot must settle within {max_ticks} ticks");
        // Extra ticks must stay quiet.
        results.extend(shot_results(&run_game_ticks(game, 10, 1.0 / 60.0)));
        assert_eq!(results.len(), 1, "exactly one result per shot, got {results:?}");
        assert_eq!(game.last_result().as_ref(), results.first());
    }

    /// serialize → apply → serialize must be stable.
    pub fn contract_state_roundtrip_preserves(game: &mut dyn Minigame) {
        let state_a = game.serialize_state();
        assert!(!state_a.is_empty(), "serialize_state must not be empty");
        game.apply_state(&state_a);
        let state_b = game.serialize_state();
        assert_eq!(
            state_a, state_b,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// Malformed input must be ignored without changing state.
    pub fn contract_malformed_input_ignored(game: &mut dyn Minigame) {
        let before = game.serialize_state();
        game.apply_input(&[]);
        game.apply_input(&[0xc1, 0xff, 0x00]);
        let after = game.serialize_state();
        assert_eq!(before, after, "malformed input must not change state");
    }
}
