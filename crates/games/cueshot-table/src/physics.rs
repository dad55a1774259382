use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use cueshot_core::error::EngineError;
use cueshot_core::events::ShotResult;
use cueshot_core::geometry::{TableGeometry, Vec2};

use crate::config::{LayoutConfig, LayoutMode, PhysicsConfig};
use crate::table::starting_layout;
use crate::zones::{Zone, resolve_zone};

/// Overlap (px) below which touching balls are left alone.
const CONTACT_SLOP: f32 = 1e-3;
/// Center distance below which two balls are treated as coincident.
const COINCIDENT_EPSILON: f32 = 1e-6;

/// State of a single ball on the table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BallState {
    /// Top-left corner, table-local.
    pub position: Vec2,
    /// Pixels per step.
    pub velocity: Vec2,
    /// Bounding box; fixed at creation.
    pub size: Vec2,
    pub stopped: bool,
}

impl BallState {
    pub fn new(size: Vec2) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size,
            stopped: true,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Balls collide as circles sized from their bounding box width.
    pub fn radius(&self) -> f32 {
        self.size.x / 2.0
    }

    fn below_threshold(&self, threshold: f32) -> bool {
        self.velocity.x.abs() < threshold && self.velocity.y.abs() < threshold
    }
}

/// What a single `step` did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// No shot in progress; nothing moved.
    Idle,
    /// At least one ball is still moving.
    Running,
    /// Every ball came to rest on this step. Emitted once per shot.
    Settled(ShotResult),
}

/// Whether a geometry refresh took effect now or waits for the shot to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryUpdate {
    Applied,
    Deferred,
}

/// Terminal callback invoked once per completed shot.
pub type BallStopCallback = Box<dyn FnMut(&ShotResult) + Send>;

/// Owns every ball's position and velocity and advances them one step at a
/// time. The host calls [`MotionEngine::step`] once per physics tick; there
/// is no self-scheduling, so cancelling a shot is just clearing a flag.
pub struct MotionEngine {
    balls: Vec<BallState>,
    geometry: TableGeometry,
    pending_geometry: Option<TableGeometry>,
    zones: Vec<Zone>,
    scoring_index: usize,
    config: PhysicsConfig,
    layout: LayoutConfig,
    rng: StdRng,
    on_ball_stop: Option<BallStopCallback>,
    shot_active: bool,
    steps_taken: u32,
}

impl MotionEngine {
    /// Create an engine for balls of the given sizes. Index 0 is the cue
    /// ball; the last ball is scored unless [`set_scoring_index`] says
    /// otherwise. Balls start in the configured layout, at rest.
    ///
    /// [`set_scoring_index`]: MotionEngine::set_scoring_index
    pub fn new(
        sizes: &[Vec2],
        geometry: TableGeometry,
        config: PhysicsConfig,
        layout: LayoutConfig,
    ) -> Result<Self, EngineError> {
        if sizes.is_empty() {
            return Err(EngineError::NoBalls);
        }
        if let Some(index) = sizes
            .iter()
            .position(|s| !s.is_finite() || s.x < 0.0 || s.y < 0.0)
        {
            return Err(EngineError::InvalidBallSize { index });
        }
        if !geometry.is_valid() {
            return Err(EngineError::InvalidGeometry);
        }

        let rng = match layout.mode {
            LayoutMode::Randomized { seed: Some(seed) } => StdRng::seed_from_u64(seed),
            _ => StdRng::from_os_rng(),
        };

        let mut engine = Self {
            balls: sizes.iter().map(|&s| BallState::new(s)).collect(),
            geometry,
            pending_geometry: None,
            zones: Vec::new(),
            scoring_index: sizes.len() - 1,
            config,
            layout,
            rng,
            on_ball_stop: None,
            shot_active: false,
            steps_taken: 0,
        };
        engine.place_balls();
        Ok(engine)
    }

    pub fn set_scoring_index(&mut self, index: usize) -> Result<(), EngineError> {
        if index >= self.balls.len() {
            return Err(EngineError::ScoringIndexOutOfRange {
                index,
                ball_count: self.balls.len(),
            });
        }
        self.scoring_index = index;
        Ok(())
    }

    pub fn set_on_ball_stop(&mut self, callback: BallStopCallback) {
        self.on_ball_stop = Some(callback);
    }

    /// Replace the reward zones. Takes effect on the next rest check.
    pub fn set_zones(&mut self, zones: Vec<Zone>) {
        self.zones = zones;
    }

    /// Take a new geometry snapshot. Applied immediately when idle; while a
    /// shot is in flight it is held back and applied once the shot settles.
    pub fn refresh_geometry(
        &mut self,
        geometry: TableGeometry,
    ) -> Result<GeometryUpdate, EngineError> {
        if !geometry.is_valid() {
            return Err(EngineError::InvalidGeometry);
        }
        if self.shot_active {
            tracing::debug!(?geometry, "Deferring geometry refresh until shot settles");
            self.pending_geometry = Some(geometry);
            return Ok(GeometryUpdate::Deferred);
        }
        self.apply_geometry(geometry);
        Ok(GeometryUpdate::Applied)
    }

    /// Cancel any shot in flight, adopt `geometry`, and rack the balls.
    pub fn reset(&mut self, geometry: TableGeometry) -> Result<(), EngineError> {
        if !geometry.is_valid() {
            return Err(EngineError::InvalidGeometry);
        }
        if self.shot_active {
            tracing::debug!(steps = self.steps_taken, "Reset cancelled shot in flight");
        }
        self.cancel_shot();
        self.pending_geometry = None;
        self.geometry = geometry;
        self.place_balls();
        Ok(())
    }

    /// Strike the cue ball. The aim angle points back toward the player, so
    /// the ball travels the opposite way (`angle + 180°`).
    ///
    /// `power` is clamped to `1..=power_max`. Any shot already in flight is
    /// replaced; balls it set moving keep their current velocity.
    pub fn shoot(&mut self, angle_deg: f32, power: u8) -> Result<(), EngineError> {
        if !angle_deg.is_finite() {
            return Err(EngineError::NonFiniteAngle);
        }
        let power_max = self.config.power_max.max(1);
        let clamped = power.clamp(1, power_max);
        if clamped != power {
            tracing::warn!(power, clamped, "Shot power out of range, clamping");
        }
        if self.shot_active {
            tracing::debug!(steps = self.steps_taken, "New shot replaces shot in flight");
        }
        self.cancel_shot();

        let base_speed = self.geometry.interior_height() * self.config.speed_factor;
        let speed = base_speed * clamped as f32 / power_max as f32;
        let rad = (angle_deg + 180.0).to_radians();

        let cue = &mut self.balls[0];
        cue.velocity = Vec2::new(speed * rad.cos(), speed * rad.sin());
        cue.stopped = false;
        self.shot_active = true;

        tracing::debug!(
            angle_deg,
            power = clamped,
            speed,
            expected_steps = ?steps_until_rest(speed, self.config.friction, self.config.stop_threshold),
            "Shot started"
        );
        Ok(())
    }

    /// Advance the simulation by one step.
    pub fn step(&mut self) -> StepOutcome {
        if !self.shot_active {
            return StepOutcome::Idle;
        }
        self.steps_taken += 1;

        let friction = self.config.friction;
        let wall_restitution = self.config.wall_restitution;
        let threshold = self.config.stop_threshold;

        for ball in self.balls.iter_mut().filter(|b| !b.stopped) {
            ball.velocity = ball.velocity * friction;
            ball.position += ball.velocity;
            bounce_off_walls(ball, &self.geometry, wall_restitution);
            if ball.below_threshold(threshold) {
                ball.stopped = true;
                ball.velocity = Vec2::ZERO;
            }
        }

        self.resolve_collisions();

        // Positional correction may have pushed a ball into a cushion.
        for ball in &mut self.balls {
            bounce_off_walls(ball, &self.geometry, wall_restitution);
        }

        if self.steps_taken >= self.config.max_steps_per_shot
            && self.balls.iter().any(|b| !b.stopped)
        {
            tracing::warn!(
                steps = self.steps_taken,
                "Shot exceeded step budget, forcing balls to rest"
            );
            for ball in &mut self.balls {
                ball.stopped = true;
                ball.velocity = Vec2::ZERO;
            }
        }

        if self.balls.iter().all(|b| b.stopped) {
            StepOutcome::Settled(self.settle())
        } else {
            StepOutcome::Running
        }
    }

    fn resolve_collisions(&mut self) {
        let restitution = self.config.ball_restitution;
        for j in 1..self.balls.len() {
            let (head, tail) = self.balls.split_at_mut(j);
            let b = &mut tail[0];
            for a in head.iter_mut() {
                resolve_pair(a, b, restitution);
            }
        }
    }

    fn settle(&mut self) -> ShotResult {
        let scoring = &self.balls[self.scoring_index];
        let result = resolve_zone(&self.zones, scoring.center());
        self.shot_active = false;
        tracing::info!(
            steps = self.steps_taken,
            zone = %result.name,
            discount = result.discount,
            "Shot settled"
        );
        if let Some(callback) = self.on_ball_stop.as_mut() {
            callback(&result);
        }
        if let Some(geometry) = self.pending_geometry.take() {
            self.apply_geometry(geometry);
        }
        result
    }

    fn cancel_shot(&mut self) {
        self.shot_active = false;
        self.steps_taken = 0;
    }

    fn apply_geometry(&mut self, geometry: TableGeometry) {
        self.geometry = geometry;
        for ball in &mut self.balls {
            ball.position = geometry.clamp_position(ball.position, ball.size);
        }
    }

    fn place_balls(&mut self) {
        let sizes: Vec<Vec2> = self.balls.iter().map(|b| b.size).collect();
        let positions = starting_layout(&self.geometry, &sizes, &self.layout, &mut self.rng);
        for (ball, position) in self.balls.iter_mut().zip(positions) {
            ball.position = position;
            ball.velocity = Vec2::ZERO;
            ball.stopped = true;
        }
    }

    pub fn balls(&self) -> &[BallState] {
        &self.balls
    }

    pub fn ball(&self, index: usize) -> Option<&BallState> {
        self.balls.get(index)
    }

    pub fn cue_ball(&self) -> &BallState {
        &self.balls[0]
    }

    pub fn geometry(&self) -> TableGeometry {
        self.geometry
    }

    /// The geometry the next reset should use: a deferred snapshot if one
    /// is waiting, otherwise the current one.
    pub fn latest_geometry(&self) -> TableGeometry {
        self.pending_geometry.unwrap_or(self.geometry)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn scoring_index(&self) -> usize {
        self.scoring_index
    }

    pub fn is_running(&self) -> bool {
        self.shot_active
    }

    pub fn steps_taken(&self) -> u32 {
        self.steps_taken
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Overwrite ball state from a snapshot. Sizes are kept; extra or
    /// missing entries are ignored.
    pub fn restore(&mut self, balls: &[BallState], shot_active: bool) {
        for (ball, saved) in self.balls.iter_mut().zip(balls) {
            ball.position = self.geometry.clamp_position(saved.position, ball.size);
            ball.velocity = if saved.velocity.is_finite() {
                saved.velocity
            } else {
                Vec2::ZERO
            };
            ball.stopped = saved.stopped;
        }
        self.shot_active = shot_active;
    }
}

/// Clamp a ball into the interior and reflect any velocity component that
/// points through the cushion it touches.
fn bounce_off_walls(ball: &mut BallState, geometry: &TableGeometry, restitution: f32) {
    let (min_x, max_x) = geometry.x_range(ball.size);
    let (min_y, max_y) = geometry.y_range(ball.size);

    if ball.position.x <= min_x {
        ball.position.x = min_x;
        if ball.velocity.x < 0.0 {
            ball.velocity.x = -ball.velocity.x * restitution;
        }
    } else if ball.position.x >= max_x {
        ball.position.x = max_x;
        if ball.velocity.x > 0.0 {
            ball.velocity.x = -ball.velocity.x * restitution;
        }
    }

    if ball.position.y <= min_y {
        ball.position.y = min_y;
        if ball.velocity.y < 0.0 {
            ball.velocity.y = -ball.velocity.y * restitution;
        }
    } else if ball.position.y >= max_y {
        ball.position.y = max_y;
        if ball.velocity.y > 0.0 {
            ball.velocity.y = -ball.velocity.y * restitution;
        }
    }
}

/// Resolve an overlapping pair along the line of centers. Returns whether
/// the pair was in contact.
fn resolve_pair(a: &mut BallState, b: &mut BallState, restitution: f32) -> bool {
    let delta = b.center() - a.center();
    let distance = delta.length();
    let min_distance = a.radius() + b.radius();

    // Written so a NaN distance never counts as contact.
    if !(distance < min_distance) || min_distance - distance <= CONTACT_SLOP {
        return false;
    }

    let normal = if distance > COINCIDENT_EPSILON {
        delta * (1.0 / distance)
    } else {
        Vec2::new(1.0, 0.0)
    };
    let tangent = Vec2::new(-normal.y, normal.x);

    let v1n = a.velocity.dot(normal);
    let v1t = a.velocity.dot(tangent);
    let v2n = b.velocity.dot(normal);
    let v2t = b.velocity.dot(tangent);

    // Only exchange momentum while closing; a separating pair just gets
    // pushed apart.
    let closing = v2n - v1n < 0.0;
    if closing {
        a.velocity = normal * (v2n * restitution) + tangent * v1t;
        b.velocity = normal * (v1n * restitution) + tangent * v2t;
    }

    let correction = normal * ((min_distance - distance) / 2.0);
    a.position -= correction;
    b.position += correction;

    // Two resting balls nudged apart stay at rest; any contact involving
    // motion puts both back into the simulation.
    if closing || !a.stopped || !b.stopped {
        a.stopped = false;
        b.stopped = false;
    }
    true
}

/// Steps of pure friction decay until both velocity components of a ball
/// moving at `speed` fall under `threshold`. `None` when friction does not
/// decay (outside `(0, 1)`).
pub fn steps_until_rest(speed: f32, friction: f32, threshold: f32) -> Option<u32> {
    if !(friction > 0.0 && friction < 1.0) || !speed.is_finite() {
        return None;
    }
    let speed = speed.abs();
    if speed < threshold {
        return Some(0);
    }
    if threshold <= 0.0 {
        return None;
    }
    // Smallest n with speed * friction^n < threshold.
    let steps = ((threshold / speed).ln() / friction.ln()).floor();
    Some(steps.max(0.0) as u32 + 1)
}
