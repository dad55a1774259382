use serde::{Deserialize, Serialize};

use cueshot_core::events::IndicatorTransform;
use cueshot_core::geometry::Vec2;

use crate::config::AimConfig;

/// Pointer and touch input, already translated into table-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AimInput {
    PointerMove { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    /// Mouse click on the table: commits the aim.
    Click,
    /// Finger lifted: commits the aim.
    TapEnd,
}

/// Serializable aim state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AimState {
    /// Degrees, `atan2` convention with Y down: 0 = right, 90 = down.
    pub angle: f32,
    pub locked: bool,
    pub indicator: IndicatorTransform,
}

/// Turns pointer positions into a shot angle and freezes it on commit.
///
/// `Unlocked --(Click | TapEnd | lock)--> Locked --(reset | unlock)--> Unlocked`
#[derive(Debug, Clone)]
pub struct AimingEngine {
    state: AimState,
    anchor: Vec2,
    config: AimConfig,
}

impl AimingEngine {
    pub fn new(config: AimConfig) -> Self {
        Self {
            state: AimState::default(),
            anchor: Vec2::ZERO,
            config,
        }
    }

    /// Bind the ball the indicator follows, by its center.
    pub fn set_anchor(&mut self, center: Vec2) {
        self.anchor = center;
        self.state.indicator.anchor = center;
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Apply one input event. Returns whether the aim state changed.
    pub fn handle_input(&mut self, input: AimInput) -> bool {
        match input {
            AimInput::PointerMove { x, y } | AimInput::TouchMove { x, y } => {
                self.track(Vec2::new(x, y))
            },
            AimInput::Click | AimInput::TapEnd => {
                let was_locked = self.state.locked;
                self.lock();
                !was_locked
            },
        }
    }

    fn track(&mut self, pointer: Vec2) -> bool {
        if self.state.locked || !pointer.is_finite() {
            return false;
        }
        let delta = pointer - self.anchor;
        let distance = delta.length();
        // atan2(0, 0) is 0; keep the previous angle instead of snapping right.
        if distance > 0.0 {
            self.state.angle = delta.y.atan2(delta.x).to_degrees();
        }
        let max_length = self.config.max_length.max(0.0);
        self.state.indicator = IndicatorTransform {
            length: distance.min(max_length) + self.config.extension,
            rotation_deg: self.state.angle,
            anchor: self.anchor,
            locked: false,
        };
        true
    }

    pub fn lock(&mut self) {
        self.state.locked = true;
        self.state.indicator.locked = true;
    }

    pub fn unlock(&mut self) {
        self.state.locked = false;
        self.state.indicator.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.state.locked
    }

    /// Last computed angle in degrees.
    pub fn angle(&self) -> f32 {
        self.state.angle
    }

    /// Start a new shot cycle: unlock, keep the angle.
    pub fn reset(&mut self) {
        self.unlock();
    }

    pub fn indicator(&self) -> IndicatorTransform {
        self.state.indicator
    }

    pub fn state(&self) -> AimState {
        self.state
    }

    pub fn restore(&mut self, state: AimState) {
        if state.angle.is_finite() {
            self.state = state;
            self.anchor = state.indicator.anchor;
        }
    }
}

impl Default for AimingEngine {
    fn default() -> Self {
        Self::new(AimConfig::default())
    }
}
