use serde::{Deserialize, Serialize};

/// Velocity multiplier applied every step (exponential decay).
pub const FRICTION: f32 = 0.98;
/// Fraction of speed kept after a wall bounce.
pub const WALL_RESTITUTION: f32 = 0.8;
/// Fraction of normal speed exchanged in a ball-ball collision.
pub const BALL_RESTITUTION: f32 = 0.95;
/// Per-axis speed below which a ball is considered stopped (px/step).
pub const STOP_THRESHOLD: f32 = 0.1;
/// Cue speed at full power, as a fraction of the interior height.
pub const SPEED_FACTOR: f32 = 0.05;
/// Highest shot power the UI offers.
pub const POWER_MAX: u8 = 10;
/// Step budget per shot before balls are force-stopped.
pub const MAX_STEPS_PER_SHOT: u32 = 20_000;

/// Tunable physics parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub friction: f32,
    pub wall_restitution: f32,
    pub ball_restitution: f32,
    pub stop_threshold: f32,
    pub speed_factor: f32,
    pub power_max: u8,
    pub max_steps_per_shot: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            friction: FRICTION,
            wall_restitution: WALL_RESTITUTION,
            ball_restitution: BALL_RESTITUTION,
            stop_threshold: STOP_THRESHOLD,
            speed_factor: SPEED_FACTOR,
            power_max: POWER_MAX,
            max_steps_per_shot: MAX_STEPS_PER_SHOT,
        }
    }
}

/// Aim indicator sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AimConfig {
    /// Longest the indicator is drawn, before `extension`.
    pub max_length: f32,
    /// Constant added so the indicator overhangs past the pointer.
    pub extension: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            max_length: 300.0,
            extension: 0.0,
        }
    }
}

/// How balls are placed on `reset`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Centered column; identical on every reset.
    #[default]
    Stacked,
    /// Column x drawn uniformly inside the interior. A seed makes it repeatable.
    Randomized { seed: Option<u64> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    /// Gap between stacked ball tops; widened if balls would overlap.
    pub vertical_offset: f32,
    /// Cue ball top as a fraction of the interior height.
    pub cue_height_fraction: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Stacked,
            vertical_offset: 60.0,
            cue_height_fraction: 0.8,
        }
    }
}

/// Top-level reward table configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableConfig {
    pub physics: PhysicsConfig,
    pub aim: AimConfig,
    pub layout: LayoutConfig,
    /// Host frame rate.
    pub tick_rate_hz: f32,
    /// Physics steps per second; the friction constants assume 60.
    pub physics_hz: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            aim: AimConfig::default(),
            layout: LayoutConfig::default(),
            tick_rate_hz: 60.0,
            physics_hz: 60.0,
        }
    }
}

impl TableConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("CUESHOT_TABLE_CONFIG")
            .unwrap_or_else(|_| "config/table.toml".to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                TableConfig::default()
            }),
            Err(_) => TableConfig::default(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TableConfig>(content)
    }
}
