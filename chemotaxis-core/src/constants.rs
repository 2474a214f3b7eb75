//! Default simulation constants.
//!
//! Distances are world units, times are simulated seconds.

// World dimensions
pub const WORLD_MIN_X: f64 = -52.0;
pub const WORLD_MAX_X: f64 = 52.0;
pub const WORLD_MIN_Y: f64 = -38.0;
pub const WORLD_MAX_Y: f64 = 38.0;

// Scheduling cadences
pub const CYCLE_INTERVAL_S: f64 = 0.1; // delay between perceive and decide
pub const DISPLAY_REFRESH_S: f64 = 0.1;
pub const PHYSICS_DT_S: f64 = 1.0 / 60.0;
pub const DEFAULT_TIME_SCALE: f64 = 1.0;

// Agent
pub const GENERATION_LENGTH: u32 = 100;
pub const LEARNING_RATE: f64 = 0.2;
pub const MIN_MUTATION_STEP: f64 = 0.025;
pub const AGENT_MOVE_SPEED: f64 = 10.0;
pub const MIN_ROTATION_RATE_DEG: f64 = 400.0;
pub const MAX_ROTATION_RATE_DEG: f64 = 2000.0;

// Nutrition target
pub const TARGET_RETARGET_INTERVAL_S: f64 = 2.0;
pub const TARGET_HEADING_X_RANGE: f64 = 1.0;
pub const TARGET_HEADING_Y_RANGE: f64 = 0.6; // favours horizontal travel
pub const TARGET_MIN_SPEED: f64 = 1.0;
pub const TARGET_MAX_SPEED: f64 = 6.0;

// Population
pub const DEFAULT_SPAWN_COUNT: usize = 10;
