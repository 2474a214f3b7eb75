use serde::{Deserialize, Serialize};

use crate::constants::{
    AGENT_MOVE_SPEED, CYCLE_INTERVAL_S, DEFAULT_TIME_SCALE, DISPLAY_REFRESH_S, GENERATION_LENGTH,
    LEARNING_RATE, MAX_ROTATION_RATE_DEG, MIN_MUTATION_STEP, MIN_ROTATION_RATE_DEG, PHYSICS_DT_S,
    TARGET_HEADING_X_RANGE, TARGET_HEADING_Y_RANGE, TARGET_MAX_SPEED, TARGET_MIN_SPEED,
    TARGET_RETARGET_INTERVAL_S,
};
use crate::error::SimError;
use crate::geometry::{Bounds, Vec2};
use crate::sim::SimTime;

/// How bias is pulled back toward `[0, 1]` after a mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasBounds {
    /// Bounce back by one learning-rate step; may still leave `[0, 1]`.
    #[default]
    Soft,
    /// Clamp into `[0, 1]`.
    Hard,
}

/// How the aggregator decides a generation boundary has happened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Watch the oldest agent's generation counter and average whatever the
    /// totals hold at that moment over the whole population.
    #[default]
    SampledAgent,
    /// Bucket reports per generation and publish a generation only once the
    /// slowest agent has completed it.
    Rendezvous,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub start: Vec2,
    pub retarget_interval_s: f64,
    pub heading_x_range: f64,
    pub heading_y_range: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            start: Vec2::ZERO,
            retarget_interval_s: TARGET_RETARGET_INTERVAL_S,
            heading_x_range: TARGET_HEADING_X_RANGE,
            heading_y_range: TARGET_HEADING_Y_RANGE,
            min_speed: TARGET_MIN_SPEED,
            max_speed: TARGET_MAX_SPEED,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub generation_length: u32,
    pub learning_rate: f64,
    pub min_mutation_step: f64,
    pub move_speed: f64,
    pub min_rotation_rate_deg: f64,
    pub max_rotation_rate_deg: f64,
    pub bias_bounds: BiasBounds,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            generation_length: GENERATION_LENGTH,
            learning_rate: LEARNING_RATE,
            min_mutation_step: MIN_MUTATION_STEP,
            move_speed: AGENT_MOVE_SPEED,
            min_rotation_rate_deg: MIN_ROTATION_RATE_DEG,
            max_rotation_rate_deg: MAX_ROTATION_RATE_DEG,
            bias_bounds: BiasBounds::Soft,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub bounds: Bounds,
    /// `None` models a scene without a nutrition source; `Simulation::new`
    /// rejects it.
    pub target: Option<TargetConfig>,
    pub agent: AgentConfig,
    pub cycle_interval_s: f64,
    pub physics_dt_s: f64,
    pub display_refresh_s: f64,
    pub time_scale: f64,
    pub aggregation: AggregationMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            target: Some(TargetConfig::default()),
            agent: AgentConfig::default(),
            cycle_interval_s: CYCLE_INTERVAL_S,
            physics_dt_s: PHYSICS_DT_S,
            display_refresh_s: DISPLAY_REFRESH_S,
            time_scale: DEFAULT_TIME_SCALE,
            aggregation: AggregationMode::SampledAgent,
        }
    }
}

pub const PRESET_NAMES: [&str; 2] = ["classic", "strict"];

impl SimConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::default()),
            "strict" => Some(Self {
                agent: AgentConfig {
                    bias_bounds: BiasBounds::Hard,
                    ..AgentConfig::default()
                },
                aggregation: AggregationMode::Rendezvous,
                ..Self::default()
            }),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !self.bounds.is_valid() {
            return Err(SimError::InvalidBounds {
                min_x: self.bounds.min_x,
                max_x: self.bounds.max_x,
                min_y: self.bounds.min_y,
                max_y: self.bounds.max_y,
            });
        }

        let target = self.target.as_ref().ok_or(SimError::MissingTarget)?;
        if !self.bounds.contains(target.start) {
            return Err(SimError::TargetOutsideBounds {
                x: target.start.x,
                y: target.start.y,
            });
        }
        check_interval("target.retarget_interval_s", target.retarget_interval_s)?;
        check_range("target.speed", target.min_speed, target.max_speed)?;
        check_range("target.heading_x", 0.0, target.heading_x_range)?;
        check_range("target.heading_y", 0.0, target.heading_y_range)?;

        check_interval("cycle_interval_s", self.cycle_interval_s)?;
        check_interval("physics_dt_s", self.physics_dt_s)?;
        check_interval("display_refresh_s", self.display_refresh_s)?;
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(SimError::InvalidTimeScale {
                value: self.time_scale,
            });
        }

        let agent = &self.agent;
        if agent.generation_length == 0 {
            return Err(SimError::InvalidGenerationLength {
                value: agent.generation_length,
            });
        }
        if !agent.learning_rate.is_finite() || agent.learning_rate <= 0.0 {
            return Err(SimError::InvalidLearningRate {
                value: agent.learning_rate,
            });
        }
        check_range(
            "agent.mutation_step",
            agent.min_mutation_step,
            agent.learning_rate,
        )?;
        check_range(
            "agent.rotation_rate_deg",
            agent.min_rotation_rate_deg,
            agent.max_rotation_rate_deg,
        )?;
        check_range("agent.move_speed", 0.0, agent.move_speed)?;

        Ok(())
    }
}

// Intervals run on the microsecond clock, so anything that rounds to zero
// ticks would never advance.
fn check_interval(name: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && SimTime::from_secs_f64(value) > SimTime::ZERO {
        Ok(())
    } else {
        Err(SimError::NonPositiveInterval { name, value })
    }
}

fn check_range(name: &'static str, min: f64, max: f64) -> Result<(), SimError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(SimError::InvalidRange { name, min, max })
    }
}
