//! Chemotaxis core - run-and-tumble agents that learn a firing bias.
//!
//! A population of agents chases a drifting nutrition source. Each agent runs
//! its own perceive/decide timer chain on a shared discrete-event scheduler
//! and adapts its bias once per generation from accumulated energy loss.

pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod rng;
pub mod sim;

pub use config::{AgentConfig, AggregationMode, BiasBounds, SimConfig, TargetConfig};
pub use error::SimError;
pub use geometry::{Bounds, Vec2};
pub use rng::SeededRng;
pub use sim::{DisplaySnapshot, SimTime, Simulation};
