use serde::{Deserialize, Serialize};

use crate::config::{SimConfig, TargetConfig};
use crate::error::SimError;
use crate::rng::SeededRng;

pub mod agent;
pub mod population;
mod scheduler;
pub mod target;

pub use agent::{Agent, Decision, GenerationReport};
pub use population::{GenerationAverages, Population};
pub use scheduler::SimTime;
pub use target::Target;

use scheduler::{Event, Scheduler};

/// Index of an agent in spawn order. Agents are never removed individually,
/// so an id stays valid until the next reset.
pub type AgentId = usize;

/// Read-only view for presentation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub time_s: f64,
    pub cycle: u32,
    pub generation: u64,
    pub population: usize,
    pub bias_average: f64,
    pub energy_average: f64,
}

/// One simulation: a target, a growing set of agents, the aggregator, and
/// the scheduler that drives all of their timers on one logical thread.
pub struct Simulation {
    config: SimConfig,
    target_config: TargetConfig,
    seed: u32,
    rng: SeededRng,

    clock: SimTime,
    last_physics: SimTime,
    // Sub-microsecond leftover from scaling wall time.
    carry_us: f64,
    time_scale: f64,

    cycle_interval: SimTime,
    physics_step: SimTime,
    refresh_interval: SimTime,
    retarget_interval: SimTime,

    target: Target,
    agents: Vec<Agent>,
    population: Population,
    scheduler: Scheduler,
    last_averages: Option<GenerationAverages>,
}

impl Simulation {
    pub fn new(config: SimConfig, seed: u32) -> Result<Self, SimError> {
        config.validate()?;
        let target_config = config.target.clone().ok_or(SimError::MissingTarget)?;

        let mut sim = Self {
            seed,
            rng: SeededRng::new(seed),
            clock: SimTime::ZERO,
            last_physics: SimTime::ZERO,
            carry_us: 0.0,
            time_scale: config.time_scale,
            cycle_interval: SimTime::from_secs_f64(config.cycle_interval_s),
            physics_step: SimTime::from_secs_f64(config.physics_dt_s),
            refresh_interval: SimTime::from_secs_f64(config.display_refresh_s),
            retarget_interval: SimTime::from_secs_f64(target_config.retarget_interval_s),
            target: Target::new(target_config.start),
            agents: Vec::new(),
            population: Population::new(config.aggregation),
            scheduler: Scheduler::new(),
            last_averages: None,
            target_config,
            config,
        };
        sim.schedule_scene_timers();
        Ok(sim)
    }

    fn schedule_scene_timers(&mut self) {
        self.scheduler.schedule(SimTime::ZERO, Event::Retarget);
        self.scheduler.schedule(SimTime::ZERO, Event::RefreshDisplay);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    pub fn clock(&self) -> SimTime {
        self.clock
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn last_averages(&self) -> Option<GenerationAverages> {
        self.last_averages
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    /// Adds `count` agents at uniform positions in the world bounds. Each
    /// starts its own timer chain one cycle interval from now.
    pub fn spawn(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let first_perceive = self.clock.saturating_add(self.cycle_interval);
        for _ in 0..count {
            let position = self.config.bounds.sample(&mut self.rng);
            let bias = self.rng.next_unit();
            let id = self.agents.len();
            self.agents.push(Agent::new(position, bias));
            self.scheduler.schedule(first_perceive, Event::Perceive(id));
        }
        self.population.add_agents(count);
        tracing::info!(
            spawned = count,
            population = self.agents.len(),
            time_s = self.clock.as_secs_f64(),
            "agents spawned"
        );
    }

    /// Scales wall time into simulated time; 0 pauses everything.
    pub fn set_time_scale(&mut self, factor: f64) -> Result<(), SimError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(SimError::InvalidTimeScale { value: factor });
        }
        self.time_scale = factor;
        Ok(())
    }

    /// Advances by `wall_dt_s` seconds of wall time, scaled by the time scale.
    pub fn advance(&mut self, wall_dt_s: f64) {
        if !wall_dt_s.is_finite() || wall_dt_s <= 0.0 || self.time_scale == 0.0 {
            return;
        }
        let micros = wall_dt_s * self.time_scale * 1_000_000.0 + self.carry_us;
        let whole = micros.floor();
        self.carry_us = micros - whole;
        self.advance_sim(SimTime(whole as u64));
    }

    /// Advances by an exact amount of simulated time, ignoring the time scale.
    pub fn advance_sim(&mut self, duration: SimTime) {
        let end = self.clock.saturating_add(duration);
        while self.clock < end {
            let next_physics = self.last_physics.saturating_add(self.physics_step);
            let horizon = next_physics.min(end);

            while let Some((at, event)) = self.scheduler.pop_due(horizon) {
                self.clock = at;
                self.dispatch(event);
            }

            if next_physics <= end {
                let dt = self.physics_step.as_secs_f64();
                self.target.integrate(dt, &self.config.bounds);
                for agent in &mut self.agents {
                    agent.integrate(dt, &self.config.agent);
                }
                self.last_physics = next_physics;
            }
            self.clock = horizon;
        }
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Retarget => {
                self.target.retarget(&mut self.rng, &self.target_config);
                self.scheduler
                    .schedule(self.clock.saturating_add(self.retarget_interval), Event::Retarget);
            }
            Event::Perceive(id) => {
                let target = self.target.position();
                let Some(agent) = self.agents.get_mut(id) else {
                    return;
                };
                if let Some(report) = agent.perceive(target, &mut self.rng, &self.config.agent) {
                    tracing::debug!(
                        agent = id,
                        generation = report.generation,
                        bias = report.bias,
                        highest_energy = report.highest_energy,
                        "generation complete"
                    );
                    self.population.record(&report);
                }
                self.scheduler
                    .schedule(self.clock.saturating_add(self.cycle_interval), Event::Decide(id));
            }
            Event::Decide(id) => {
                let Some(agent) = self.agents.get_mut(id) else {
                    return;
                };
                agent.decide(&mut self.rng, &self.config.agent);
                self.scheduler
                    .schedule(self.clock.saturating_add(self.cycle_interval), Event::Perceive(id));
            }
            Event::RefreshDisplay => {
                self.refresh_display();
                self.scheduler.schedule(
                    self.clock.saturating_add(self.refresh_interval),
                    Event::RefreshDisplay,
                );
            }
        }
    }

    /// Runs the aggregator's boundary check against the current agents.
    pub fn refresh_display(&mut self) -> Option<GenerationAverages> {
        let sampled = self.agents.first().map(Agent::generation);
        let slowest = self.agents.iter().map(Agent::generation).min();
        let averages = self.population.refresh(sampled, slowest)?;
        tracing::info!(
            generation = averages.generation,
            bias_average = averages.bias_average,
            energy_average = averages.energy_average,
            contributors = averages.contributors,
            "population averages updated"
        );
        self.last_averages = Some(averages);
        Some(averages)
    }

    pub fn display_snapshot(&self) -> DisplaySnapshot {
        let sampled = self.agents.first();
        DisplaySnapshot {
            time_s: self.clock.as_secs_f64(),
            cycle: sampled.map_or(0, Agent::cycle),
            generation: sampled.map_or(0, Agent::generation),
            population: self.population.population(),
            bias_average: self.population.bias_average(),
            energy_average: self.population.energy_average(),
        }
    }

    /// Cancels every timer and returns to the freshly loaded scene: target at
    /// its start, no agents, empty aggregator. The RNG stream and the time
    /// scale carry on.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.agents.clear();
        self.population = Population::new(self.config.aggregation);
        self.target = Target::new(self.target_config.start);
        self.clock = SimTime::ZERO;
        self.last_physics = SimTime::ZERO;
        self.carry_us = 0.0;
        self.last_averages = None;
        self.schedule_scene_timers();
        tracing::info!("simulation reset");
    }
}

#[cfg(test)]
mod tests;
