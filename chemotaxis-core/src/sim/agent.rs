use serde::{Deserialize, Serialize};

use crate::config::{AgentConfig, BiasBounds};
use crate::geometry::Vec2;
use crate::rng::SeededRng;

/// Outcome of one decide step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    /// The agent's first decision: there is no earlier reading to compare.
    Forced,
    Sampled { fire_probability: f64, draw: f64 },
}

impl Decision {
    pub fn fires(self) -> bool {
        match self {
            Self::Forced => true,
            Self::Sampled {
                fire_probability,
                draw,
            } => fires(fire_probability, draw),
        }
    }
}

/// What an agent hands the aggregator when a generation closes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generation counter after the increment (1 for the first report).
    pub generation: u64,
    /// Energy accumulated over the generation that just ended.
    pub energy: f64,
    pub bias: f64,
    pub highest_energy: f64,
}

/// Positive when the agent closed in on the target since the last reading.
pub fn fire_probability(previous_input: f64, new_input: f64, bias: f64) -> f64 {
    previous_input - new_input + bias
}

pub fn fires(fire_probability: f64, draw: f64) -> bool {
    draw < fire_probability
}

/// Pulls a mutated bias back toward `[0, 1]`.
pub fn correct_bias(bias: f64, learning_rate: f64, bounds: BiasBounds) -> f64 {
    match bounds {
        BiasBounds::Soft => {
            let mut bias = bias;
            if bias < 0.0 {
                bias += learning_rate;
            }
            if bias > 1.0 {
                bias -= learning_rate;
            }
            bias
        }
        BiasBounds::Hard => bias.clamp(0.0, 1.0),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    position: Vec2,
    heading_deg: f64,
    rotation_rate_deg: f64,
    fire: bool,

    previous_input: Option<f64>,
    new_input: f64,

    bias: f64,
    old_bias: f64,
    best_bias: f64,

    energy: f64,
    highest_energy: f64,

    cycle: u32,
    generation: u64,
    // Set when perceive closed a generation so the next decide keeps cycle 0.
    rolled_over: bool,
}

impl Agent {
    pub fn new(position: Vec2, bias: f64) -> Self {
        Self {
            position,
            heading_deg: 0.0,
            rotation_rate_deg: 0.0,
            fire: false,
            previous_input: None,
            new_input: 0.0,
            bias,
            old_bias: 0.0,
            best_bias: 0.0,
            energy: 0.0,
            highest_energy: 0.0,
            cycle: 0,
            generation: 0,
            rolled_over: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    pub fn rotation_rate_deg(&self) -> f64 {
        self.rotation_rate_deg
    }

    pub fn is_firing(&self) -> bool {
        self.fire
    }

    pub fn previous_input(&self) -> Option<f64> {
        self.previous_input
    }

    pub fn new_input(&self) -> f64 {
        self.new_input
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn old_bias(&self) -> f64 {
        self.old_bias
    }

    pub fn best_bias(&self) -> f64 {
        self.best_bias
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn highest_energy(&self) -> f64 {
        self.highest_energy
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reads the distance to the target, charges it as energy loss, and
    /// closes the generation on its last cycle.
    pub fn perceive(
        &mut self,
        target: Vec2,
        rng: &mut SeededRng,
        config: &AgentConfig,
    ) -> Option<GenerationReport> {
        self.new_input = self.position.distance(target);
        self.energy -= self.new_input;

        if self.cycle + 1 >= config.generation_length {
            let report = self.evolve(rng, config);
            self.cycle = 0;
            self.rolled_over = true;
            return Some(report);
        }
        None
    }

    /// Runs forward or tumbles depending on whether the last step brought the
    /// agent closer, shifted by its bias.
    pub fn decide(&mut self, rng: &mut SeededRng, config: &AgentConfig) -> Decision {
        let decision = match self.previous_input {
            None => Decision::Forced,
            Some(previous) => Decision::Sampled {
                fire_probability: fire_probability(previous, self.new_input, self.bias),
                draw: rng.next_unit(),
            },
        };

        self.fire = decision.fires();
        if !self.fire {
            self.rotation_rate_deg =
                rng.range(config.min_rotation_rate_deg, config.max_rotation_rate_deg);
        }

        if self.rolled_over {
            self.rolled_over = false;
        } else {
            self.cycle += 1;
        }
        self.previous_input = Some(self.new_input);
        decision
    }

    /// Per-generation hill-climbing step on the bias.
    pub fn evolve(&mut self, rng: &mut SeededRng, config: &AgentConfig) -> GenerationReport {
        let energy = self.energy;

        if self.generation == 0 {
            self.highest_energy = energy;
        } else {
            if energy > self.highest_energy {
                self.highest_energy = energy;
                self.best_bias = self.bias;
            }

            let step = rng.range(config.min_mutation_step, config.learning_rate);
            if self.best_bias > self.old_bias {
                self.bias += step;
            } else {
                self.bias -= step;
            }
            self.bias = correct_bias(self.bias, config.learning_rate, config.bias_bounds);
        }

        self.old_bias = self.bias;
        self.energy = 0.0;
        self.generation += 1;

        GenerationReport {
            generation: self.generation,
            energy,
            bias: self.bias,
            highest_energy: self.highest_energy,
        }
    }

    /// Physics tick: a firing agent runs straight, otherwise it spins in place.
    pub fn integrate(&mut self, dt: f64, config: &AgentConfig) {
        if self.fire {
            let velocity = Vec2::from_heading_deg(self.heading_deg).scaled(config.move_speed);
            self.position = self.position.offset(velocity.scaled(dt));
        } else {
            self.heading_deg = (self.heading_deg + self.rotation_rate_deg * dt).rem_euclid(360.0);
        }
    }
}
