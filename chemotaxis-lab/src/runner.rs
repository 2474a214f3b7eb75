use anyhow::{anyhow, Context, Result};
use chemotaxis_core::sim::{DisplaySnapshot, SimTime, Simulation};
use chemotaxis_core::SimConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::util::seed_to_hex;

/// Extra agents dropped into a running simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnWave {
    pub at_s: f64,
    pub count: usize,
}

impl FromStr for SpawnWave {
    type Err = anyhow::Error;

    /// Parses `AT:COUNT`, e.g. `30:5` for five agents at t = 30 s.
    fn from_str(s: &str) -> Result<Self> {
        let (at, count) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("spawn wave must look like AT:COUNT, got '{s}'"))?;
        let at_s = at
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid spawn time in '{s}'"))?;
        if !at_s.is_finite() || at_s < 0.0 {
            return Err(anyhow!("spawn time must be >= 0 in '{s}'"));
        }
        let count = count
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid spawn count in '{s}'"))?;
        Ok(Self { at_s, count })
    }
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub seed: u32,
    pub agents: usize,
    /// Simulated seconds to run for.
    pub duration_s: f64,
    /// Wall-clock frame length fed to `Simulation::advance`.
    pub frame_dt_s: f64,
    /// Overrides the config's time scale.
    pub time_scale: Option<f64>,
    /// Simulated seconds between timeline samples; `None` keeps only the end.
    pub sample_every_s: Option<f64>,
    pub spawn_waves: Vec<SpawnWave>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunMetrics {
    pub seed: u32,
    pub seed_hex: String,
    pub sim_time_s: f64,
    pub frames: u64,
    pub population: usize,
    pub min_generation: u64,
    pub max_generation: u64,
    pub averages_published: u64,
    pub bias_average: f64,
    pub energy_average: f64,
    pub mean_bias: f64,
    pub min_bias: f64,
    pub max_bias: f64,
    pub mean_highest_energy: f64,
    pub firing_agents: usize,
    pub final_rng_state: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub timeline: Vec<DisplaySnapshot>,
}

pub fn run(config: &SimConfig, options: &RunOptions) -> Result<RunArtifact> {
    if !options.duration_s.is_finite() || options.duration_s <= 0.0 {
        return Err(anyhow!("duration must be > 0 seconds"));
    }
    if !options.frame_dt_s.is_finite() || options.frame_dt_s <= 0.0 {
        return Err(anyhow!("frame dt must be > 0 seconds"));
    }
    if let Some(every) = options.sample_every_s {
        if !every.is_finite() || SimTime::from_secs_f64(every) == SimTime::ZERO {
            return Err(anyhow!("sample interval must be at least one microsecond"));
        }
    }

    let mut sim = Simulation::new(config.clone(), options.seed)
        .map_err(|err| anyhow!("failed to build simulation: {err}"))?;
    if let Some(scale) = options.time_scale {
        sim.set_time_scale(scale)
            .map_err(|err| anyhow!("failed to apply time scale: {err}"))?;
    }
    if sim.time_scale() == 0.0 {
        return Err(anyhow!("time scale 0 pauses the simulation; the run would never finish"));
    }

    let end = SimTime::from_secs_f64(options.duration_s);
    let mut waves = options.spawn_waves.clone();
    waves.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
    let mut waves = waves.into_iter().peekable();

    let sample_every = options.sample_every_s.map(SimTime::from_secs_f64);
    let mut next_sample = SimTime::ZERO;
    let mut timeline = Vec::new();
    let mut frames = 0u64;

    sim.spawn(options.agents);
    while sim.clock() < end {
        while let Some(wave) = waves.next_if(|w| SimTime::from_secs_f64(w.at_s) <= sim.clock()) {
            sim.spawn(wave.count);
        }

        sim.advance(options.frame_dt_s);
        frames += 1;

        if let Some(every) = sample_every {
            if sim.clock() >= next_sample {
                timeline.push(sim.display_snapshot());
                while next_sample <= sim.clock() {
                    next_sample = next_sample.saturating_add(every);
                }
            }
        }
    }

    let last = sim.display_snapshot();
    if timeline.last() != Some(&last) {
        timeline.push(last);
    }

    Ok(RunArtifact {
        metrics: collect_metrics(&sim, frames),
        timeline,
    })
}

fn collect_metrics(sim: &Simulation, frames: u64) -> RunMetrics {
    let agents = sim.agents();
    let count = agents.len();
    let biases = agents.iter().map(|a| a.bias());
    let mean = |sum: f64| {
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    };
    let (min_bias, max_bias) = if count == 0 {
        (0.0, 0.0)
    } else {
        biases
            .clone()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), b| {
                (lo.min(b), hi.max(b))
            })
    };

    let snapshot = sim.display_snapshot();
    RunMetrics {
        seed: sim.seed(),
        seed_hex: seed_to_hex(sim.seed()),
        sim_time_s: snapshot.time_s,
        frames,
        population: snapshot.population,
        min_generation: agents.iter().map(|a| a.generation()).min().unwrap_or(0),
        max_generation: agents.iter().map(|a| a.generation()).max().unwrap_or(0),
        averages_published: sim.population().averages_computed(),
        bias_average: snapshot.bias_average,
        energy_average: snapshot.energy_average,
        mean_bias: mean(biases.sum()),
        min_bias,
        max_bias,
        mean_highest_energy: mean(agents.iter().map(|a| a.highest_energy()).sum()),
        firing_agents: agents.iter().filter(|a| a.is_firing()).count(),
        final_rng_state: sim.rng_state(),
    }
}

pub fn write_artifact(path: &Path, artifact: &RunArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
    }
    let json = serde_json::to_vec_pretty(artifact).context("failed to serialize run artifact")?;
    fs::write(path, json).with_context(|| format!("failed writing {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        seed = %artifact.metrics.seed_hex,
        samples = artifact.timeline.len(),
        "run artifact written"
    );
    Ok(())
}
