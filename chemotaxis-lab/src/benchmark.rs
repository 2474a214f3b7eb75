use crate::runner::{run, RunMetrics, RunOptions};
use anyhow::{anyhow, Context, Result};
use chemotaxis_core::SimConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub sim_config: SimConfig,
    pub seeds: Vec<u32>,
    pub agents: usize,
    pub duration_s: f64,
    pub frame_dt_s: f64,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkAggregate {
    pub runs: usize,
    pub avg_bias_average: f64,
    pub min_bias_average: f64,
    pub max_bias_average: f64,
    pub avg_energy_average: f64,
    pub best_energy_average: f64,
    pub best_seed_hex: String,
    pub avg_generations: f64,
    /// Runs that ended with at least one agent's bias outside `[0, 1]`.
    pub runs_with_bias_outside_unit: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub agents: usize,
    pub duration_s: f64,
    pub jobs: Option<usize>,
    pub config: SimConfig,
    pub aggregate: BenchmarkAggregate,
    pub runs: Vec<RunMetrics>,
}

/// Runs one independent simulation per seed, in parallel, and writes
/// `summary.json` into the output directory.
pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.agents == 0 {
        return Err(anyhow!("benchmark requires at least one agent per run"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_one = |seed: &u32| -> Result<RunMetrics> {
        let options = RunOptions {
            seed: *seed,
            agents: config.agents,
            duration_s: config.duration_s,
            frame_dt_s: config.frame_dt_s,
            time_scale: None,
            sample_every_s: None,
            spawn_waves: Vec::new(),
        };
        let artifact = run(&config.sim_config, &options)
            .with_context(|| format!("benchmark run failed for seed={seed:#x}"))?;
        let metrics = artifact.metrics;
        tracing::info!(
            seed = %metrics.seed_hex,
            generations = metrics.max_generation,
            bias_average = metrics.bias_average,
            energy_average = metrics.energy_average,
            "benchmark run finished"
        );
        Ok(metrics)
    };

    let results: Vec<Result<RunMetrics>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| config.seeds.par_iter().map(run_one).collect())
    } else {
        config.seeds.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(results.len());
    for result in results {
        runs.push(result?);
    }

    let report = BenchmarkReport {
        generated_unix_s: now_unix_s(),
        agents: config.agents,
        duration_s: config.duration_s,
        jobs: config.jobs,
        config: config.sim_config.clone(),
        aggregate: aggregate(&runs),
        runs,
    };

    let summary_path = config.out_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_vec_pretty(&report)?)
        .with_context(|| format!("failed writing {}", summary_path.display()))?;
    tracing::info!(
        runs = report.aggregate.runs,
        path = %summary_path.display(),
        "benchmark summary written"
    );

    Ok(report)
}

fn aggregate(runs: &[RunMetrics]) -> BenchmarkAggregate {
    let n = runs.len().max(1) as f64;
    let best = runs
        .iter()
        .max_by(|a, b| a.energy_average.total_cmp(&b.energy_average));

    BenchmarkAggregate {
        runs: runs.len(),
        avg_bias_average: runs.iter().map(|r| r.bias_average).sum::<f64>() / n,
        min_bias_average: runs
            .iter()
            .map(|r| r.bias_average)
            .fold(f64::INFINITY, f64::min),
        max_bias_average: runs
            .iter()
            .map(|r| r.bias_average)
            .fold(f64::NEG_INFINITY, f64::max),
        avg_energy_average: runs.iter().map(|r| r.energy_average).sum::<f64>() / n,
        best_energy_average: best.map_or(0.0, |r| r.energy_average),
        best_seed_hex: best.map(|r| r.seed_hex.clone()).unwrap_or_default(),
        avg_generations: runs.iter().map(|r| r.max_generation as f64).sum::<f64>() / n,
        runs_with_bias_outside_unit: runs
            .iter()
            .filter(|r| r.min_bias < 0.0 || r.max_bias > 1.0)
            .count(),
    }
}

fn now_unix_s() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
