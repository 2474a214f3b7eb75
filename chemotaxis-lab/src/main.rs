use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chemotaxis_core::constants::{DEFAULT_SPAWN_COUNT, PHYSICS_DT_S};
use chemotaxis_lab::benchmark::{self, BenchmarkConfig};
use chemotaxis_lab::config::load_config;
use chemotaxis_lab::runner::{self, RunOptions, SpawnWave};
use chemotaxis_lab::util::{generate_seeds, parse_seed, seed_to_hex};

#[derive(Parser)]
#[command(
    name = "chemotaxis-lab",
    about = "Headless runs and seed sweeps for the chemotaxis population"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single simulation
    Run {
        /// RNG seed (hex, e.g. 0xDEADBEEF)
        #[arg(long, default_value = "0xDEADBEEF")]
        seed: String,

        /// Agents spawned at t = 0
        #[arg(long, default_value_t = DEFAULT_SPAWN_COUNT)]
        agents: usize,

        /// Simulated seconds to run
        #[arg(long, default_value = "200")]
        duration: f64,

        /// Time scale override (0 is rejected: a paused run never ends)
        #[arg(long)]
        time_scale: Option<f64>,

        /// Wall-clock frame length in seconds
        #[arg(long, default_value_t = PHYSICS_DT_S)]
        frame_dt: f64,

        /// Simulated seconds between timeline samples
        #[arg(long)]
        sample_every: Option<f64>,

        /// Extra agents mid-run as AT:COUNT (repeatable)
        #[arg(long = "spawn-wave")]
        spawn_waves: Vec<SpawnWave>,

        /// Config file path (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use a named preset instead of a config file
        #[arg(long)]
        preset: Option<String>,

        /// Write the run artifact (metrics + timeline) as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run one simulation per seed in parallel
    Bench {
        /// Number of seeds
        #[arg(long, default_value = "8")]
        seed_count: usize,

        /// Starting seed
        #[arg(long, default_value = "0xDEADBEEF")]
        base_seed: String,

        /// Agents per run
        #[arg(long, default_value_t = DEFAULT_SPAWN_COUNT)]
        agents: usize,

        /// Simulated seconds per run
        #[arg(long, default_value = "200")]
        duration: f64,

        /// Wall-clock frame length in seconds
        #[arg(long, default_value_t = PHYSICS_DT_S)]
        frame_dt: f64,

        /// Config file path (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use a named preset
        #[arg(long)]
        preset: Option<String>,

        /// Output directory
        #[arg(long, default_value = "bench-output")]
        out_dir: PathBuf,

        /// Parallel jobs (default: all cores)
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Print the effective config as JSON
    ShowConfig {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use a named preset
        #[arg(long)]
        preset: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            seed,
            agents,
            duration,
            time_scale,
            frame_dt,
            sample_every,
            spawn_waves,
            config,
            preset,
            output,
        } => {
            let cfg = load_config(config.as_deref(), preset.as_deref())?;
            let seed = parse_seed(&seed)?;
            let artifact = runner::run(
                &cfg,
                &RunOptions {
                    seed,
                    agents,
                    duration_s: duration,
                    frame_dt_s: frame_dt,
                    time_scale,
                    sample_every_s: sample_every,
                    spawn_waves,
                },
            )?;

            let m = &artifact.metrics;
            eprintln!(
                "seed={} t={:.1}s population={} generation={}..={} bias_avg={:.3} energy_avg={:.0} mean_bias={:.3} rng={:#010x}",
                m.seed_hex,
                m.sim_time_s,
                m.population,
                m.min_generation,
                m.max_generation,
                m.bias_average,
                m.energy_average,
                m.mean_bias,
                m.final_rng_state,
            );

            if let Some(path) = output {
                runner::write_artifact(&path, &artifact)?;
                eprintln!("run artifact written to {}", path.display());
            }
        }

        Command::Bench {
            seed_count,
            base_seed,
            agents,
            duration,
            frame_dt,
            config,
            preset,
            out_dir,
            jobs,
        } => {
            let cfg = load_config(config.as_deref(), preset.as_deref())?;
            let base = parse_seed(&base_seed)?;
            let seeds = generate_seeds(base, seed_count);

            eprintln!(
                "Benchmarking {} seeds from {}, {} agents, {}s each",
                seed_count,
                seed_to_hex(base),
                agents,
                duration
            );

            let report = benchmark::run_benchmark(BenchmarkConfig {
                sim_config: cfg,
                seeds,
                agents,
                duration_s: duration,
                frame_dt_s: frame_dt,
                out_dir: out_dir.clone(),
                jobs,
            })?;

            let agg = &report.aggregate;
            eprintln!(
                "avg_bias_average={:.3} range=[{:.3}, {:.3}] avg_energy_average={:.0} best={} ({:.0})",
                agg.avg_bias_average,
                agg.min_bias_average,
                agg.max_bias_average,
                agg.avg_energy_average,
                agg.best_seed_hex,
                agg.best_energy_average,
            );
            eprintln!("report saved to {}/summary.json", out_dir.display());
        }

        Command::ShowConfig { config, preset } => {
            let cfg = load_config(config.as_deref(), preset.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
    }

    Ok(())
}
