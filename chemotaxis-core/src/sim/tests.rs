use super::*;
use crate::config::{AggregationMode, SimConfig};
use crate::geometry::Vec2;

const SEED: u32 = 0x5EED_1234;

fn sim() -> Simulation {
    Simulation::new(SimConfig::default(), SEED).expect("default config is valid")
}

fn secs(value: f64) -> SimTime {
    SimTime::from_secs_f64(value)
}

#[test]
fn missing_target_fails_at_construction() {
    let config = SimConfig {
        target: None,
        ..SimConfig::default()
    };
    assert!(matches!(
        Simulation::new(config, SEED),
        Err(SimError::MissingTarget)
    ));
}

#[test]
fn first_perceive_fires_one_cycle_after_spawn() {
    let mut sim = sim();
    sim.spawn(3);
    sim.advance_sim(secs(0.099));
    assert!(sim.agents().iter().all(|a| a.previous_input().is_none()));
    assert_eq!(sim.agents()[0].new_input(), 0.0);

    sim.advance_sim(secs(0.001));
    assert!(sim.agents().iter().all(|a| a.new_input() > 0.0));
    assert!(sim.agents().iter().all(|a| a.previous_input().is_none()));

    sim.advance_sim(secs(0.1));
    assert!(sim.agents().iter().all(|a| a.previous_input().is_some()));
    assert!(sim.agents().iter().all(|a| a.cycle() == 1));
}

#[test]
fn zero_time_scale_pauses_everything() {
    let mut sim = sim();
    sim.spawn(5);
    sim.advance(1.0);
    let before_clock = sim.clock();
    let before: Vec<_> = sim.agents().iter().map(|a| (a.position(), a.cycle())).collect();
    let target_before = sim.target().position();

    sim.set_time_scale(0.0).expect("zero is a valid scale");
    for _ in 0..600 {
        sim.advance(1.0 / 60.0);
    }

    assert_eq!(sim.clock(), before_clock);
    let after: Vec<_> = sim.agents().iter().map(|a| (a.position(), a.cycle())).collect();
    assert_eq!(before, after);
    assert_eq!(sim.target().position(), target_before);
}

#[test]
fn time_scale_multiplies_wall_time() {
    let mut sim = sim();
    sim.set_time_scale(2.5).expect("valid scale");
    for _ in 0..60 {
        sim.advance(1.0 / 60.0);
    }
    let elapsed = sim.clock().as_secs_f64();
    assert!((elapsed - 2.5).abs() < 1e-5, "elapsed {elapsed}");
}

#[test]
fn non_finite_wall_time_is_ignored() {
    let mut sim = sim();
    sim.spawn(2);
    sim.advance(0.5);
    let clock = sim.clock();

    sim.advance(f64::INFINITY);
    sim.advance(f64::NAN);
    sim.advance(-1.0);
    assert_eq!(sim.clock(), clock);

    // Later frames still advance normally.
    sim.advance(0.25);
    assert_eq!(sim.clock(), clock.saturating_add(secs(0.25)));
}

#[test]
fn sub_microsecond_interval_names_the_field() {
    let config = SimConfig {
        cycle_interval_s: 4e-7,
        ..SimConfig::default()
    };
    assert!(matches!(
        Simulation::new(config, SEED),
        Err(SimError::NonPositiveInterval {
            name: "cycle_interval_s",
            ..
        })
    ));
}

#[test]
fn rejects_invalid_time_scales() {
    let mut sim = sim();
    assert_eq!(
        sim.set_time_scale(-0.5),
        Err(SimError::InvalidTimeScale { value: -0.5 })
    );
    assert!(sim.set_time_scale(f64::NAN).is_err());
    assert_eq!(sim.time_scale(), 1.0);
}

#[test]
fn empty_population_snapshot_stays_finite() {
    let mut sim = sim();
    sim.advance_sim(secs(30.0));
    assert_eq!(sim.refresh_display(), None);

    let snapshot = sim.display_snapshot();
    assert_eq!(snapshot.population, 0);
    assert_eq!(snapshot.cycle, 0);
    assert_eq!(snapshot.generation, 0);
    assert!(snapshot.bias_average.is_finite());
    assert!(snapshot.energy_average.is_finite());
}

#[test]
fn reset_discards_agents_timers_and_totals() {
    let mut sim = sim();
    sim.spawn(10);
    sim.advance_sim(secs(45.0));
    assert!(sim.last_averages().is_some());

    sim.reset();

    assert!(sim.agents().is_empty());
    assert_eq!(sim.clock(), SimTime::ZERO);
    assert_eq!(sim.target().position(), Vec2::ZERO);
    assert_eq!(sim.population().population(), 0);
    assert_eq!(sim.population().total_bias(), 0.0);
    assert_eq!(sim.last_averages(), None);
    // Only the scene timers (retarget + display) survive.
    assert_eq!(sim.pending_events(), 2);

    sim.advance_sim(secs(5.0));
    assert!(sim.agents().is_empty());
    assert_eq!(sim.display_snapshot().population, 0);
}

#[test]
fn target_stays_inside_bounds_for_a_long_run() {
    let mut sim = sim();
    sim.spawn(1);
    let bounds = sim.config().bounds;
    for _ in 0..600 {
        sim.advance_sim(secs(1.0));
        assert!(bounds.contains(sim.target().position()));
    }
}

#[test]
fn mid_run_spawn_starts_new_chains_at_generation_zero() {
    let mut sim = sim();
    sim.spawn(4);
    sim.advance_sim(secs(25.0));
    sim.spawn(6);

    assert_eq!(sim.population().population(), 10);
    assert_eq!(sim.display_snapshot().population, 10);
    assert!(sim.agents()[..4].iter().all(|a| a.generation() == 1));
    assert!(sim.agents()[4..].iter().all(|a| a.generation() == 0 && a.cycle() == 0));

    sim.advance_sim(secs(20.0));
    assert!(sim.agents()[4..].iter().all(|a| a.generation() == 1));
    assert!(sim.agents()[..4].iter().all(|a| a.generation() == 2));
}

#[test]
fn rendezvous_waits_for_late_spawns() {
    let config = SimConfig {
        aggregation: AggregationMode::Rendezvous,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config, SEED).expect("valid");
    sim.spawn(4);
    sim.advance_sim(secs(10.0));
    sim.spawn(4);

    // The first four finish generation 1 at 19.9 s; the late four at 29.9 s.
    sim.advance_sim(secs(15.0));
    assert_eq!(sim.last_averages(), None);

    sim.advance_sim(secs(5.0));
    let averages = sim.last_averages().expect("generation 1 complete everywhere");
    assert_eq!(averages.generation, 1);
    assert_eq!(averages.contributors, 8);
}

#[test]
fn every_agent_runs_after_its_first_decision() {
    let mut sim = sim();
    sim.spawn(10);
    let start: Vec<_> = sim.agents().iter().map(Agent::position).collect();
    sim.advance_sim(secs(5.0));
    let moved = sim
        .agents()
        .iter()
        .zip(&start)
        .filter(|(agent, start)| agent.position() != **start)
        .count();
    // Every agent fires on its first decision, so each one has moved.
    assert_eq!(moved, 10);
}

#[test]
fn same_seed_same_run() {
    let run = |seed| {
        let mut sim = Simulation::new(SimConfig::default(), seed).expect("valid");
        sim.spawn(10);
        for _ in 0..1_800 {
            sim.advance(1.0 / 60.0);
        }
        (sim.rng_state(), sim.display_snapshot())
    };
    assert_eq!(run(SEED), run(SEED));
}
