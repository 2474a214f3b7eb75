use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::agent::GenerationReport;
use crate::config::AggregationMode;

/// Population-wide averages published at a generation boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationAverages {
    pub generation: u64,
    pub bias_average: f64,
    pub energy_average: f64,
    /// Agents the averages were divided over.
    pub contributors: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Bucket {
    bias: f64,
    energy: f64,
    reports: usize,
}

/// Collects generation reports from every agent and turns them into averages
/// on the display cadence.
#[derive(Clone, Debug, PartialEq)]
pub struct Population {
    mode: AggregationMode,
    total_bias: f64,
    total_energy: f64,
    generation_threshold: u64,
    bias_average: f64,
    energy_average: f64,
    population: usize,
    averages_computed: u64,
    pending: BTreeMap<u64, Bucket>,
}

impl Population {
    pub fn new(mode: AggregationMode) -> Self {
        Self {
            mode,
            total_bias: 0.0,
            total_energy: 0.0,
            generation_threshold: 0,
            bias_average: 0.0,
            energy_average: 0.0,
            population: 0,
            averages_computed: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn total_bias(&self) -> f64 {
        self.total_bias
    }

    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    pub fn generation_threshold(&self) -> u64 {
        self.generation_threshold
    }

    pub fn bias_average(&self) -> f64 {
        self.bias_average
    }

    pub fn energy_average(&self) -> f64 {
        self.energy_average
    }

    pub fn population(&self) -> usize {
        self.population
    }

    pub fn averages_computed(&self) -> u64 {
        self.averages_computed
    }

    /// Bias and energy sums of rendezvous buckets not yet published. Always
    /// zero in sampled-agent mode.
    pub fn pending_totals(&self) -> (f64, f64) {
        self.pending
            .values()
            .fold((0.0, 0.0), |(bias, energy), b| (bias + b.bias, energy + b.energy))
    }

    pub fn add_agents(&mut self, count: usize) {
        self.population += count;
    }

    /// Adds one agent's contribution. Fire-and-forget: nothing is returned
    /// to the reporting agent.
    pub fn record(&mut self, report: &GenerationReport) {
        match self.mode {
            AggregationMode::SampledAgent => {
                self.total_bias += report.bias;
                self.total_energy += report.highest_energy;
            }
            AggregationMode::Rendezvous => {
                if report.generation <= self.generation_threshold {
                    tracing::debug!(
                        generation = report.generation,
                        threshold = self.generation_threshold,
                        "dropping report for an already published generation"
                    );
                    return;
                }
                let bucket = self.pending.entry(report.generation).or_default();
                bucket.bias += report.bias;
                bucket.energy += report.highest_energy;
                bucket.reports += 1;
                self.total_bias += report.bias;
                self.total_energy += report.highest_energy;
            }
        }
    }

    /// Display-cadence check for a new generation boundary.
    ///
    /// `sampled_generation` is the generation of the agent the display
    /// watches; `slowest_generation` is the minimum over all agents. Both are
    /// `None` for an empty population, in which case nothing is computed.
    pub fn refresh(
        &mut self,
        sampled_generation: Option<u64>,
        slowest_generation: Option<u64>,
    ) -> Option<GenerationAverages> {
        if self.population == 0 {
            return None;
        }
        match self.mode {
            AggregationMode::SampledAgent => self.refresh_sampled(sampled_generation?),
            AggregationMode::Rendezvous => self.refresh_rendezvous(slowest_generation?),
        }
    }

    fn refresh_sampled(&mut self, generation: u64) -> Option<GenerationAverages> {
        if generation <= self.generation_threshold {
            return None;
        }
        let population = self.population as f64;
        let averages = GenerationAverages {
            generation,
            bias_average: self.total_bias / population,
            energy_average: self.total_energy / population,
            contributors: self.population,
        };
        self.total_bias = 0.0;
        self.total_energy = 0.0;
        Some(self.publish(averages))
    }

    fn refresh_rendezvous(&mut self, slowest: u64) -> Option<GenerationAverages> {
        if slowest <= self.generation_threshold {
            return None;
        }

        let later = self.pending.split_off(&(slowest + 1));
        let ready = std::mem::replace(&mut self.pending, later);
        let (&generation, bucket) = ready.iter().next_back()?;
        self.total_bias = 0.0;
        self.total_energy = 0.0;

        let reports = bucket.reports as f64;
        Some(self.publish(GenerationAverages {
            generation,
            bias_average: bucket.bias / reports,
            energy_average: bucket.energy / reports,
            contributors: bucket.reports,
        }))
    }

    fn publish(&mut self, averages: GenerationAverages) -> GenerationAverages {
        self.generation_threshold = averages.generation;
        self.bias_average = averages.bias_average;
        self.energy_average = averages.energy_average;
        self.averages_computed += 1;
        averages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(generation: u64, bias: f64, highest_energy: f64) -> GenerationReport {
        GenerationReport {
            generation,
            energy: highest_energy,
            bias,
            highest_energy,
        }
    }

    #[test]
    fn sampled_average_divides_by_population_and_zeroes_totals() {
        let mut population = Population::new(AggregationMode::SampledAgent);
        population.add_agents(4);
        population.record(&report(1, 0.2, -100.0));
        population.record(&report(1, 0.4, -300.0));
        population.record(&report(1, 0.6, -500.0));

        let averages = population.refresh(Some(1), Some(0)).expect("boundary seen");
        assert!((averages.bias_average - 1.2 / 4.0).abs() < 1e-12);
        assert!((averages.energy_average + 900.0 / 4.0).abs() < 1e-12);
        assert_eq!(averages.contributors, 4);
        assert_eq!(population.total_bias(), 0.0);
        assert_eq!(population.total_energy(), 0.0);
        assert_eq!(population.generation_threshold(), 1);
        assert_eq!(population.bias_average(), averages.bias_average);
    }

    #[test]
    fn sampled_refresh_waits_for_a_new_generation() {
        let mut population = Population::new(AggregationMode::SampledAgent);
        population.add_agents(2);
        assert_eq!(population.refresh(Some(0), Some(0)), None);

        population.record(&report(1, 0.5, -10.0));
        population.refresh(Some(1), Some(1)).expect("first boundary");
        population.record(&report(1, 0.7, -20.0));
        assert_eq!(population.refresh(Some(1), Some(1)), None);
        // Late report stays in the totals until the next boundary.
        assert_eq!(population.total_bias(), 0.7);
        assert_eq!(population.averages_computed(), 1);
    }

    #[test]
    fn empty_population_never_divides() {
        let mut population = Population::new(AggregationMode::SampledAgent);
        population.record(&report(3, 0.5, -1.0));
        assert_eq!(population.refresh(Some(3), Some(3)), None);
        assert_eq!(population.refresh(None, None), None);
        assert!(population.bias_average().is_finite());
        assert_eq!(population.bias_average(), 0.0);
    }

    #[test]
    fn rendezvous_waits_for_the_slowest_agent() {
        let mut population = Population::new(AggregationMode::Rendezvous);
        population.add_agents(3);
        population.record(&report(1, 0.3, -30.0));
        population.record(&report(1, 0.6, -60.0));

        assert_eq!(population.refresh(Some(1), Some(0)), None);

        population.record(&report(2, 0.9, -10.0));
        population.record(&report(1, 0.9, -90.0));
        let averages = population.refresh(Some(2), Some(1)).expect("generation 1 complete");
        assert_eq!(averages.generation, 1);
        assert_eq!(averages.contributors, 3);
        assert!((averages.bias_average - 0.6).abs() < 1e-12);
        assert!((averages.energy_average + 60.0).abs() < 1e-12);

        // Generation 2 stays pending; the running totals restart at zero.
        assert_eq!(population.total_bias(), 0.0);
        assert_eq!(population.total_energy(), 0.0);
        assert_eq!(population.pending_totals(), (0.9, -10.0));
    }

    #[test]
    fn rendezvous_averages_only_over_reporters() {
        let mut population = Population::new(AggregationMode::Rendezvous);
        population.add_agents(2);
        population.record(&report(1, 0.4, -40.0));
        population.add_agents(3);

        let averages = population.refresh(Some(1), Some(1)).expect("published");
        assert_eq!(averages.contributors, 1);
        assert_eq!(averages.bias_average, 0.4);

        // A straggler reporting an already published generation is dropped.
        population.record(&report(1, 1.0, -1.0));
        assert_eq!(population.total_bias(), 0.0);
    }

    #[test]
    fn rendezvous_publishes_latest_complete_generation() {
        let mut population = Population::new(AggregationMode::Rendezvous);
        population.add_agents(1);
        population.record(&report(1, 0.1, -1.0));
        population.record(&report(2, 0.2, -2.0));
        population.record(&report(3, 0.3, -3.0));

        let averages = population.refresh(Some(3), Some(2)).expect("published");
        assert_eq!(averages.generation, 2);
        assert_eq!(population.generation_threshold(), 2);
        assert_eq!(population.total_bias(), 0.0);
        assert_eq!(population.pending_totals(), (0.3, -3.0));
    }
}
