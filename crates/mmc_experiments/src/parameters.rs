//! Parameter variation framework for exploring the queue's parameter space.
//!
//! A [ParameterSpace] holds value lists for each simulation parameter and
//! expands them into [ParameterSet]s, one per replication of each
//! combination. Supports grid search and random sampling.

use std::collections::HashSet;

use mmc_core::SimulationConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One point of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ParameterCombination {
    arrival_rate: f64,
    service_rate: f64,
    servers: usize,
    horizon: f64,
}

/// Value lists with the base config's value substituted for empty ones.
struct ParameterVariations {
    arrival_rates: Vec<f64>,
    service_rates: Vec<f64>,
    servers: Vec<usize>,
    horizons: Vec<f64>,
}

impl ParameterVariations {
    fn from_space(space: &ParameterSpace) -> Self {
        fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
            if values.is_empty() {
                vec![base]
            } else {
                values.to_vec()
            }
        }

        Self {
            arrival_rates: or_base(&space.arrival_rates, space.base.arrival_rate),
            service_rates: or_base(&space.service_rates, space.base.service_rate),
            servers: or_base(&space.servers, space.base.servers),
            horizons: or_base(&space.horizons, space.base.horizon),
        }
    }

    /// Cartesian product in declaration order (arrival rate varies slowest).
    fn generate_combinations(&self) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.arrival_rates.iter().flat_map(move |&arrival_rate| {
            self.service_rates.iter().flat_map(move |&service_rate| {
                self.servers.iter().flat_map(move |&servers| {
                    self.horizons.iter().map(move |&horizon| ParameterCombination {
                        arrival_rate,
                        service_rate,
                        servers,
                        horizon,
                    })
                })
            })
        })
    }
}

/// A single simulation run: one combination, one replication, one seed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    /// Unique experiment ID for this parameter combination.
    pub experiment_id: String,
    /// Position of this run in the generated list.
    pub run_id: usize,
    /// Replication index within the experiment.
    pub replication: usize,
    /// Seed used for this run (ensures reproducibility).
    pub seed: u64,
    pub config: SimulationConfig,
}

impl ParameterSet {
    pub fn new(
        config: SimulationConfig,
        experiment_id: String,
        run_id: usize,
        replication: usize,
        seed: u64,
    ) -> Self {
        Self {
            experiment_id,
            run_id,
            replication,
            seed,
            config,
        }
    }

    /// The config with this run's seed applied.
    pub fn simulation_config(&self) -> SimulationConfig {
        self.config.clone().with_seed(self.seed)
    }
}

/// Defines a parameter space for exploration.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    /// Base config (used for unspecified parameters and the event cap).
    base: SimulationConfig,
    arrival_rates: Vec<f64>,
    service_rates: Vec<f64>,
    servers: Vec<usize>,
    horizons: Vec<f64>,
    replications: usize,
    base_seed: u64,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self {
            base: SimulationConfig::default(),
            arrival_rates: vec![],
            service_rates: vec![],
            servers: vec![],
            horizons: vec![],
            replications: 1,
            base_seed: 0,
        }
    }

    /// Create a new parameter space for grid search.
    pub fn grid() -> Self {
        Self::new()
    }

    pub fn arrival_rate(mut self, rates: Vec<f64>) -> Self {
        self.arrival_rates = rates;
        self
    }

    pub fn service_rate(mut self, rates: Vec<f64>) -> Self {
        self.service_rates = rates;
        self
    }

    pub fn servers(mut self, counts: Vec<usize>) -> Self {
        self.servers = counts;
        self
    }

    pub fn horizon(mut self, horizons: Vec<f64>) -> Self {
        self.horizons = horizons;
        self
    }

    /// Independent runs per combination, each with its own seed. At least one.
    pub fn replications(mut self, replications: usize) -> Self {
        self.replications = replications.max(1);
        self
    }

    /// Seed of run 0; run `i` uses `base_seed + i` (wrapping).
    pub fn base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_base(mut self, base: SimulationConfig) -> Self {
        self.base = base;
        self
    }

    /// Number of parameter sets [ParameterSpace::generate] will produce.
    pub fn len(&self) -> usize {
        let variations = ParameterVariations::from_space(self);
        variations.arrival_rates.len()
            * variations.service_rates.len()
            * variations.servers.len()
            * variations.horizons.len()
            * self.replications
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generate all parameter sets using grid search (Cartesian product),
    /// `replications` consecutive runs per combination.
    pub fn generate(&self) -> Vec<ParameterSet> {
        let variations = ParameterVariations::from_space(self);

        variations
            .generate_combinations()
            .enumerate()
            .flat_map(|(experiment, combo)| {
                (0..self.replications).map(move |replication| (experiment, replication, combo))
            })
            .enumerate()
            .map(|(run_id, (experiment, replication, combo))| {
                ParameterSet::new(
                    self.config_for(combo),
                    format!("exp_{experiment}"),
                    run_id,
                    replication,
                    self.base_seed.wrapping_add(run_id as u64),
                )
            })
            .collect()
    }

    /// Generate `count` distinct combinations by random sampling from the
    /// value lists, one replication each.
    ///
    /// Stops early when the space has fewer than `count` distinct
    /// combinations.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        const MAX_ATTEMPTS: usize = 10_000;

        let variations = ParameterVariations::from_space(self);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut parameter_sets = Vec::new();
        let mut seen = HashSet::new();
        let mut attempts = 0;

        while parameter_sets.len() < count && attempts < MAX_ATTEMPTS {
            attempts += 1;
            let combo = ParameterCombination {
                arrival_rate: pick(&mut rng, &variations.arrival_rates),
                service_rate: pick(&mut rng, &variations.service_rates),
                servers: pick(&mut rng, &variations.servers),
                horizon: pick(&mut rng, &variations.horizons),
            };

            let key = format!("{combo:?}");
            if !seen.insert(key) {
                continue;
            }

            let run_id = parameter_sets.len();
            parameter_sets.push(ParameterSet::new(
                self.config_for(combo),
                format!("random_{run_id}"),
                run_id,
                0,
                self.base_seed.wrapping_add(run_id as u64),
            ));
        }

        parameter_sets
    }

    fn config_for(&self, combo: ParameterCombination) -> SimulationConfig {
        self.base
            .clone()
            .with_arrival_rate(combo.arrival_rate)
            .with_service_rate(combo.service_rate)
            .with_servers(combo.servers)
            .with_horizon(combo.horizon)
    }
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<T: Copy>(rng: &mut StdRng, values: &[T]) -> T {
    values[rng.gen_range(0..values.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_space_is_the_base_config() {
        let sets = ParameterSpace::grid().generate();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].config, SimulationConfig::default());
        assert_eq!(sets[0].experiment_id, "exp_0");
    }

    #[test]
    fn test_grid_search_multiple_parameters() {
        let space = ParameterSpace::grid()
            .arrival_rate(vec![0.1, 0.2])
            .servers(vec![1, 2, 3]);
        let sets = space.generate();
        assert_eq!(sets.len(), 6);
        assert_eq!(space.len(), 6);

        // Arrival rate varies slowest.
        assert_eq!(sets[0].config.arrival_rate, 0.1);
        assert_eq!(sets[0].config.servers, 1);
        assert_eq!(sets[2].config.servers, 3);
        assert_eq!(sets[3].config.arrival_rate, 0.2);
        assert_eq!(sets[3].config.servers, 1);
    }

    #[test]
    fn test_replications_share_experiment_id() {
        let sets = ParameterSpace::grid()
            .servers(vec![2, 3])
            .replications(3)
            .base_seed(100)
            .generate();
        assert_eq!(sets.len(), 6);

        let ids: Vec<&str> = sets.iter().map(|s| s.experiment_id.as_str()).collect();
        assert_eq!(ids, ["exp_0", "exp_0", "exp_0", "exp_1", "exp_1", "exp_1"]);
        let replications: Vec<usize> = sets.iter().map(|s| s.replication).collect();
        assert_eq!(replications, [0, 1, 2, 0, 1, 2]);
        let seeds: Vec<u64> = sets.iter().map(|s| s.seed).collect();
        assert_eq!(seeds, [100, 101, 102, 103, 104, 105]);
    }

    #[test]
    fn test_seed_wraps() {
        let sets = ParameterSpace::grid()
            .replications(2)
            .base_seed(u64::MAX)
            .generate();
        assert_eq!(sets[0].seed, u64::MAX);
        assert_eq!(sets[1].seed, 0);
    }

    #[test]
    fn test_zero_replications_means_one() {
        assert_eq!(ParameterSpace::grid().replications(0).generate().len(), 1);
    }

    #[test]
    fn test_simulation_config_applies_seed() {
        let sets = ParameterSpace::grid().base_seed(7).generate();
        assert_eq!(sets[0].simulation_config().seed, Some(7));
        assert_eq!(sets[0].config.seed, None);
    }

    #[test]
    fn test_base_config_fills_unspecified_parameters() {
        let base = SimulationConfig::new(60.0, 1.0, 0.5, 4).with_max_events(1000);
        let sets = ParameterSpace::grid()
            .with_base(base)
            .arrival_rate(vec![2.0])
            .generate();
        let config = &sets[0].config;
        assert_eq!(config.arrival_rate, 2.0);
        assert_eq!(config.horizon, 60.0);
        assert_eq!(config.servers, 4);
        assert_eq!(config.max_events, Some(1000));
    }

    #[test]
    fn test_random_sampling() {
        let space = ParameterSpace::grid()
            .arrival_rate(vec![0.1, 0.2, 0.3, 0.4])
            .servers(vec![1, 2, 3]);
        let sets = space.sample_random(10, 42);
        assert_eq!(sets.len(), 10);

        let distinct: HashSet<String> = sets
            .iter()
            .map(|s| format!("{}-{}", s.config.arrival_rate, s.config.servers))
            .collect();
        assert_eq!(distinct.len(), 10);
    }

    #[test]
    fn test_random_sampling_stops_at_space_size() {
        let space = ParameterSpace::grid().servers(vec![1, 2]);
        assert_eq!(space.sample_random(5, 1).len(), 2);
    }
}
