//! Configuration parameters for the genetic algorithm.

use crate::error::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Raw, user-facing run parameters.
///
/// These are not validated until [`Config::resolve`] turns them into a
/// [`RunConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hard upper bound on the number of generations
    pub max_iterations: u32,
    /// Number of chromosomes kept in the population
    pub population_size: usize,
    /// Fraction of the population selected as parents each generation
    pub crossover_fraction: f64,
    /// Probability that a child is mutated
    pub mutation_probability: f64,
    /// Fraction of the produced children inserted into the population
    pub child_insertion_fraction: f64,
    /// Fraction of `max_iterations` without improvement that stops the run
    pub stagnation_fraction: f64,
    /// Seed for the run's random source, entropy when absent
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_iterations: 1000,
            population_size: 100,
            crossover_fraction: 0.5,
            mutation_probability: 0.1,
            child_insertion_fraction: 0.5,
            stagnation_fraction: 0.2,
            seed: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Load parameters from a JSON file. Missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Set the maximum number of generations.
    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Set the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set the fraction of the population used as parents.
    pub fn with_crossover_fraction(mut self, fraction: f64) -> Self {
        self.crossover_fraction = fraction;
        self
    }

    /// Set the mutation probability.
    pub fn with_mutation_probability(mut self, probability: f64) -> Self {
        self.mutation_probability = probability;
        self
    }

    /// Set the fraction of children inserted each generation.
    pub fn with_child_insertion_fraction(mut self, fraction: f64) -> Self {
        self.child_insertion_fraction = fraction;
        self
    }

    /// Set the stagnation fraction.
    pub fn with_stagnation_fraction(mut self, fraction: f64) -> Self {
        self.stagnation_fraction = fraction;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the parameters and derive the operator counts.
    pub fn resolve(&self) -> Result<RunConfig, ConfigError> {
        RunConfig::new(
            self.max_iterations,
            self.population_size,
            self.crossover_fraction,
            self.mutation_probability,
            self.child_insertion_fraction,
            self.stagnation_fraction,
        )
        .map(|run| RunConfig {
            seed: self.seed,
            ..run
        })
    }
}

/// Validated, immutable run configuration with its derived counts.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    max_iterations: u32,
    population_size: usize,
    crossover_fraction: f64,
    crossover_count: usize,
    mutation_probability: f64,
    child_insertion_fraction: f64,
    child_insertion_count: usize,
    stagnation_fraction: f64,
    stagnation_limit: u32,
    seed: Option<u64>,
}

impl RunConfig {
    /// Derive a run configuration from the six scalar parameters.
    pub fn new(
        max_iterations: u32,
        population_size: usize,
        crossover_fraction: f64,
        mutation_probability: f64,
        child_insertion_fraction: f64,
        stagnation_fraction: f64,
    ) -> Result<Self, ConfigError> {
        let crossover_count = crossover_count(population_size, crossover_fraction)?;
        let child_insertion_count =
            child_insertion_count(crossover_count, child_insertion_fraction)?;
        let stagnation_limit = stagnation_limit(max_iterations, stagnation_fraction);

        Ok(RunConfig {
            max_iterations,
            population_size,
            crossover_fraction,
            crossover_count,
            mutation_probability,
            child_insertion_fraction,
            child_insertion_count,
            stagnation_fraction,
            stagnation_limit,
            seed: None,
        })
    }

    /// Attach a seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn crossover_fraction(&self) -> f64 {
        self.crossover_fraction
    }

    /// Number of parents selected per generation (always even, at least 2).
    pub fn crossover_count(&self) -> usize {
        self.crossover_count
    }

    /// Number of children produced per generation.
    pub fn children_count(&self) -> usize {
        self.crossover_count / 2
    }

    pub fn mutation_probability(&self) -> f64 {
        self.mutation_probability
    }

    pub fn child_insertion_fraction(&self) -> f64 {
        self.child_insertion_fraction
    }

    /// Number of replacement events per generation.
    pub fn child_insertion_count(&self) -> usize {
        self.child_insertion_count
    }

    pub fn stagnation_fraction(&self) -> f64 {
        self.stagnation_fraction
    }

    /// Consecutive generations without a new best that end the run.
    pub fn stagnation_limit(&self) -> u32 {
        self.stagnation_limit
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Even parent count reachable within the population.
fn crossover_count(population_size: usize, crossover_fraction: f64) -> Result<usize, ConfigError> {
    // Float-to-int casts saturate, so negative or NaN fractions land on 0.
    let raw = (population_size as f64 * crossover_fraction).floor() as usize;
    let invalid = ConfigError::InvalidCrossoverSizing {
        population_size,
        crossover_fraction,
    };
    if raw > population_size {
        return Err(invalid);
    }

    let count = if raw % 2 == 1 {
        if raw < population_size {
            raw + 1
        } else {
            raw - 1
        }
    } else {
        raw
    };

    if count < 2 {
        return Err(invalid);
    }
    Ok(count)
}

fn child_insertion_count(
    crossover_count: usize,
    child_insertion_fraction: f64,
) -> Result<usize, ConfigError> {
    let children = crossover_count / 2;
    let raw = (children as f64 * child_insertion_fraction).floor();

    if raw.is_nan() || raw <= 0.0 {
        return Err(ConfigError::InvalidInsertionSizing {
            crossover_count,
            child_insertion_fraction,
        });
    }
    Ok((raw as usize).min(children))
}

fn stagnation_limit(max_iterations: u32, stagnation_fraction: f64) -> u32 {
    let raw = (max_iterations as f64 * stagnation_fraction).ceil();
    if raw.is_nan() || raw <= 0.0 {
        return 0;
    }
    (raw as u32).min(max_iterations)
}
