//! # table_ga
//!
//! A steady-state genetic algorithm that assigns a fixed set of tables to
//! compatible sites.
//!
//! Each generation selects parents by binary tournament, recombines them with
//! partially mapped crossover, mutates children by segment inversion and
//! inserts a few of them into the population without ever displacing the
//! current best. The run stops after a fixed number of generations or when
//! the best fitness stagnates.
//!
//! All randomness comes from one source passed explicitly to every operator,
//! so a seeded run is fully reproducible.

pub mod chromosome;
pub mod config;
pub mod error;
pub mod fitness;
pub mod genetic;
pub mod population;
pub mod problem;
pub mod utils;

use crate::chromosome::Chromosome;
use crate::config::{Config, RunConfig};
use crate::error::{ConfigError, ProblemError};
use crate::fitness::Fitness;
use crate::genetic::Genetic;
use crate::population::Population;
use crate::problem::Problem;
use crate::utils::RunSummary;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

/// How much a run reports through the `log` facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Nothing
    Silent,
    /// Initialization notice and final results
    Summary,
    /// One line per generation
    Progress,
    /// Every operator step inside a generation
    Detailed,
}

impl Verbosity {
    /// Map a numeric level: negative is silent, 0 summary, 1 progress, 2+ detailed.
    pub fn from_level(level: i32) -> Self {
        match level {
            i32::MIN..=-1 => Verbosity::Silent,
            0 => Verbosity::Summary,
            1 => Verbosity::Progress,
            _ => Verbosity::Detailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Stagnated,
    IterationLimitReached,
}

/// Lifecycle of a [`GeneticAlgorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Initialized,
    Running,
    Terminated(TerminationReason),
}

/// Outcome of a single generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub generation: u32,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    /// Relative change of the population's summed fitness
    pub improvement_ratio: f64,
    pub new_best: bool,
    pub mutated: usize,
    pub stagnation_counter: u32,
}

/// The generational driver: owns the population for the whole run.
pub struct GeneticAlgorithm<F: Fitness> {
    problem: Problem,
    fitness: F,
    config: RunConfig,
    genetic: Genetic,
    population: Option<Population>,
    state: RunState,
    generation: u32,
    stagnation_counter: u32,
    previous_sum: f64,
    initial_best: Option<Chromosome>,
    summary: Option<RunSummary>,
    run_time: Duration,
}

impl<F: Fitness> GeneticAlgorithm<F> {
    /// Create a driver from an already validated configuration.
    pub fn new(problem: Problem, fitness: F, config: RunConfig) -> Self {
        GeneticAlgorithm {
            problem,
            fitness,
            config,
            genetic: Genetic,
            population: None,
            state: RunState::NotStarted,
            generation: 0,
            stagnation_counter: 0,
            previous_sum: 0.0,
            initial_best: None,
            summary: None,
            run_time: Duration::from_secs(0),
        }
    }

    /// Create a driver from raw parameters, validating them first.
    pub fn from_config(problem: Problem, fitness: F, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(problem, fitness, config.resolve()?))
    }

    /// Create a driver from the six scalar run parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn with_parameters(
        problem: Problem,
        fitness: F,
        max_iterations: u32,
        population_size: usize,
        crossover_fraction: f64,
        mutation_probability: f64,
        child_insertion_fraction: f64,
        stagnation_fraction: f64,
    ) -> Result<Self, ConfigError> {
        let config = RunConfig::new(
            max_iterations,
            population_size,
            crossover_fraction,
            mutation_probability,
            child_insertion_fraction,
            stagnation_fraction,
        )?;
        Ok(Self::new(problem, fitness, config))
    }

    /// Build the initial population and reset the run counters.
    ///
    /// With `max_iterations == 0` the run is terminated right away.
    pub fn initialize<R: Rng>(&mut self, rng: &mut R) -> Result<(), ProblemError> {
        let population = Population::initialize(&self.problem, &self.fitness, &self.config, rng)?;

        self.previous_sum = population.sum_fitness();
        self.initial_best = Some(population.best().clone());
        self.population = Some(population);
        self.generation = 0;
        self.stagnation_counter = 0;
        self.summary = None;
        self.state = if self.config.max_iterations() == 0 {
            RunState::Terminated(TerminationReason::IterationLimitReached)
        } else {
            RunState::Initialized
        };
        Ok(())
    }

    /// Tournament selection of `crossover_count` parents from the population.
    ///
    /// `None` until the population is initialized.
    pub fn select_parents<R: Rng>(&self, rng: &mut R) -> Option<Vec<&Chromosome>> {
        self.population.as_ref().map(|population| {
            population.select_parents(self.config.crossover_count(), &self.fitness, rng)
        })
    }

    /// PMX over consecutive parent pairs.
    pub fn crossover<R: Rng>(&self, parents: &[&Chromosome], rng: &mut R) -> Vec<Chromosome> {
        self.genetic.crossover(parents, rng)
    }

    /// Probabilistic segment-inversion mutation. Also returns the mutated count.
    pub fn mutate<R: Rng>(&self, children: Vec<Chromosome>, rng: &mut R) -> (Vec<Chromosome>, usize) {
        self.genetic
            .mutate(children, self.config.mutation_probability(), rng)
    }

    /// Insert `child_insertion_count` children into the population.
    ///
    /// Returns whether a new best chromosome was found, or `None` until the
    /// population is initialized.
    pub fn evolve<R: Rng>(&mut self, children: &[Chromosome], rng: &mut R) -> Option<bool> {
        let insertions = self.config.child_insertion_count();
        let fitness = &self.fitness;
        self.population
            .as_mut()
            .map(|population| population.evolve(children, insertions, fitness, rng))
    }

    /// Run one generation, initializing first if needed.
    ///
    /// Marks the run as terminated once the stagnation limit or the
    /// iteration limit is reached. A terminated run is left untouched and
    /// yields `None` without drawing from `rng`.
    pub fn step<R: Rng>(
        &mut self,
        rng: &mut R,
        verbosity: Verbosity,
    ) -> Result<Option<GenerationReport>, ProblemError> {
        if self.population.is_none() {
            self.initialize(rng)?;
        }
        if self.is_terminated() {
            return Ok(None);
        }
        let Some(population) = self.population.as_mut() else {
            unreachable!("population was initialized above");
        };

        self.generation += 1;
        self.state = RunState::Running;
        let detailed = verbosity >= Verbosity::Detailed;

        if detailed {
            debug!("Generation {}: selecting parents", self.generation);
        }
        let parents = population.select_parents(self.config.crossover_count(), &self.fitness, rng);
        if detailed {
            debug!("{} parents selected", parents.len());
        }

        let children = self.genetic.crossover(&parents, rng);
        if detailed {
            debug!("{} children produced by partially mapped crossover", children.len());
        }

        let (children, mutated) =
            self.genetic
                .mutate(children, self.config.mutation_probability(), rng);
        if detailed {
            debug!("{} of {} children mutated by inversion", mutated, children.len());
        }

        for child in &children {
            child.fitness(&self.fitness);
        }

        let new_best = population.evolve(
            &children,
            self.config.child_insertion_count(),
            &self.fitness,
            rng,
        );
        if detailed {
            debug!(
                "New generation obtained with {} replacements",
                self.config.child_insertion_count()
            );
        }

        let sum = population.sum_fitness();
        let improvement_ratio = if self.previous_sum == 0.0 {
            0.0
        } else {
            (sum - self.previous_sum) / self.previous_sum
        };
        self.previous_sum = sum;

        if new_best {
            self.stagnation_counter = 0;
        } else {
            self.stagnation_counter += 1;
        }

        let report = GenerationReport {
            generation: self.generation,
            best_fitness: population.best_fitness(),
            mean_fitness: population.mean_fitness(),
            improvement_ratio,
            new_best,
            mutated,
            stagnation_counter: self.stagnation_counter,
        };

        if verbosity >= Verbosity::Progress {
            info!(
                "Generation {} | best fitness: {} | mean fitness: {:.13} | population fitness change: {:+.5}% | new best: {} | stagnation: {}/{}",
                report.generation,
                report.best_fitness,
                report.mean_fitness,
                report.improvement_ratio * 100.0,
                if report.new_best { "yes" } else { "no" },
                report.stagnation_counter,
                self.config.stagnation_limit()
            );
        }

        if self.stagnation_counter >= self.config.stagnation_limit() {
            self.state = RunState::Terminated(TerminationReason::Stagnated);
        } else if self.generation >= self.config.max_iterations() {
            self.state = RunState::Terminated(TerminationReason::IterationLimitReached);
        }

        Ok(Some(report))
    }

    /// Run the whole algorithm with a random source built from the configured
    /// seed (entropy when unseeded) and return the best chromosome.
    pub fn run(&mut self, verbosity: Verbosity) -> Result<&Chromosome, ProblemError> {
        let mut rng = match self.config.seed() {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.run_with_rng(&mut rng, verbosity)
    }

    /// Run the whole algorithm drawing from `rng`.
    pub fn run_with_rng<R: Rng>(
        &mut self,
        rng: &mut R,
        verbosity: Verbosity,
    ) -> Result<&Chromosome, ProblemError> {
        let start_time = Instant::now();

        if verbosity >= Verbosity::Progress {
            info!("Initializing population and computing fitness");
        }
        self.initialize(rng)?;
        if verbosity >= Verbosity::Summary {
            info!(
                "Population initialized, best fitness: {}",
                self.initial_best_fitness().unwrap_or(f64::NAN)
            );
            info!("Starting optimization");
        }

        while !self.is_terminated() {
            self.step(rng, verbosity)?;
        }

        self.run_time = start_time.elapsed();
        self.finish(verbosity);

        Ok(self
            .population
            .as_ref()
            .map(Population::best)
            .expect("population is initialized before the generation loop"))
    }

    /// Rank the final population and compute the run summary.
    fn finish(&mut self, verbosity: Verbosity) {
        let RunState::Terminated(termination) = self.state else {
            return;
        };
        let Some(population) = self.population.as_mut() else {
            return;
        };

        population.rank(&self.fitness);

        let summary = RunSummary {
            generations: self.generation,
            termination,
            runtime: self.run_time,
            initial_best_fitness: self
                .initial_best
                .as_ref()
                .map_or(f64::NAN, |c| c.fitness(&self.fitness)),
            best_fitness: population.best_fitness(),
            mean_fitness: population.mean_fitness(),
            mean_top_10: population.mean_of_first(10, &self.fitness),
            mean_top_20: population.mean_of_first(20, &self.fitness),
            worst_fitness: population.worst_fitness(&self.fitness),
        };

        if verbosity >= Verbosity::Summary {
            for line in summary.format(&self.config).lines() {
                info!("{}", line);
            }
            if let Some(initial) = &self.initial_best {
                info!("Best chromosome of the initial population: {}", initial);
            }
            info!("Best chromosome overall: {}", population.best());
        }

        self.summary = Some(summary);
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, RunState::Terminated(_))
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn fitness_function(&self) -> &F {
        &self.fitness
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    /// Generations executed so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn stagnation_counter(&self) -> u32 {
        self.stagnation_counter
    }

    pub fn sum_fitness(&self) -> Option<f64> {
        self.population.as_ref().map(Population::sum_fitness)
    }

    pub fn best(&self) -> Option<&Chromosome> {
        self.population.as_ref().map(Population::best)
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.population.as_ref().map(Population::best_fitness)
    }

    pub fn best_slot(&self) -> Option<usize> {
        self.population.as_ref().map(Population::best_slot)
    }

    /// Best chromosome of the initial population.
    pub fn initial_best(&self) -> Option<&Chromosome> {
        self.initial_best.as_ref()
    }

    pub fn initial_best_fitness(&self) -> Option<f64> {
        self.initial_best.as_ref().and_then(Chromosome::cached_fitness)
    }

    /// Final figures, available once a run has terminated.
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Wall-clock time of the last full run.
    pub fn run_time(&self) -> Duration {
        self.run_time
    }
}
