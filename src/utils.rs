//! Utility functions and structures for reporting a run.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::chromosome::{site_of, table_of, Chromosome};
use crate::config::RunConfig;
use crate::problem::Problem;
use crate::TerminationReason;

/// Format a duration as hours, minutes, seconds and milliseconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!(
        "{}h {:02}m {:02}s {:03}ms",
        hours,
        minutes,
        seconds,
        duration.subsec_millis()
    )
}

/// Save an assignment to a file, one `table -> site` line per table.
pub fn save_solution<P: AsRef<Path>>(
    solution: &Chromosome,
    fitness: f64,
    problem: &Problem,
    path: P,
) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "Assignment for instance: {}", problem.name)?;
    writeln!(file, "Fitness: {}", fitness)?;
    writeln!(file, "Tables: {}", problem.num_tables())?;
    writeln!(file)?;

    let mut pairs: Vec<(usize, usize)> = solution
        .assignment()
        .iter()
        .map(|&g| (table_of(g), site_of(g)))
        .collect();
    pairs.sort_unstable();

    for (table, site) in pairs {
        writeln!(file, "Table {} -> Site {}", table, site)?;
    }

    Ok(())
}

/// Final figures of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub generations: u32,
    pub termination: TerminationReason,
    pub runtime: Duration,
    /// Best fitness right after initialization
    pub initial_best_fitness: f64,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    /// Mean fitness of the 10 best members (all members if fewer)
    pub mean_top_10: f64,
    /// Mean fitness of the 20 best members (all members if fewer)
    pub mean_top_20: f64,
    pub worst_fitness: f64,
}

impl RunSummary {
    /// Format the summary together with the parameters that produced it.
    pub fn format(&self, config: &RunConfig) -> String {
        let outcome = match self.termination {
            TerminationReason::Stagnated => "stopped by stagnation",
            TerminationReason::IterationLimitReached => "completed",
        };
        format!(
            "Optimization {} after {} generations
- Parameters: max_iterations: {} | population_size: {} | crossover_count: {} | mutation_probability: {} | child_insertion_count: {} | stagnation_limit: {}
- Runtime: {} ({:.3} ms)
- Best fitness of the initial population: {}
- Best fitness of the final population: {}
- Mean fitness of the final population: {}
- Mean fitness of the 10 best final members: {}
- Mean fitness of the 20 best final members: {}
- Worst fitness of the final population: {}",
            outcome,
            self.generations,
            config.max_iterations(),
            config.population_size(),
            config.crossover_count(),
            config.mutation_probability(),
            config.child_insertion_count(),
            config.stagnation_limit(),
            format_duration(self.runtime),
            self.runtime.as_secs_f64() * 1000.0,
            self.initial_best_fitness,
            self.best_fitness,
            self.mean_fitness,
            self.mean_top_10,
            self.mean_top_20,
            self.worst_fitness
        )
    }
}
