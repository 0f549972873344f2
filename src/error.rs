//! Error types for configuration, input data and I/O.

use thiserror::Error;

/// Invalid run parameters, detected when the run configuration is derived.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "crossover is not possible with the given parameters \
         (population_size: {population_size}, crossover_fraction: {crossover_fraction})"
    )]
    InvalidCrossoverSizing {
        population_size: usize,
        crossover_fraction: f64,
    },
    #[error(
        "population evolution is not possible with the given parameters \
         (crossover_count: {crossover_count}, child_insertion_fraction: {child_insertion_fraction})"
    )]
    InvalidInsertionSizing {
        crossover_count: usize,
        child_insertion_fraction: f64,
    },
}

/// Malformed or infeasible input data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProblemError {
    #[error("problem has no tables")]
    NoTables,
    #[error("problem has no sites")]
    NoSites,
    #[error("{num_sites} sites do not fit the two-digit site encoding (max 99)")]
    TooManySites { num_sites: usize },
    #[error("compatibility row for table {table} has {found} entries, expected {expected}")]
    RaggedCompatibility {
        table: usize,
        expected: usize,
        found: usize,
    },
    #[error("score matrix has {found} rows, expected {expected}")]
    ScoreRows { expected: usize, found: usize },
    #[error("score row for table {table} has {found} entries, expected {expected}")]
    ScoreShape {
        table: usize,
        expected: usize,
        found: usize,
    },
    #[error("table {table} has no compatible site, no feasible assignment exists")]
    NoCompatibleSite { table: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
