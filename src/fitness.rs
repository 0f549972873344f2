//! Objective functions.

use crate::chromosome::{site_of, table_of, Gene};
use crate::problem::Problem;
use std::collections::HashSet;

/// A deterministic objective over a gene sequence. Higher is better.
///
/// Any `Fn(&[Gene]) -> f64` closure implements this trait.
pub trait Fitness {
    fn evaluate(&self, assignment: &[Gene]) -> f64;
}

impl<F> Fitness for F
where
    F: Fn(&[Gene]) -> f64,
{
    fn evaluate(&self, assignment: &[Gene]) -> f64 {
        self(assignment)
    }
}

/// Sum of per-pair scores taken from the problem's score matrix.
///
/// Without a score matrix every pair is worth 1 and each distinct site in
/// use adds 1, so spreading tables over more sites is preferred.
#[derive(Debug, Clone)]
pub struct SiteScore {
    scores: Option<Vec<Vec<f64>>>,
}

impl SiteScore {
    pub fn new(problem: &Problem) -> Self {
        SiteScore {
            scores: problem.scores().map(<[Vec<f64>]>::to_vec),
        }
    }
}

impl Fitness for SiteScore {
    fn evaluate(&self, assignment: &[Gene]) -> f64 {
        if let Some(scores) = &self.scores {
            return assignment
                .iter()
                .map(|&g| scores[table_of(g) - 1][site_of(g) - 1])
                .sum();
        }

        let distinct_sites: HashSet<usize> = assignment.iter().map(|&g| site_of(g)).collect();
        (assignment.len() + distinct_sites.len()) as f64
    }
}
