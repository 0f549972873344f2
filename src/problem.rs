//! Problem definition: tables, sites and their compatibility.

use crate::error::{Error, ProblemError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest site id that fits the two-digit site part of an encoded gene.
pub const MAX_SITES: usize = 99;

/// An assignment problem instance.
///
/// `compatibility[t][s]` tells whether table `t + 1` may be placed on site
/// `s + 1`. The optional `scores` matrix has the same shape and feeds the
/// [`SiteScore`](crate::fitness::SiteScore) objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    compatibility: Vec<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scores: Option<Vec<Vec<f64>>>,
    /// Compatible site ids (1-based) per table, derived from `compatibility`
    #[serde(skip)]
    compatible_sites: Vec<Vec<usize>>,
}

impl Problem {
    /// Create a new problem, checking the shape of the matrices.
    pub fn new(
        name: String,
        compatibility: Vec<Vec<bool>>,
        scores: Option<Vec<Vec<f64>>>,
    ) -> Result<Self, ProblemError> {
        let num_sites = match compatibility.first() {
            None => return Err(ProblemError::NoTables),
            Some(row) if row.is_empty() => return Err(ProblemError::NoSites),
            Some(row) => row.len(),
        };
        if num_sites > MAX_SITES {
            return Err(ProblemError::TooManySites { num_sites });
        }

        for (t, row) in compatibility.iter().enumerate() {
            if row.len() != num_sites {
                return Err(ProblemError::RaggedCompatibility {
                    table: t + 1,
                    expected: num_sites,
                    found: row.len(),
                });
            }
        }

        if let Some(scores) = &scores {
            if scores.len() != compatibility.len() {
                return Err(ProblemError::ScoreRows {
                    expected: compatibility.len(),
                    found: scores.len(),
                });
            }
            for (t, row) in scores.iter().enumerate() {
                if row.len() != num_sites {
                    return Err(ProblemError::ScoreShape {
                        table: t + 1,
                        expected: num_sites,
                        found: row.len(),
                    });
                }
            }
        }

        let compatible_sites = Self::collect_compatible_sites(&compatibility);

        Ok(Problem {
            name,
            compatibility,
            scores,
            compatible_sites,
        })
    }

    /// Load a problem from a JSON file.
    ///
    /// The file holds `name`, `compatibility` (rows of booleans, one row per
    /// table) and optionally `scores` (rows of numbers, same shape).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        let raw: Problem = serde_json::from_str(&text)?;
        Ok(Problem::new(raw.name, raw.compatibility, raw.scores)?)
    }

    /// Get the number of tables.
    pub fn num_tables(&self) -> usize {
        self.compatibility.len()
    }

    /// Get the number of sites.
    pub fn num_sites(&self) -> usize {
        self.compatibility.first().map_or(0, Vec::len)
    }

    /// Whether table `table` may be placed on site `site` (both 1-based).
    pub fn is_compatible(&self, table: usize, site: usize) -> bool {
        table >= 1
            && site >= 1
            && self
                .compatibility
                .get(table - 1)
                .and_then(|row| row.get(site - 1))
                .copied()
                .unwrap_or(false)
    }

    /// Sites (1-based) that accept table `table` (1-based).
    pub fn compatible_sites(&self, table: usize) -> &[usize] {
        &self.compatible_sites[table - 1]
    }

    /// Score matrix, one row per table, if the instance carries one.
    pub fn scores(&self) -> Option<&[Vec<f64>]> {
        self.scores.as_deref()
    }

    fn collect_compatible_sites(compatibility: &[Vec<bool>]) -> Vec<Vec<usize>> {
        compatibility
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, &ok)| ok)
                    .map(|(s, _)| s + 1)
                    .collect()
            })
            .collect()
    }
}
