//! Chromosome representation: one candidate assignment of tables to sites.
//!
//! A gene packs a table id and a site id into a single value,
//! `table * 100 + site`. The slot a gene occupies carries no meaning; the
//! table is always read from the gene itself. Each chromosome also keeps the
//! inverse index `table_slots[table - 1] = slot` so operators can locate a
//! table in O(1).

use crate::error::ProblemError;
use crate::fitness::Fitness;
use crate::problem::Problem;
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cell::OnceCell;
use std::fmt;

/// Encoded `(table, site)` pair.
pub type Gene = u32;

/// Placeholder for a slot that has not been filled yet. No valid gene is 0
/// since table ids start at 1.
pub const EMPTY: Gene = 0;

const SITE_BASE: Gene = 100;

/// Pack a 1-based table id and a 1-based site id into a gene.
pub fn encode(table: usize, site: usize) -> Gene {
    table as Gene * SITE_BASE + site as Gene
}

/// Table id (1-based) of a gene.
#[inline]
pub fn table_of(gene: Gene) -> usize {
    (gene / SITE_BASE) as usize
}

/// Site id (1-based) of a gene.
#[inline]
pub fn site_of(gene: Gene) -> usize {
    (gene % SITE_BASE) as usize
}

/// An immutable candidate solution with a lazily computed fitness.
#[derive(Clone)]
pub struct Chromosome {
    assignment: Vec<Gene>,
    table_slots: Vec<usize>,
    fitness: OnceCell<f64>,
}

impl Chromosome {
    /// Draw a random feasible chromosome: every table gets a compatible site
    /// chosen uniformly, then the genes are shuffled across the slots.
    pub fn random<R: Rng>(problem: &Problem, rng: &mut R) -> Result<Self, ProblemError> {
        let mut assignment = Vec::with_capacity(problem.num_tables());
        for table in 1..=problem.num_tables() {
            let site = problem
                .compatible_sites(table)
                .choose(rng)
                .ok_or(ProblemError::NoCompatibleSite { table })?;
            assignment.push(encode(table, *site));
        }
        assignment.shuffle(rng);

        let table_slots = Self::index_tables(&assignment);
        Ok(Self::from_parts(assignment, table_slots))
    }

    /// Build a chromosome from an explicit gene sequence.
    ///
    /// Returns `None` unless every table `1..=len` appears exactly once.
    /// Site compatibility is not checked here, see [`Chromosome::is_valid`].
    pub fn from_assignment(assignment: Vec<Gene>) -> Option<Self> {
        let n = assignment.len();
        let mut seen = vec![false; n];
        for &gene in &assignment {
            let table = table_of(gene);
            if table == 0 || table > n || seen[table - 1] {
                return None;
            }
            seen[table - 1] = true;
        }
        let table_slots = Self::index_tables(&assignment);
        Some(Self::from_parts(assignment, table_slots))
    }

    /// Assemble a chromosome from operator output. The caller guarantees
    /// that `table_slots` is the exact inverse of `assignment`.
    pub(crate) fn from_parts(assignment: Vec<Gene>, table_slots: Vec<usize>) -> Self {
        debug_assert_eq!(assignment.len(), table_slots.len());
        Chromosome {
            assignment,
            table_slots,
            fitness: OnceCell::new(),
        }
    }

    fn index_tables(assignment: &[Gene]) -> Vec<usize> {
        let mut slots = vec![0; assignment.len()];
        for (slot, &gene) in assignment.iter().enumerate() {
            slots[table_of(gene) - 1] = slot;
        }
        slots
    }

    /// The gene sequence, one gene per slot.
    pub fn assignment(&self) -> &[Gene] {
        &self.assignment
    }

    /// Inverse index: `table_slots()[t - 1]` is the slot holding table `t`.
    pub fn table_slots(&self) -> &[usize] {
        &self.table_slots
    }

    /// Number of tables (and slots).
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Site assigned to `table` (1-based).
    pub fn site_of_table(&self, table: usize) -> usize {
        site_of(self.assignment[self.table_slots[table - 1]])
    }

    /// Fitness of this chromosome, computed on first access and cached.
    pub fn fitness<F: Fitness + ?Sized>(&self, fitness: &F) -> f64 {
        *self
            .fitness
            .get_or_init(|| fitness.evaluate(&self.assignment))
    }

    /// Cached fitness, if it has been realized.
    pub fn cached_fitness(&self) -> Option<f64> {
        self.fitness.get().copied()
    }

    /// Check every chromosome invariant against `problem`: the genes form a
    /// bijection over the tables, each pairing is compatible, and the inverse
    /// index matches the assignment.
    pub fn is_valid(&self, problem: &Problem) -> bool {
        let n = problem.num_tables();
        if self.assignment.len() != n || self.table_slots.len() != n {
            return false;
        }

        let tables_are_permutation = self
            .assignment
            .iter()
            .map(|&g| table_of(g))
            .sorted_unstable()
            .eq(1..=n);
        if !tables_are_permutation {
            return false;
        }

        let compatible = self
            .assignment
            .iter()
            .all(|&g| problem.is_compatible(table_of(g), site_of(g)));

        let indexed = self
            .table_slots
            .iter()
            .enumerate()
            .all(|(t, &slot)| slot < n && table_of(self.assignment[slot]) == t + 1);

        compatible && indexed
    }
}

impl PartialEq for Chromosome {
    fn eq(&self, other: &Self) -> bool {
        self.assignment == other.assignment
    }
}

impl Eq for Chromosome {}

impl fmt::Debug for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chromosome")
            .field("assignment", &self.assignment)
            .field("fitness", &self.fitness.get())
            .finish()
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, gene) in self.assignment.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "T{}->S{:02}", table_of(*gene), site_of(*gene))?;
        }
        write!(f, "]")?;
        if let Some(fitness) = self.fitness.get() {
            write!(f, " fitness={}", fitness)?;
        }
        Ok(())
    }
}
