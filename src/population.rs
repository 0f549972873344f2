//! Population management for the genetic algorithm.

use crate::chromosome::Chromosome;
use crate::config::RunConfig;
use crate::error::ProblemError;
use crate::fitness::Fitness;
use crate::problem::Problem;
use rand::Rng;

/// The current generation plus running aggregates.
///
/// `sum_fitness` and the best-tracking fields are updated incrementally on
/// every replacement rather than recomputed.
#[derive(Debug, Clone)]
pub struct Population {
    members: Vec<Chromosome>,
    sum_fitness: f64,
    best: Chromosome,
    best_fitness: f64,
    best_slot: usize,
}

impl Population {
    /// Draw `population_size` random feasible chromosomes and evaluate them.
    ///
    /// The first chromosome reaching the maximum fitness becomes the best.
    pub fn initialize<F, R>(
        problem: &Problem,
        fitness: &F,
        config: &RunConfig,
        rng: &mut R,
    ) -> Result<Self, ProblemError>
    where
        F: Fitness + ?Sized,
        R: Rng,
    {
        let size = config.population_size();
        let mut members = Vec::with_capacity(size);
        let mut sum_fitness = 0.0;
        let mut best_fitness = f64::NEG_INFINITY;
        let mut best_slot = 0;

        for slot in 0..size {
            let chromosome = Chromosome::random(problem, rng)?;
            let value = chromosome.fitness(fitness);
            sum_fitness += value;
            if slot == 0 || value > best_fitness {
                best_fitness = value;
                best_slot = slot;
            }
            members.push(chromosome);
        }

        let best = members[best_slot].clone();
        Ok(Population {
            members,
            sum_fitness,
            best,
            best_fitness,
            best_slot,
        })
    }

    /// Binary tournament selection of `count` parents.
    ///
    /// Each tournament draws two distinct slots and keeps the fitter member,
    /// the first drawn on ties. Parents may repeat.
    pub fn select_parents<F, R>(&self, count: usize, fitness: &F, rng: &mut R) -> Vec<&Chromosome>
    where
        F: Fitness + ?Sized,
        R: Rng,
    {
        let size = self.members.len();
        let mut parents = Vec::with_capacity(count);

        for _ in 0..count {
            let first = rng.gen_range(0..size);
            let mut second = rng.gen_range(0..size);
            while second == first {
                second = rng.gen_range(0..size);
            }

            let (a, b) = (&self.members[first], &self.members[second]);
            if a.fitness(fitness) >= b.fitness(fitness) {
                parents.push(a);
            } else {
                parents.push(b);
            }
        }

        parents
    }

    /// Steady-state replacement: `insertions` times, a random child overwrites
    /// a random member other than the current best.
    ///
    /// Returns whether a strictly better chromosome was installed.
    pub fn evolve<F, R>(
        &mut self,
        children: &[Chromosome],
        insertions: usize,
        fitness: &F,
        rng: &mut R,
    ) -> bool
    where
        F: Fitness + ?Sized,
        R: Rng,
    {
        if children.is_empty() {
            return false;
        }

        let size = self.members.len();
        let mut improved = false;

        for _ in 0..insertions {
            let incoming = &children[rng.gen_range(0..children.len())];

            let slot = if size == 2 {
                1 - self.best_slot
            } else {
                let mut slot = rng.gen_range(0..size);
                while slot == self.best_slot {
                    slot = rng.gen_range(0..size);
                }
                slot
            };

            let incoming_fitness = incoming.fitness(fitness);
            self.sum_fitness -= self.members[slot].fitness(fitness);
            self.sum_fitness += incoming_fitness;
            self.members[slot] = incoming.clone();

            if incoming_fitness > self.best_fitness {
                self.best = incoming.clone();
                self.best_fitness = incoming_fitness;
                self.best_slot = slot;
                improved = true;
            }
        }

        improved
    }

    /// Sort members by descending fitness and re-point the best slot.
    pub fn rank<F: Fitness + ?Sized>(&mut self, fitness: &F) {
        self.members
            .sort_by(|a, b| b.fitness(fitness).total_cmp(&a.fitness(fitness)));
        self.best_slot = self
            .members
            .iter()
            .position(|c| *c == self.best)
            .unwrap_or(0);
    }

    /// Mean fitness of the `k` first members, fewer if the population is smaller.
    ///
    /// Only meaningful after [`Population::rank`].
    pub fn mean_of_first<F: Fitness + ?Sized>(&self, k: usize, fitness: &F) -> f64 {
        let k = k.min(self.members.len());
        if k == 0 {
            return 0.0;
        }
        self.members[..k]
            .iter()
            .map(|c| c.fitness(fitness))
            .sum::<f64>()
            / k as f64
    }

    /// Lowest fitness in the population.
    pub fn worst_fitness<F: Fitness + ?Sized>(&self, fitness: &F) -> f64 {
        self.members
            .iter()
            .map(|c| c.fitness(fitness))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn members(&self) -> &[Chromosome] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Running sum of every member's fitness.
    pub fn sum_fitness(&self) -> f64 {
        self.sum_fitness
    }

    pub fn mean_fitness(&self) -> f64 {
        self.sum_fitness / self.members.len() as f64
    }

    pub fn best(&self) -> &Chromosome {
        &self.best
    }

    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    pub fn best_slot(&self) -> usize {
        self.best_slot
    }
}
