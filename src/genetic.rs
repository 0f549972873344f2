//! Genetic operators: partially mapped crossover and segment inversion.
//!
//! Both operators only relocate genes that already exist in feasible parents,
//! so every child stays a bijection over the tables with compatible sites.

use crate::chromosome::{table_of, Chromosome, EMPTY};
use rand::Rng;

/// Implements the genetic operators (crossover, mutation).
pub struct Genetic;

impl Genetic {
    /// Cross consecutive parent pairs, producing one child per pair.
    pub fn crossover<R: Rng>(&self, parents: &[&Chromosome], rng: &mut R) -> Vec<Chromosome> {
        parents
            .chunks_exact(2)
            .map(|pair| self.pmx(pair[0], pair[1], rng))
            .collect()
    }

    /// Partially mapped crossover (PMX) of two parents of equal length.
    pub fn pmx<R: Rng>(
        &self,
        first: &Chromosome,
        second: &Chromosome,
        rng: &mut R,
    ) -> Chromosome {
        let a = first.assignment();
        let a_slots = first.table_slots();
        let b = second.assignment();
        let b_slots = second.table_slots();
        let n = a.len();
        debug_assert_eq!(n, b.len());

        // Inclusive segment, a single slot is allowed
        let start = rng.gen_range(0..n);
        let end = start + rng.gen_range(0..n - start);
        let segment = start..=end;

        let mut child = vec![EMPTY; n];
        let mut slots = vec![0usize; n];

        child[segment.clone()].copy_from_slice(&a[segment.clone()]);

        for j in segment.clone() {
            slots[table_of(a[j]) - 1] = j;

            let table_b = table_of(b[j]);
            if segment.contains(&a_slots[table_b - 1]) {
                continue;
            }

            // Follow the mapping a[k] -> position in b until a free slot turns up
            let mut k = j;
            loop {
                k = b_slots[table_of(a[k]) - 1];
                if child[k] == EMPTY {
                    break;
                }
            }
            child[k] = b[j];
            slots[table_b - 1] = k;
        }

        for (j, gene) in child.iter_mut().enumerate() {
            if *gene == EMPTY {
                *gene = b[j];
                slots[table_of(b[j]) - 1] = j;
            }
        }

        Chromosome::from_parts(child, slots)
    }

    /// Mutate each child with probability `probability`.
    ///
    /// Returns the new children and how many of them were mutated.
    pub fn mutate<R: Rng>(
        &self,
        children: Vec<Chromosome>,
        probability: f64,
        rng: &mut R,
    ) -> (Vec<Chromosome>, usize) {
        let mut mutated = 0;
        let mut output = Vec::with_capacity(children.len());

        for child in children {
            if rng.gen::<f64>() >= probability {
                output.push(child);
                continue;
            }
            output.push(self.invert(&child, rng));
            mutated += 1;
        }

        (output, mutated)
    }

    /// Reverse a random segment of at least two slots in a copy of `chromosome`.
    ///
    /// Chromosomes with fewer than two slots are returned unchanged.
    pub fn invert<R: Rng>(&self, chromosome: &Chromosome, rng: &mut R) -> Chromosome {
        let n = chromosome.len();
        if n < 2 {
            return chromosome.clone();
        }

        let start = rng.gen_range(0..n - 1);
        let end = if n == 2 { 1 } else { rng.gen_range(start + 1..n) };

        let mut genes = chromosome.assignment().to_vec();
        let mut slots = chromosome.table_slots().to_vec();

        let (mut i, mut k) = (start, end);
        while i < k {
            slots[table_of(genes[i]) - 1] = k;
            slots[table_of(genes[k]) - 1] = i;
            genes.swap(i, k);
            i += 1;
            k -= 1;
        }

        Chromosome::from_parts(genes, slots)
    }
}
