pub mod chromosome;
pub mod crossover;
pub mod initialization;
pub mod mst;
pub mod mutation;
pub mod runner;

use self::chromosome::{Chromosome, FitnessEvaluable};
use self::mutation::Mutable;
use crate::geometry::{GeneId, GenePool, Link};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// How an initial tour was built.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum PathGenerator {
    RandomPath,
    GreedyPath,
    SpanningTreePath,
}

impl PathGenerator {
    /// Builds a gene sequence. `tree` is only read by `SpanningTreePath`.
    pub fn build(self, pool: &GenePool, tree: &[Link], rng: &mut Rng) -> Vec<GeneId> {
        match self {
            PathGenerator::RandomPath => initialization::random_path(pool, rng),
            PathGenerator::GreedyPath => initialization::greedy_path(pool, rng),
            PathGenerator::SpanningTreePath => initialization::spanning_tree_path(pool, tree),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum MutationOp {
    #[strum(serialize = "Move element")]
    MoveElement,
    #[strum(serialize = "2-Opt")]
    TwoOpt,
}

/// One member of the population: a tour plus its cached length.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub chromosome: Chromosome,
    pub fitness: f64,
    pub generator: PathGenerator,
}

impl Individual {
    pub fn new(chromosome: Chromosome, generator: PathGenerator, pool: &GenePool) -> Self {
        let fitness = chromosome.fitness(pool);
        Self {
            chromosome,
            fitness,
            generator,
        }
    }

    /// Builds a fresh individual with `generator`.
    pub fn generate(generator: PathGenerator, pool: &GenePool, tree: &[Link], rng: &mut Rng) -> Self {
        let genes = generator.build(pool, tree, rng);
        Self::new(Chromosome::new(genes), generator, pool)
    }

    pub fn compute_fitness(&mut self, pool: &GenePool) {
        self.fitness = self.chromosome.fitness(pool);
    }

    /// Order-preserving crossover. Children inherit their first parent's
    /// generator tag.
    pub fn mate_with(&self, other: &Individual, pool: &GenePool, rng: &mut Rng) -> (Individual, Individual) {
        let (c1, c2) =
            crossover::cx_all_diff(self.chromosome.genes(), other.chromosome.genes(), rng);
        (
            Individual::new(Chromosome::new(c1), self.generator, pool),
            Individual::new(Chromosome::new(c2), other.generator, pool),
        )
    }

    /// Applies one randomly chosen operation from `ops`.
    /// With no operations enabled the individual is returned unchanged.
    pub fn mutate(&self, ops: &[MutationOp], pool: &GenePool, rng: &mut Rng) -> Individual {
        let Some(&op) = rng.choice(ops) else {
            return self.clone();
        };
        let (chromosome, fitness) = match op {
            MutationOp::MoveElement => self.chromosome.move_gene(self.fitness, pool, rng),
            MutationOp::TwoOpt => self.chromosome.two_opt(self.fitness, pool, rng),
        };
        Individual {
            chromosome,
            fitness,
            generator: self.generator,
        }
    }

    /// Inserts a newly created gene at the cheapest sampled position.
    pub fn add_gene(&mut self, gene: GeneId, pool: &GenePool, rng: &mut Rng) {
        let (chromosome, fitness) = self.chromosome.add_gene(self.fitness, gene, pool, rng);
        self.chromosome = chromosome;
        self.fitness = fitness;
    }

    /// Drops a gene that has been removed from the pool. The fitness is
    /// re-measured since `pool` no longer holds the removed position.
    pub fn remove_gene(&mut self, gene: GeneId, pool: &GenePool) {
        self.chromosome = self.chromosome.without(gene);
        self.compute_fitness(pool);
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}: {}", self.fitness, self.chromosome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use std::str::FromStr;

    fn square() -> GenePool {
        GenePool::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ])
    }

    #[test]
    fn test_strum_names() {
        assert_eq!(PathGenerator::SpanningTreePath.to_string(), "spanning_tree_path");
        assert_eq!(MutationOp::from_str("2-Opt").unwrap(), MutationOp::TwoOpt);
        assert_eq!(MutationOp::MoveElement.to_string(), "Move element");
    }

    #[test]
    fn test_mutate_without_ops_is_identity() {
        let pool = square();
        let mut rng = Rng::with_seed(1);
        let ind = Individual::new(Chromosome::new(vec![0, 2, 1, 3]), PathGenerator::RandomPath, &pool);
        assert_eq!(ind.mutate(&[], &pool, &mut rng), ind);
    }

    #[test]
    fn test_mutate_keeps_cached_fitness_exact() {
        let pool = square();
        let mut rng = Rng::with_seed(9);
        let mut ind = Individual::new(Chromosome::new(vec![0, 2, 1, 3]), PathGenerator::RandomPath, &pool);
        for _ in 0..20 {
            ind = ind.mutate(&[MutationOp::MoveElement, MutationOp::TwoOpt], &pool, &mut rng);
            assert!((ind.fitness - ind.chromosome.fitness(&pool)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_add_then_remove_gene_restores_fitness() {
        let mut pool = square();
        let mut rng = Rng::with_seed(4);
        let mut ind = Individual::new(Chromosome::new(vec![0, 1, 2, 3]), PathGenerator::GreedyPath, &pool);
        let before = ind.fitness;

        let extra = pool.add(Point::new(0.5, 3.0), Default::default());
        ind.add_gene(extra, &pool, &mut rng);
        assert_eq!(ind.chromosome.len(), 5);
        assert!((ind.fitness - ind.chromosome.fitness(&pool)).abs() < 1e-9);

        pool.remove(extra);
        ind.remove_gene(extra, &pool);
        assert!((ind.fitness - before).abs() < 1e-9);
    }
}
