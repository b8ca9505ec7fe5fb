use crate::geometry::{GeneId, GenePool};
use crate::optimizer::chromosome::Chromosome;
use fastrand::Rng;

/// How many random positions a mutation samples before keeping the best.
pub const MUTATION_TRIALS: usize = 3;

/// Chromosome edits that keep the cached fitness current through delta
/// arithmetic instead of re-measuring the whole tour.
pub trait Mutable: Sized {
    fn add_gene(&self, fitness: f64, gene: GeneId, pool: &GenePool, rng: &mut Rng) -> (Self, f64);
    fn move_gene(&self, fitness: f64, pool: &GenePool, rng: &mut Rng) -> (Self, f64);
    fn two_opt(&self, fitness: f64, pool: &GenePool, rng: &mut Rng) -> (Self, f64);
}

impl Mutable for Chromosome {
    fn add_gene(&self, fitness: f64, gene: GeneId, pool: &GenePool, rng: &mut Rng) -> (Self, f64) {
        let (genes, f) = add_gene_to_chromosome(self.genes(), fitness, gene, pool, rng);
        (Chromosome::new(genes), f)
    }

    fn move_gene(&self, fitness: f64, pool: &GenePool, rng: &mut Rng) -> (Self, f64) {
        let (genes, f) = move_gene_in_chromosome(self.genes(), fitness, pool, rng);
        (Chromosome::new(genes), f)
    }

    fn two_opt(&self, fitness: f64, pool: &GenePool, rng: &mut Rng) -> (Self, f64) {
        let (genes, f) = two_opt(self.genes(), fitness, pool, rng);
        (Chromosome::new(genes), f)
    }
}

/// Places `new_gene` between positions `pos` and `pos + 1` (cyclically).
///
/// With a single gene both neighbours are that gene and the current fitness
/// is 0, so the result is the out-and-back distance.
pub fn trial_insertion(
    genes: &[GeneId],
    current_fitness: f64,
    pos: usize,
    new_gene: GeneId,
    pool: &GenePool,
) -> (Vec<GeneId>, f64) {
    if genes.is_empty() {
        return (vec![new_gene], 0.0);
    }
    let len = genes.len();
    let at_pos = genes[pos];
    let at_next = genes[(pos + 1) % len];

    let new_fitness = current_fitness - pool.distance(at_pos, at_next)
        + pool.distance(at_pos, new_gene)
        + pool.distance(new_gene, at_next);

    let mut chrom = Vec::with_capacity(len + 1);
    chrom.extend_from_slice(&genes[..=pos]);
    chrom.push(new_gene);
    chrom.extend_from_slice(&genes[pos + 1..]);
    (chrom, new_fitness)
}

/// Removes the gene at `pos`, joining its two neighbours.
pub fn trial_removal(
    genes: &[GeneId],
    current_fitness: f64,
    pos: usize,
    pool: &GenePool,
) -> (Vec<GeneId>, f64) {
    let len = genes.len();
    if len <= 1 {
        return (Vec::new(), 0.0);
    }
    let before = genes[(pos + len - 1) % len];
    let removed = genes[pos];
    let after = genes[(pos + 1) % len];

    let new_fitness = current_fitness - pool.distance(before, removed)
        - pool.distance(removed, after)
        + pool.distance(before, after);

    let mut chrom = genes.to_vec();
    chrom.remove(pos);
    (chrom, new_fitness)
}

/// Inserts `gene` at the cheapest of up to three sampled positions.
pub fn add_gene_to_chromosome(
    genes: &[GeneId],
    fitness: f64,
    gene: GeneId,
    pool: &GenePool,
    rng: &mut Rng,
) -> (Vec<GeneId>, f64) {
    if genes.is_empty() {
        return (vec![gene], 0.0);
    }

    let trials = rng.choose_multiple(0..genes.len(), MUTATION_TRIALS.min(genes.len()));
    let mut best: Option<(Vec<GeneId>, f64)> = None;
    for pos in trials {
        let (chrom, f) = trial_insertion(genes, fitness, pos, gene, pool);
        if best.as_ref().map_or(true, |(_, best_f)| f < *best_f) {
            best = Some((chrom, f));
        }
    }
    best.unwrap_or_else(|| (genes.to_vec(), fitness))
}

/// Relocates one gene: up to three random genes are lifted out and each is
/// reinserted at the best sampled spot. The best outcome wins even if it is
/// worse than the input.
pub fn move_gene_in_chromosome(
    genes: &[GeneId],
    fitness: f64,
    pool: &GenePool,
    rng: &mut Rng,
) -> (Vec<GeneId>, f64) {
    let len = genes.len();
    if len < 2 {
        return (genes.to_vec(), fitness);
    }

    let mut best: Option<(Vec<GeneId>, f64)> = None;
    for pos in rng.choose_multiple(0..len, MUTATION_TRIALS.min(len)) {
        let removed = genes[pos];
        let (partial, after_removal) = trial_removal(genes, fitness, pos, pool);
        let (chrom, f) = add_gene_to_chromosome(&partial, after_removal, removed, pool, rng);
        if best.as_ref().map_or(true, |(_, best_f)| f < *best_f) {
            best = Some((chrom, f));
        }
    }
    best.unwrap_or_else(|| (genes.to_vec(), fitness))
}

/// 2-opt: reverse the segment `genes[i..=j]`, which swaps the edges
/// (i-1, i) and (j, j+1) for (i-1, j) and (i, j+1). Up to three random
/// segments are tried and the best is kept.
pub fn two_opt(
    genes: &[GeneId],
    fitness: f64,
    pool: &GenePool,
    rng: &mut Rng,
) -> (Vec<GeneId>, f64) {
    let len = genes.len();
    if len < 4 {
        return (genes.to_vec(), fitness);
    }

    let mut best: Option<(Vec<GeneId>, f64)> = None;
    for _ in 0..MUTATION_TRIALS {
        let i = rng.usize(0..len - 1);
        let j = rng.usize(i + 1..len);
        // Reversing the whole tour yields the same cycle.
        if i == 0 && j == len - 1 {
            continue;
        }

        let a = genes[(i + len - 1) % len];
        let b = genes[i];
        let c = genes[j];
        let d = genes[(j + 1) % len];
        let f = fitness - pool.distance(a, b) - pool.distance(c, d)
            + pool.distance(a, c)
            + pool.distance(b, d);

        if best.as_ref().map_or(true, |(_, best_f)| f < *best_f) {
            let mut chrom = genes.to_vec();
            chrom[i..=j].reverse();
            best = Some((chrom, f));
        }
    }
    best.unwrap_or_else(|| (genes.to_vec(), fitness))
}
