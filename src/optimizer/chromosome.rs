use crate::geometry::{GeneId, GenePool, Link};
use std::fmt;

/// Anything whose quality is a tour length (lower is better).
pub trait FitnessEvaluable {
    fn fitness(&self, pool: &GenePool) -> f64;
}

/// Sum of consecutive distances including the closing edge.
/// Fewer than two genes means no edges, so the length is 0.
pub fn path_length(genes: &[GeneId], pool: &GenePool) -> f64 {
    let len = genes.len();
    if len < 2 {
        return 0.0;
    }
    (0..len)
        .map(|i| pool.distance(genes[i], genes[(i + 1) % len]))
        .sum()
}

/// A cyclic tour over the gene pool.
///
/// Tours are stored canonically: rotated so the smallest id comes first and
/// oriented so that its smaller neighbour comes second. Two chromosomes
/// describing the same cycle therefore compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Chromosome(Vec<GeneId>);

impl Chromosome {
    pub fn new(genes: Vec<GeneId>) -> Self {
        Chromosome(canonical(genes))
    }

    pub fn genes(&self) -> &[GeneId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, gene: GeneId) -> bool {
        self.0.contains(&gene)
    }

    pub fn links(&self, pool: &GenePool) -> Vec<Link> {
        pool.seq_to_links(&self.0)
    }

    /// Drops `gene` from the tour; the closing edge is rejoined.
    pub fn without(&self, gene: GeneId) -> Chromosome {
        Chromosome::new(self.0.iter().copied().filter(|&g| g != gene).collect())
    }
}

impl FitnessEvaluable for Chromosome {
    fn fitness(&self, pool: &GenePool) -> f64 {
        path_length(&self.0, pool)
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|g| g.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

fn canonical(mut genes: Vec<GeneId>) -> Vec<GeneId> {
    let len = genes.len();
    if len < 3 {
        if len == 2 && genes[1] < genes[0] {
            genes.swap(0, 1);
        }
        return genes;
    }

    let first = (0..len).min_by_key(|&i| genes[i]).unwrap_or(0);
    genes.rotate_left(first);

    // genes[0] is now the minimum; walk towards its smaller neighbour.
    if genes[len - 1] < genes[1] {
        genes[1..].reverse();
    }
    genes
}
