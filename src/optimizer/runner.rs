use crate::config::TspParams;
use crate::geometry::{GeneId, GenePool, Link};
use crate::optimizer::{Individual, MutationOp, PathGenerator};
use fastrand::Rng;
use tracing::{debug, trace};

/// Attempts at drawing an individual whose tour is not already in the
/// population before a duplicate is accepted.
pub const MAX_DUPLICATE_ATTEMPTS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub pop_size: usize,
    pub tourn_size: usize,
    /// Percent chance of a uniformly random parent instead of a tournament.
    pub prob_random_parent: u8,
    pub generators: Vec<PathGenerator>,
    pub mutations: Vec<MutationOp>,
}

impl GenerationOptions {
    /// Random paths are always available; the switches add the others.
    pub fn generators_for(greedy: bool, min_spanning_tree: bool) -> Vec<PathGenerator> {
        let mut generators = vec![PathGenerator::RandomPath];
        if greedy {
            generators.push(PathGenerator::GreedyPath);
        }
        if min_spanning_tree {
            generators.push(PathGenerator::SpanningTreePath);
        }
        generators
    }

    pub fn mutations_for(move_element: bool, two_opt: bool) -> Vec<MutationOp> {
        let mut ops = Vec::new();
        if move_element {
            ops.push(MutationOp::MoveElement);
        }
        if two_opt {
            ops.push(MutationOp::TwoOpt);
        }
        ops
    }

    pub fn needs_spanning_tree(&self) -> bool {
        self.generators.contains(&PathGenerator::SpanningTreePath)
    }
}

impl From<&TspParams> for GenerationOptions {
    fn from(p: &TspParams) -> Self {
        Self {
            pop_size: p.pop_size,
            tourn_size: p.tourn_size,
            prob_random_parent: p.prob_random_parent.min(100),
            generators: Self::generators_for(p.greedy, p.min_spanning_tree),
            mutations: Self::mutations_for(p.move_element, p.two_opt),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Population {
    pub members: Vec<Individual>,
    pub generations: usize,
}

impl Population {
    pub fn new(pool: &GenePool, tree: &[Link], opts: &GenerationOptions, rng: &mut Rng) -> Self {
        let mut population = Population::default();
        for _ in 0..opts.pop_size {
            let ind = population.gen_new_individual(pool, tree, opts, rng);
            trace!("Generated {} via {}", ind, ind.generator);
            population.members.push(ind);
        }
        debug!(
            "Initial population of {} (best {:.1})",
            population.members.len(),
            population.best().map_or(0.0, |b| b.fitness)
        );
        population
    }

    /// Draws a new individual, retrying while its tour is already present.
    pub fn gen_new_individual(
        &self,
        pool: &GenePool,
        tree: &[Link],
        opts: &GenerationOptions,
        rng: &mut Rng,
    ) -> Individual {
        let pick = |rng: &mut Rng| {
            rng.choice(opts.generators.iter().copied())
                .unwrap_or(PathGenerator::RandomPath)
        };

        let mut ind = Individual::generate(pick(rng), pool, tree, rng);
        for _ in 1..MAX_DUPLICATE_ATTEMPTS {
            if !self.contains(&ind) {
                break;
            }
            ind = Individual::generate(pick(rng), pool, tree, rng);
        }
        ind
    }

    fn contains(&self, ind: &Individual) -> bool {
        self.members.iter().any(|m| m.chromosome == ind.chromosome)
    }

    /// Tournament selection, or a uniformly random member with
    /// probability `prob_random_parent`%.
    pub fn get_parent(&self, opts: &GenerationOptions, rng: &mut Rng) -> &Individual {
        let len = self.members.len();
        if rng.u8(0..100) < opts.prob_random_parent {
            return &self.members[rng.usize(0..len)];
        }
        let size = opts.tourn_size.clamp(1, len);
        rng.choose_multiple(0..len, size)
            .into_iter()
            .map(|i| &self.members[i])
            .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .unwrap_or(&self.members[0])
    }

    /// One generation: `pop_size / 2` matings, each producing two mutated
    /// children that replace weaker members.
    pub fn generation(&mut self, pool: &GenePool, opts: &GenerationOptions, rng: &mut Rng) {
        if self.members.len() < 2 {
            self.generations += 1;
            return;
        }

        for _ in 0..self.members.len() / 2 {
            let p1 = self.get_parent(opts, rng).clone();
            let p2 = self.get_parent(opts, rng).clone();
            let (c1, c2) = p1.mate_with(&p2, pool, rng);
            for child in [c1, c2] {
                let child = child.mutate(&opts.mutations, pool, rng);
                self.replace_weaker(child, rng);
            }
        }
        self.generations += 1;

        if let Some(best) = self.best() {
            debug!("Generation {}: best {:.2}", self.generations, best.fitness);
        }
    }

    /// Samples two members and swaps the weaker one for `child` when the
    /// child is strictly fitter.
    fn replace_weaker(&mut self, child: Individual, rng: &mut Rng) {
        let picks = rng.choose_multiple(0..self.members.len(), 2);
        let weaker = picks
            .into_iter()
            .max_by(|&a, &b| self.members[a].fitness.total_cmp(&self.members[b].fitness));
        if let Some(idx) = weaker {
            if child.fitness < self.members[idx].fitness {
                self.members[idx] = child;
            }
        }
    }

    pub fn best(&self) -> Option<&Individual> {
        self.members
            .iter()
            .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    pub fn recompute_fitness(&mut self, pool: &GenePool) {
        for ind in &mut self.members {
            ind.compute_fitness(pool);
        }
    }

    pub fn add_gene(&mut self, gene: GeneId, pool: &GenePool, rng: &mut Rng) {
        for ind in &mut self.members {
            ind.add_gene(gene, pool, rng);
        }
    }

    pub fn remove_gene(&mut self, gene: GeneId, pool: &GenePool) {
        for ind in &mut self.members {
            ind.remove_gene(gene, pool);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::chromosome::FitnessEvaluable;
    use crate::optimizer::mst::minimum_spanning_tree;

    fn setup(seed: u64) -> (GenePool, Vec<Link>, GenerationOptions, Rng) {
        let mut rng = Rng::with_seed(seed);
        let pool = GenePool::random(&mut rng, 12, 80.0, 40.0, 0.75);
        let tree = minimum_spanning_tree(&pool);
        let opts = GenerationOptions::from(&TspParams::default());
        (pool, tree, opts, rng)
    }

    #[test]
    fn test_population_size_and_fitness() {
        let (pool, tree, opts, mut rng) = setup(5);
        let pop = Population::new(&pool, &tree, &opts, &mut rng);
        assert_eq!(pop.members.len(), opts.pop_size);
        for ind in &pop.members {
            assert_eq!(ind.chromosome.len(), pool.len());
            assert!((ind.fitness - ind.chromosome.fitness(&pool)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_best_never_worsens() {
        let (pool, tree, opts, mut rng) = setup(11);
        let mut pop = Population::new(&pool, &tree, &opts, &mut rng);
        let mut best = pop.best().map(|b| b.fitness).unwrap();
        for _ in 0..30 {
            pop.generation(&pool, &opts, &mut rng);
            let now = pop.best().map(|b| b.fitness).unwrap();
            assert!(now <= best + 1e-9);
            best = now;
        }
        assert_eq!(pop.generations, 30);
    }

    #[test]
    fn test_certain_random_parent_still_returns_member() {
        let (pool, tree, mut opts, mut rng) = setup(2);
        opts.prob_random_parent = 100;
        let pop = Population::new(&pool, &tree, &opts, &mut rng);
        let parent = pop.get_parent(&opts, &mut rng);
        assert!(pop.members.contains(parent));
    }

    #[test]
    fn test_full_tournament_picks_best() {
        let (pool, tree, mut opts, mut rng) = setup(3);
        opts.prob_random_parent = 0;
        opts.tourn_size = opts.pop_size;
        let pop = Population::new(&pool, &tree, &opts, &mut rng);
        let best = pop.best().unwrap().fitness;
        assert_eq!(pop.get_parent(&opts, &mut rng).fitness, best);
    }

    #[test]
    fn test_generator_switches() {
        assert_eq!(
            GenerationOptions::generators_for(false, false),
            vec![PathGenerator::RandomPath]
        );
        assert!(GenerationOptions::mutations_for(false, false).is_empty());
    }
}
