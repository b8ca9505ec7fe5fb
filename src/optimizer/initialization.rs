use crate::geometry::{GeneId, GenePool, Link};
use crate::optimizer::chromosome::path_length;
use fastrand::Rng;
use std::collections::{BTreeMap, HashSet};

/// Uniformly random permutation of the gene pool.
pub fn random_path(pool: &GenePool, rng: &mut Rng) -> Vec<GeneId> {
    let mut path = pool.ids();
    rng.shuffle(&mut path);
    path
}

/// Nearest-neighbour tour from a random start.
/// Ties go to the candidate with the lowest id.
pub fn greedy_path(pool: &GenePool, rng: &mut Rng) -> Vec<GeneId> {
    let mut remaining = pool.ids();
    if remaining.is_empty() {
        return remaining;
    }

    let mut current = remaining.remove(rng.usize(0..remaining.len()));
    let mut path = Vec::with_capacity(pool.len());
    path.push(current);

    while !remaining.is_empty() {
        let nearest = remaining
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                pool.distance(current, **a)
                    .total_cmp(&pool.distance(current, **b))
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        current = remaining.remove(nearest);
        path.push(current);
    }
    path
}

/// Depth-first visit order of `tree` starting at `root`.
/// Children are visited in the order their edges appear in `tree`.
pub fn spanning_tree_route(tree: &[Link], root: GeneId) -> Vec<GeneId> {
    let mut adjacency: BTreeMap<GeneId, Vec<GeneId>> = BTreeMap::new();
    for link in tree {
        adjacency.entry(link.a).or_default().push(link.b);
        adjacency.entry(link.b).or_default().push(link.a);
    }

    let mut route = Vec::with_capacity(tree.len() + 1);
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        route.push(node);
        if let Some(children) = adjacency.get(&node) {
            // Reversed so the first child is popped first.
            for &child in children.iter().rev() {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }
    }
    route
}

/// Tries a DFS of the spanning tree from every root and keeps the shortest
/// resulting cycle. Falls back to id order when the tree is empty.
pub fn spanning_tree_path(pool: &GenePool, tree: &[Link]) -> Vec<GeneId> {
    if tree.is_empty() {
        return pool.ids();
    }

    let mut best: Option<(f64, Vec<GeneId>)> = None;
    for root in pool.ids() {
        let route = spanning_tree_route(tree, root);
        let len = path_length(&route, pool);
        match &best {
            Some((best_len, _)) if *best_len <= len => {}
            _ => best = Some((len, route)),
        }
    }
    best.map(|(_, route)| route).unwrap_or_default()
}
