use crate::geometry::{GeneId, GenePool, Link};
use itertools::Itertools;
use std::collections::HashMap;

/// Kruskal's algorithm over the complete graph of the pool.
/// Returns the tree edges in the order they were accepted (shortest first).
pub fn minimum_spanning_tree(pool: &GenePool) -> Vec<Link> {
    let ids = pool.ids();
    if ids.len() < 2 {
        return Vec::new();
    }

    let mut candidates: Vec<Link> = ids
        .iter()
        .tuple_combinations()
        .map(|(&a, &b)| pool.link(a, b))
        .collect();
    candidates.sort_by(|x, y| x.length.total_cmp(&y.length));

    let mut sets = DisjointSets::new(&ids);
    let mut tree = Vec::with_capacity(ids.len() - 1);

    for link in candidates {
        if sets.union(link.a, link.b) {
            tree.push(link);
            if tree.len() == ids.len() - 1 {
                break;
            }
        }
    }
    tree
}

struct DisjointSets {
    parent: HashMap<GeneId, GeneId>,
    rank: HashMap<GeneId, u32>,
}

impl DisjointSets {
    fn new(ids: &[GeneId]) -> Self {
        Self {
            parent: ids.iter().map(|&id| (id, id)).collect(),
            rank: ids.iter().map(|&id| (id, 0)).collect(),
        }
    }

    fn find(&mut self, id: GeneId) -> GeneId {
        let mut root = id;
        while self.parent[&root] != root {
            root = self.parent[&root];
        }
        // Path compression
        let mut cur = id;
        while cur != root {
            let next = self.parent[&cur];
            self.parent.insert(cur, root);
            cur = next;
        }
        root
    }

    /// Returns false when both ids were already connected.
    fn union(&mut self, a: GeneId, b: GeneId) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (rank_a, rank_b) = (self.rank[&ra], self.rank[&rb]);
        if rank_a < rank_b {
            self.parent.insert(ra, rb);
        } else if rank_a > rank_b {
            self.parent.insert(rb, ra);
        } else {
            self.parent.insert(rb, ra);
            self.rank.insert(ra, rank_a + 1);
        }
        true
    }
}
