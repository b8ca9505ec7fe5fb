use crate::geometry::GeneId;
use fastrand::Rng;
use std::collections::HashSet;

/// Order-preserving crossover for permutations ("all different").
///
/// A random cut point splits the parents. Each child keeps one parent's
/// prefix and fills the rest with the missing genes in the order they appear
/// in the other parent, so no gene is lost or duplicated.
pub fn cx_all_diff(p1: &[GeneId], p2: &[GeneId], rng: &mut Rng) -> (Vec<GeneId>, Vec<GeneId>) {
    let len = p1.len().min(p2.len());
    if len < 2 {
        return (p1.to_vec(), p2.to_vec());
    }
    let cut = rng.usize(1..len);
    (splice(p1, p2, cut), splice(p2, p1, cut))
}

fn splice(head: &[GeneId], tail_order: &[GeneId], cut: usize) -> Vec<GeneId> {
    let prefix = &head[..cut];
    let taken: HashSet<GeneId> = prefix.iter().copied().collect();

    let mut child = Vec::with_capacity(head.len());
    child.extend_from_slice(prefix);
    child.extend(tail_order.iter().copied().filter(|g| !taken.contains(g)));
    child
}
