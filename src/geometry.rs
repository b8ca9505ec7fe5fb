use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Neg;

pub type GeneId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: f64,
    pub dy: f64,
}

impl Velocity {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Uniform in [-limit, limit] on both axes.
    pub fn random(rng: &mut Rng, limit: f64) -> Self {
        Self {
            dx: (rng.f64() * 2.0 - 1.0) * limit,
            dy: (rng.f64() * 2.0 - 1.0) * limit,
        }
    }
}

impl Neg for Velocity {
    type Output = Velocity;

    fn neg(self) -> Velocity {
        Velocity::new(-self.dx, -self.dy)
    }
}

/// A TSP waypoint. Its id doubles as the gene stored in chromosomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: GeneId,
    pub pos: Point,
    pub velocity: Velocity,
}

impl Node {
    /// Moves by one velocity step inside `[0, width] x [0, height]`,
    /// reflecting the velocity component that would leave the box.
    pub fn move_by_velocity(&mut self, width: f64, height: f64) {
        let mut x = self.pos.x + self.velocity.dx;
        if x < 0.0 || x > width {
            self.velocity.dx = -self.velocity.dx;
            x = (self.pos.x + self.velocity.dx).clamp(0.0, width);
        }
        let mut y = self.pos.y + self.velocity.dy;
        if y < 0.0 || y > height {
            self.velocity.dy = -self.velocity.dy;
            y = (self.pos.y + self.velocity.dy).clamp(0.0, height);
        }
        self.pos = Point::new(x, y);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub a: GeneId,
    pub b: GeneId,
    pub length: f64,
}

impl Link {
    pub fn includes(&self, gene: GeneId) -> bool {
        self.a == gene || self.b == gene
    }

    pub fn other_side(&self, gene: GeneId) -> Option<GeneId> {
        if self.a == gene {
            Some(self.b)
        } else if self.b == gene {
            Some(self.a)
        } else {
            None
        }
    }
}

/// The set of points a tour has to visit, keyed by stable id.
/// Ids are never reused, so a deleted node cannot alias a new one.
#[derive(Debug, Clone, Default)]
pub struct GenePool {
    nodes: BTreeMap<GeneId, Node>,
    next_id: GeneId,
}

impl GenePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: &[Point]) -> Self {
        let mut pool = Self::new();
        for &p in points {
            pool.add(p, Velocity::default());
        }
        pool
    }

    pub fn random(rng: &mut Rng, count: usize, width: f64, height: f64, speed: f64) -> Self {
        let mut pool = Self::new();
        for _ in 0..count {
            pool.add_random(rng, width, height, speed);
        }
        pool
    }

    pub fn add(&mut self, pos: Point, velocity: Velocity) -> GeneId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, Node { id, pos, velocity });
        id
    }

    pub fn add_random(&mut self, rng: &mut Rng, width: f64, height: f64, speed: f64) -> GeneId {
        let pos = Point::new(rng.f64() * width, rng.f64() * height);
        let velocity = Velocity::random(rng, speed);
        self.add(pos, velocity)
    }

    pub fn remove(&mut self, id: GeneId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: GeneId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Gene ids in ascending order.
    pub fn ids(&self) -> Vec<GeneId> {
        self.nodes.keys().copied().collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Euclidean distance between two genes. Both must be in the pool.
    #[inline(always)]
    pub fn distance(&self, a: GeneId, b: GeneId) -> f64 {
        self.nodes[&a].pos.distance_to(&self.nodes[&b].pos)
    }

    pub fn link(&self, a: GeneId, b: GeneId) -> Link {
        Link {
            a,
            b,
            length: self.distance(a, b),
        }
    }

    /// Cyclic links for a gene sequence, including last -> first.
    pub fn seq_to_links(&self, genes: &[GeneId]) -> Vec<Link> {
        if genes.len() < 2 {
            return Vec::new();
        }
        (0..genes.len())
            .map(|i| self.link(genes[i], genes[(i + 1) % genes.len()]))
            .collect()
    }
}
