//! Genetic-algorithm TSP model: moving points, a population of tours.

use crate::config::TspParams;
use crate::engine::display::{Rgb, Surface};
use crate::engine::panel::{WidgetPanel, WidgetSpec, WidgetValue};
use crate::engine::Steppable;
use crate::error::SimResult;
use crate::geometry::{GeneId, GenePool, Link, Velocity};
use crate::optimizer::mst::minimum_spanning_tree;
use crate::optimizer::runner::{GenerationOptions, Population};
use crate::optimizer::Individual;
use fastrand::Rng;
use tracing::{debug, info, trace};

pub const NBR_POINTS_KEY: &str = "nbr_points";
pub const POP_SIZE_KEY: &str = "pop_size";
pub const TOURN_SIZE_KEY: &str = "tourn_size";
pub const PROB_RANDOM_PARENT_KEY: &str = "prob_random_parent";
pub const GREEDY_KEY: &str = "Greedy";
pub const MST_KEY: &str = "Min spanning tree";
pub const MOVE_ELEMENT_KEY: &str = "Move element";
pub const TWO_OPT_KEY: &str = "2-Opt";
pub const MOVE_POINTS_KEY: &str = "move points";
pub const ANIMATE_KEY: &str = "Animate construction";
pub const CREATE_NODE: &str = "Create Node";
pub const DELETE_NODE: &str = "Delete Node";
pub const REVERSE: &str = "Reverse";
pub const GENERATIONS_KEY: &str = "generations";
pub const BEST_FITNESS_KEY: &str = "best_fitness";

/// Pool sizes the node buttons can reach; the `nbr_points` slider spans the same range.
pub const MIN_POINTS: usize = 2;
pub const MAX_POINTS: usize = 200;

/// Per-axis speed bound for node velocities.
pub const VELOCITY_LIMIT: f64 = 0.75;
/// Chance per step that a moving node picks a new velocity.
pub const NEW_VELOCITY_PROB: f64 = 0.001;

pub const NODE_COLOR: Rgb = Rgb::WHITE;
pub const TOUR_COLOR: Rgb = Rgb::RED;
pub const TREE_COLOR: Rgb = Rgb::LIGHT_GREY;

/// Minimum spanning tree of `pool`, built on first use.
fn mst_cache<'a>(cache: &'a mut Option<Vec<Link>>, pool: &GenePool) -> &'a [Link] {
    cache.get_or_insert_with(|| minimum_spanning_tree(pool))
}

pub struct TspWorld {
    params: TspParams,
    pool: GenePool,
    population: Population,
    msp_links: Option<Vec<Link>>,
    opts: GenerationOptions,
    animate: bool,
    rng: Rng,
}

impl TspWorld {
    pub fn new(params: TspParams, rng: Rng) -> Self {
        Self {
            opts: GenerationOptions::from(&params),
            animate: params.animate_construction,
            params,
            pool: GenePool::new(),
            population: Population::default(),
            msp_links: None,
            rng,
        }
    }

    pub fn pool(&self) -> &GenePool {
        &self.pool
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn best(&self) -> Option<&Individual> {
        self.population.best()
    }

    pub fn generations(&self) -> usize {
        self.population.generations
    }

    pub fn has_cached_tree(&self) -> bool {
        self.msp_links.is_some()
    }

    pub fn minimum_spanning_tree_links(&mut self) -> &[Link] {
        mst_cache(&mut self.msp_links, &self.pool)
    }

    fn read_options(&self, panel: &dyn WidgetPanel) -> SimResult<GenerationOptions> {
        let pop_size = panel.get_number(POP_SIZE_KEY)?.round().max(2.0) as usize;
        Ok(GenerationOptions {
            pop_size,
            tourn_size: panel.get_number(TOURN_SIZE_KEY)?.round().clamp(1.0, pop_size as f64) as usize,
            prob_random_parent: panel.get_number(PROB_RANDOM_PARENT_KEY)?.round().clamp(0.0, 100.0) as u8,
            generators: GenerationOptions::generators_for(
                panel.get_bool(GREEDY_KEY)?,
                panel.get_bool(MST_KEY)?,
            ),
            mutations: GenerationOptions::mutations_for(
                panel.get_bool(MOVE_ELEMENT_KEY)?,
                panel.get_bool(TWO_OPT_KEY)?,
            ),
        })
    }

    fn gen_population(&mut self) {
        if self.animate {
            info!(
                "Generating the initial population of {} paths",
                self.opts.pop_size
            );
        }
        let tree: &[Link] = if self.opts.needs_spanning_tree() {
            mst_cache(&mut self.msp_links, &self.pool)
        } else {
            &[]
        };
        self.population = Population::new(&self.pool, tree, &self.opts, &mut self.rng);
        if self.animate {
            for (i, ind) in self.population.members.iter().enumerate() {
                info!("{}. {} {}", i, ind.generator, ind);
            }
        }
    }

    /// Adds a random node and splices it into every tour. Refused once the
    /// pool holds `MAX_POINTS` nodes.
    pub fn create_node(&mut self) -> Option<GeneId> {
        if self.pool.len() >= MAX_POINTS {
            debug!("Refusing to create: already {} nodes", self.pool.len());
            return None;
        }
        let (w, h) = (self.params.world_width, self.params.world_height);
        let id = self.pool.add_random(&mut self.rng, w, h, VELOCITY_LIMIT);
        self.population.add_gene(id, &self.pool, &mut self.rng);
        self.msp_links = None;
        debug!("Created node {} ({} nodes)", id, self.pool.len());
        Some(id)
    }

    /// Removes a random node from the pool and every tour. Refused while
    /// two or fewer nodes remain.
    pub fn delete_node(&mut self) -> Option<GeneId> {
        if self.pool.len() <= MIN_POINTS {
            debug!("Refusing to delete: only {} nodes left", self.pool.len());
            return None;
        }
        let ids = self.pool.ids();
        let id = ids[self.rng.usize(0..ids.len())];
        self.pool.remove(id);
        self.population.remove_gene(id, &self.pool);
        self.msp_links = None;
        debug!("Deleted node {} ({} nodes)", id, self.pool.len());
        Some(id)
    }

    pub fn reverse(&mut self) {
        for node in self.pool.nodes_mut() {
            node.velocity = -node.velocity;
        }
    }

    fn move_points(&mut self) {
        let (w, h) = (self.params.world_width, self.params.world_height);
        for node in self.pool.nodes_mut() {
            node.move_by_velocity(w, h);
            if self.rng.f64() < NEW_VELOCITY_PROB {
                node.velocity = Velocity::random(&mut self.rng, VELOCITY_LIMIT);
            }
        }
        self.population.recompute_fitness(&self.pool);
    }

    fn set_results(&self, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        panel.set(NBR_POINTS_KEY, WidgetValue::Number(self.pool.len() as f64))?;
        panel.set(
            GENERATIONS_KEY,
            WidgetValue::Text(self.population.generations.to_string()),
        )?;
        let best = self
            .best()
            .map_or_else(|| "-".to_string(), |b| format!("{:.1}", b.fitness));
        panel.set(BEST_FITNESS_KEY, WidgetValue::Text(best))
    }
}

impl Steppable for TspWorld {
    fn widgets(&self) -> Vec<WidgetSpec> {
        let p = &self.params;
        vec![
            WidgetSpec::slider(
                NBR_POINTS_KEY,
                MIN_POINTS as f64,
                MAX_POINTS as f64,
                p.nbr_points as f64,
            ),
            WidgetSpec::slider(POP_SIZE_KEY, 2.0, 200.0, p.pop_size as f64),
            WidgetSpec::slider(TOURN_SIZE_KEY, 1.0, 20.0, p.tourn_size as f64),
            WidgetSpec::slider(PROB_RANDOM_PARENT_KEY, 0.0, 100.0, p.prob_random_parent as f64),
            WidgetSpec::checkbox(GREEDY_KEY, p.greedy),
            WidgetSpec::checkbox(MST_KEY, p.min_spanning_tree),
            WidgetSpec::checkbox(MOVE_ELEMENT_KEY, p.move_element),
            WidgetSpec::checkbox(TWO_OPT_KEY, p.two_opt),
            WidgetSpec::checkbox(MOVE_POINTS_KEY, p.move_points),
            WidgetSpec::checkbox(ANIMATE_KEY, p.animate_construction),
            WidgetSpec::button(CREATE_NODE),
            WidgetSpec::button(DELETE_NODE),
            WidgetSpec::button(REVERSE),
            WidgetSpec::text(GENERATIONS_KEY, "0"),
            WidgetSpec::text(BEST_FITNESS_KEY, "-"),
        ]
    }

    fn setup(&mut self, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        let nbr_points = panel.get_number(NBR_POINTS_KEY)?.round().max(3.0) as usize;
        self.opts = self.read_options(panel)?;
        self.animate = panel.get_bool(ANIMATE_KEY)?;
        self.pool = GenePool::random(
            &mut self.rng,
            nbr_points,
            self.params.world_width,
            self.params.world_height,
            VELOCITY_LIMIT,
        );
        self.msp_links = None;
        self.gen_population();
        // Without a generation limit the counter is not interesting.
        panel.set_visible(GENERATIONS_KEY, self.params.max_generations > 0)?;
        info!(
            "TSP setup: {} points, population {}, best {:.1}",
            self.pool.len(),
            self.population.members.len(),
            self.best().map_or(0.0, |b| b.fitness)
        );
        self.set_results(panel)
    }

    fn step(&mut self, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        if self.population.members.is_empty() {
            self.setup(panel)?;
        }
        self.opts = self.read_options(panel)?;
        if panel.get_bool(MOVE_POINTS_KEY)? {
            self.move_points();
        }
        self.population.generation(&self.pool, &self.opts, &mut self.rng);
        self.set_results(panel)
    }

    fn handle_event(&mut self, event: &str, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        match event {
            CREATE_NODE => {
                self.create_node();
            }
            DELETE_NODE => {
                self.delete_node();
            }
            REVERSE => {
                self.reverse();
                return Ok(());
            }
            ANIMATE_KEY => {
                self.animate = panel.get_bool(ANIMATE_KEY)?;
                return Ok(());
            }
            _ => {
                trace!("TSP ignores '{}'", event);
                return Ok(());
            }
        }
        self.set_results(panel)
    }

    fn draw(&self, surface: &mut dyn Surface) {
        if self.animate && self.generations() == 0 {
            if let Some(tree) = &self.msp_links {
                for link in tree {
                    draw_link(surface, &self.pool, link, TREE_COLOR);
                }
            }
        }
        if let Some(best) = self.best() {
            for link in best.chromosome.links(&self.pool) {
                draw_link(surface, &self.pool, &link, TOUR_COLOR);
            }
        }
        for node in self.pool.nodes() {
            surface.draw_node(node.pos.x, node.pos.y, NODE_COLOR);
        }
    }

    fn done(&self) -> bool {
        self.params.max_generations > 0 && self.generations() >= self.params.max_generations
    }

    fn final_thoughts(&mut self, _panel: &mut dyn WidgetPanel) -> SimResult<()> {
        if let Some(best) = self.best() {
            info!(
                "After {} generations the best tour is {}",
                self.generations(),
                best
            );
        }
        Ok(())
    }
}

fn draw_link(surface: &mut dyn Surface, pool: &GenePool, link: &Link, color: Rgb) {
    if let (Some(a), Some(b)) = (pool.get(link.a), pool.get(link.b)) {
        surface.draw_link((a.pos.x, a.pos.y), (b.pos.x, b.pos.y), color);
    }
}
