use fastrand::Rng;
use logosim::config::{EngineParams, TspParams};
use logosim::engine::display::{DrawCall, FrameRecorder};
use logosim::engine::panel::{ScriptedPanel, WidgetPanel};
use logosim::engine::{SimEngine, Steppable};
use logosim::geometry::{GenePool, Point};
use logosim::optimizer::chromosome::{path_length, Chromosome, FitnessEvaluable};
use logosim::optimizer::initialization::{random_path, spanning_tree_path};
use logosim::optimizer::mst::minimum_spanning_tree;
use logosim::optimizer::mutation::{trial_insertion, trial_removal};
use logosim::optimizer::runner::{GenerationOptions, Population};
use logosim::optimizer::{Individual, PathGenerator};
use logosim::tsp::{TspWorld, BEST_FITNESS_KEY, GENERATIONS_KEY, NBR_POINTS_KEY};

fn headless() -> EngineParams {
    EngineParams {
        unthrottled: true,
        ..Default::default()
    }
}

fn still_params(generations: usize) -> TspParams {
    TspParams {
        move_points: false,
        max_generations: generations,
        ..Default::default()
    }
}

fn run_script(params: TspParams, script: &str, seed: u64) -> (TspWorld, SimEngine<ScriptedPanel, FrameRecorder>) {
    let panel = ScriptedPanel::from_script(script).unwrap();
    let mut engine = SimEngine::new(panel, FrameRecorder::new(), &headless());
    let mut world = TspWorld::new(params, Rng::with_seed(seed));
    engine.start(&mut world).unwrap();
    (world, engine)
}

fn assert_tours_cover_pool(world: &TspWorld) {
    let mut ids = world.pool().ids();
    ids.sort_unstable();
    for member in &world.population().members {
        let mut genes = member.chromosome.genes().to_vec();
        genes.sort_unstable();
        assert_eq!(genes, ids, "tour {} does not visit every node once", member);
    }
}

#[test]
fn test_square_tour_length() {
    let pool = GenePool::from_points(&[
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ]);
    let tour = Chromosome::new(vec![0, 1, 2, 3]);
    assert!((tour.fitness(&pool) - 4.0).abs() < 1e-9);

    let crossed = Chromosome::new(vec![0, 2, 1, 3]);
    assert!(crossed.fitness(&pool) > tour.fitness(&pool));
}

#[test]
fn test_fitness_is_idempotent() {
    let mut rng = Rng::with_seed(11);
    let pool = GenePool::random(&mut rng, 25, 100.0, 100.0, 0.0);
    let mut ind = Individual::generate(PathGenerator::RandomPath, &pool, &[], &mut rng);
    let first = ind.fitness;
    ind.compute_fitness(&pool);
    assert_eq!(ind.fitness, first);
    assert_eq!(first, path_length(ind.chromosome.genes(), &pool));
}

#[test]
fn test_insert_then_remove_restores_fitness() {
    let mut rng = Rng::with_seed(13);
    let pool = GenePool::random(&mut rng, 10, 100.0, 100.0, 0.0);
    let mut base = pool.ids();
    let extra = base.pop().unwrap();
    let fitness = path_length(&base, &pool);

    let (with_extra, grown) = trial_insertion(&base, fitness, 4, extra, &pool);
    assert_eq!(with_extra[5], extra);
    assert!((grown - path_length(&with_extra, &pool)).abs() < 1e-9);

    let (back, restored) = trial_removal(&with_extra, grown, 5, &pool);
    assert_eq!(back, base);
    assert!((restored - fitness).abs() < 1e-9);
}

#[test]
fn test_spanning_tree_path_beats_random_on_average() {
    let mut rng = Rng::with_seed(5);
    let pool = GenePool::random(&mut rng, 40, 100.0, 100.0, 0.0);
    let tree = minimum_spanning_tree(&pool);
    assert_eq!(tree.len(), pool.len() - 1);

    let tree_len = path_length(&spanning_tree_path(&pool, &tree), &pool);
    let random_avg = (0..20)
        .map(|_| path_length(&random_path(&pool, &mut rng), &pool))
        .sum::<f64>()
        / 20.0;
    assert!(tree_len < random_avg, "{} vs {}", tree_len, random_avg);
}

#[test]
fn test_best_never_worsens_without_motion() {
    let mut rng = Rng::with_seed(21);
    let pool = GenePool::random(&mut rng, 20, 100.0, 100.0, 0.0);
    let tree = minimum_spanning_tree(&pool);
    let opts = GenerationOptions::from(&TspParams::default());
    let mut population = Population::new(&pool, &tree, &opts, &mut rng);

    let mut best = population.best().unwrap().fitness;
    for _ in 0..50 {
        population.generation(&pool, &opts, &mut rng);
        let now = population.best().unwrap().fitness;
        assert!(now <= best);
        best = now;
    }
    assert_eq!(population.generations, 50);
}

#[test]
fn test_run_stops_at_generation_limit() {
    let (world, engine) = run_script(still_params(12), "setup, go", 1);
    assert_eq!(world.generations(), 12);
    assert_eq!(engine.ticks(), 12);
    assert_eq!(engine.panel().get_text(GENERATIONS_KEY).unwrap(), "12");
    assert_ne!(engine.panel().get_text(BEST_FITNESS_KEY).unwrap(), "-");
    assert_tours_cover_pool(&world);
}

#[test]
fn test_node_buttons_keep_tours_valid() {
    let (world, engine) = run_script(
        still_params(3),
        "setup, Create Node, Create Node, Delete Node, go",
        2,
    );
    assert_eq!(world.pool().len(), 16);
    assert_eq!(engine.panel().get_number(NBR_POINTS_KEY).unwrap(), 16.0);
    assert_tours_cover_pool(&world);
}

#[test]
fn test_moving_points_keep_fitness_current() {
    let params = TspParams {
        move_points: true,
        max_generations: 20,
        ..Default::default()
    };
    let (world, _) = run_script(params, "setup, Reverse, go", 4);
    for member in &world.population().members {
        let expected = member.chromosome.fitness(world.pool());
        assert!((member.fitness - expected).abs() < 1e-9);
    }
    for node in world.pool().nodes() {
        assert!(node.pos.x >= 0.0 && node.pos.x <= 80.0);
        assert!(node.pos.y >= 0.0 && node.pos.y <= 40.0);
    }
}

#[test]
fn test_deletion_stops_at_two_nodes() {
    let mut world = TspWorld::new(
        TspParams {
            nbr_points: 3,
            ..still_params(1)
        },
        Rng::with_seed(9),
    );
    let mut panel = ScriptedPanel::default();
    for spec in world.widgets() {
        panel.declare(spec);
    }
    world.setup(&mut panel).unwrap();

    assert!(world.delete_node().is_some());
    assert_eq!(world.pool().len(), 2);
    assert!(world.delete_node().is_none());
    assert_eq!(world.pool().len(), 2);
}

#[test]
fn test_generation_counter_hidden_without_limit() {
    let (_, engine) = run_script(still_params(0), "setup", 6);
    assert_eq!(engine.panel().is_visible(GENERATIONS_KEY), Some(false));
}

#[test]
fn test_frame_draws_tour_and_nodes() {
    let (world, engine) = run_script(still_params(1), "setup, go", 8);
    let frame = engine.surface().last_frame().unwrap();
    let nodes = frame.iter().filter(|c| matches!(c, DrawCall::Node(..))).count();
    let links = frame.iter().filter(|c| matches!(c, DrawCall::Link(..))).count();
    assert_eq!(nodes, world.pool().len());
    assert_eq!(links, world.pool().len());
}
