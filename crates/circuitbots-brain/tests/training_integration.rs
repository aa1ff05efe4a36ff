use std::sync::Arc;

use circuitbots_brain::{Population, PopulationConfig};
use circuitbots_core::{
    Checkpoint, GenerationController, OccupancyGrid, Rect, SimulationConfig, SpawnPose,
    TimeSchedule, Track,
};

fn arena() -> (SimulationConfig, Arc<Track>) {
    let config = SimulationConfig {
        canvas_width: 320,
        canvas_height: 240,
        tick_rate: 30,
        spawn: SpawnPose {
            x: 80.0,
            y: 120.0,
            heading: 0.0,
        },
        schedule: TimeSchedule {
            stages: Vec::new(),
            final_budget_secs: 1.0,
        },
        ..SimulationConfig::default()
    };
    let grid = OccupancyGrid::from_fn(320, 240, |x, y| x < 4 || y < 4 || x >= 316 || y >= 236)
        .expect("grid");
    let track = Track::new(
        grid,
        Rect::new(250, 4, 10, 232),
        vec![Checkpoint::new(160.0, 120.0, 40.0)],
    )
    .expect("track");
    (config, Arc::new(track))
}

#[test]
fn population_trains_against_the_controller() {
    let (config, track) = arena();
    let mut controller = GenerationController::new(config, track).expect("controller");
    let mut population = Population::new(PopulationConfig {
        population_size: 6,
        generation_cap: 3,
        fitness_threshold: 1.0e6,
        rng_seed: Some(0x5EED),
        ..PopulationConfig::default()
    })
    .expect("population");

    let winner = population.run(&mut controller).expect("training").expect("winner");
    assert_eq!(controller.generation(), 3);
    assert_eq!(population.generation(), 3);
    let champion = population.champion().expect("champion");
    assert!(champion.fitness() >= 0.0);
    assert!(controller.best_fitness() >= champion.fitness());
    assert_eq!(&winner, champion.genome());

    let json = serde_json::to_string(&winner).expect("serialize winner");
    assert!(json.contains("layers"));
}

#[test]
fn cancelled_controller_yields_no_winner() {
    let (config, track) = arena();
    let mut controller = GenerationController::new(config, track).expect("controller");
    controller.cancel_token().cancel();
    let mut population = Population::new(PopulationConfig {
        population_size: 4,
        rng_seed: Some(1),
        ..PopulationConfig::default()
    })
    .expect("population");
    assert!(population.run(&mut controller).expect("training").is_none());
    assert_eq!(population.generation(), 0);
}
