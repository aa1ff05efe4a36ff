use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use circuitbots_core::{
    CancelToken, Checkpoint, Contender, Controls, Frame, FrameObserver, GenerationController,
    GenerationOutcome, OccupancyGrid, Observation, Policy, Rect, ScheduleStage, SimulationConfig,
    SpawnPose, Steer, Telemetry, TimeSchedule, Track,
};

const FULL_THROTTLE: Controls = Controls {
    accelerate: true,
    brake: false,
    steer: Steer::Straight,
};

struct Scripted(fn(&Observation) -> Controls);

impl Policy for Scripted {
    fn kind(&self) -> &'static str {
        "test.scripted"
    }

    fn decide(&mut self, observation: &Observation) -> Controls {
        (self.0)(observation)
    }
}

struct Driver {
    script: fn(&Observation) -> Controls,
    fitness: Option<f32>,
}

impl Driver {
    fn new(script: fn(&Observation) -> Controls) -> Self {
        Self {
            script,
            fitness: None,
        }
    }
}

impl Contender for Driver {
    fn policy(&self) -> Box<dyn Policy> {
        Box::new(Scripted(self.script))
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }
}

/// Open 800x400 canvas with a 10px wall border, a finish strip at x = 400 and two
/// checkpoints on the way there.
fn straightaway() -> (SimulationConfig, Arc<Track>) {
    let config = SimulationConfig {
        canvas_width: 800,
        canvas_height: 400,
        spawn: SpawnPose {
            x: 100.0,
            y: 200.0,
            heading: 0.0,
        },
        lap_target: 1,
        schedule: TimeSchedule {
            stages: Vec::new(),
            final_budget_secs: 3.0,
        },
        ..SimulationConfig::default()
    };
    let grid = OccupancyGrid::from_fn(800, 400, |x, y| x < 10 || y < 10 || x >= 790 || y >= 390)
        .expect("grid");
    let checkpoints = vec![
        Checkpoint::new(200.0, 200.0, 50.0),
        Checkpoint::new(260.0, 200.0, 50.0),
    ];
    let track = Track::new(grid, Rect::new(400, 10, 20, 380), checkpoints).expect("track");
    (config, Arc::new(track))
}

#[derive(Default)]
struct Recording {
    ticks: u64,
    first_position: Vec<(f32, f32)>,
    max_reading: f32,
    min_reading: f32,
    generation_ends: Vec<Telemetry>,
}

struct Recorder(Rc<RefCell<Recording>>);

impl FrameObserver for Recorder {
    fn on_tick(&mut self, frame: &Frame<'_>) {
        let mut rec = self.0.borrow_mut();
        if rec.ticks == 0 {
            rec.min_reading = f32::INFINITY;
        }
        rec.ticks += 1;
        let lead = &frame.vehicles[0];
        rec.first_position.push((lead.position().x, lead.position().y));
        for vehicle in frame.vehicles {
            for &reading in vehicle.sensors().readings() {
                rec.max_reading = rec.max_reading.max(reading);
                rec.min_reading = rec.min_reading.min(reading);
            }
        }
        assert_eq!(frame.fitness.len(), frame.vehicles.len());
        assert!(frame.telemetry.leaders.len() <= 3);
    }

    fn on_generation_end(&mut self, telemetry: &Telemetry) {
        self.0.borrow_mut().generation_ends.push(telemetry.clone());
    }
}

#[test]
fn lap_finisher_freezes_and_outscores_crasher() {
    let (config, track) = straightaway();
    let recording = Rc::new(RefCell::new(Recording::default()));
    let mut controller = GenerationController::new(config, track)
        .expect("controller")
        .with_observer(Box::new(Recorder(Rc::clone(&recording))));

    let mut cohort = vec![
        Driver::new(|_| FULL_THROTTLE),
        // Reverses into the left wall.
        Driver::new(|_| Controls::new(false, true, Steer::Straight)),
        Driver::new(|_| Controls::COAST),
    ];
    let outcome = controller.run_generation(&mut cohort).expect("generation");
    let GenerationOutcome::Completed(report) = outcome else {
        panic!("expected completion");
    };

    assert_eq!(report.ticks, 180);
    assert_eq!(report.laps, vec![1, 0, 0]);
    let scores: Vec<f32> = cohort.iter().map(|d| d.fitness.expect("scored")).collect();
    assert!(scores[0] > scores[1], "{scores:?}");
    assert!(scores[0] > scores[2], "{scores:?}");
    assert!(scores[0] >= 1_000.0 + 2.0 * 50.0);

    let rec = recording.borrow();
    assert_eq!(rec.ticks, 180);
    // Once the lap target is met the vehicle is no longer advanced.
    let tail = &rec.first_position[rec.first_position.len() - 30..];
    assert!(tail.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(tail[0].0 < 790.0);
    assert_eq!(rec.generation_ends.len(), 1);
}

#[test]
fn sensor_readings_stay_within_range() {
    let (config, track) = straightaway();
    let range = config.sensors.range as f32;
    let recording = Rc::new(RefCell::new(Recording::default()));
    let mut controller = GenerationController::new(config, track)
        .expect("controller")
        .with_observer(Box::new(Recorder(Rc::clone(&recording))));
    let mut cohort = vec![
        Driver::new(|obs| {
            if obs.sensors[4] < 0.1 {
                Controls::new(false, true, Steer::Right)
            } else {
                Controls::new(true, false, Steer::Left)
            }
        }),
        Driver::new(|_| Controls::new(false, true, Steer::Right)),
    ];
    controller.run_generation(&mut cohort).expect("generation");

    let rec = recording.borrow();
    assert!(rec.min_reading >= 0.0);
    assert!(rec.max_reading <= range);
}

#[test]
fn cancellation_mid_generation_aborts_the_run() {
    struct CancelAt {
        tick: u64,
        token: CancelToken,
    }

    impl FrameObserver for CancelAt {
        fn on_tick(&mut self, frame: &Frame<'_>) {
            if frame.telemetry.tick == self.tick {
                self.token.cancel();
            }
        }
    }

    let (config, track) = straightaway();
    let token = CancelToken::new();
    let mut controller = GenerationController::new(config, track)
        .expect("controller")
        .with_cancel_token(token.clone())
        .with_observer(Box::new(CancelAt {
            tick: 10,
            token: token.clone(),
        }));

    let mut cohort = vec![Driver::new(|_| FULL_THROTTLE)];
    assert_eq!(
        controller.run_generation(&mut cohort).expect("outcome"),
        GenerationOutcome::Aborted
    );
    assert!(cohort[0].fitness.is_none());
    assert!(token.is_cancelled());
    // Later generations abort immediately.
    assert_eq!(
        controller.run_generation(&mut cohort).expect("outcome"),
        GenerationOutcome::Aborted
    );
    assert_eq!(controller.generation(), 1);
}

#[test]
fn staged_schedule_lengthens_generations() {
    let (mut config, track) = straightaway();
    config.tick_rate = 20;
    config.schedule = TimeSchedule {
        stages: vec![
            ScheduleStage {
                until_generation: 2,
                budget_secs: 0.5,
            },
            ScheduleStage {
                until_generation: 3,
                budget_secs: 1.0,
            },
        ],
        final_budget_secs: 2.0,
    };
    let mut controller = GenerationController::new(config, track).expect("controller");
    let mut cohort = vec![Driver::new(|_| Controls::COAST)];

    let mut ticks = Vec::new();
    for _ in 0..4 {
        match controller.run_generation(&mut cohort).expect("generation") {
            GenerationOutcome::Completed(report) => ticks.push(report.ticks),
            GenerationOutcome::Aborted => panic!("unexpected abort"),
        }
    }
    assert_eq!(ticks, vec![10, 10, 20, 40]);
}
