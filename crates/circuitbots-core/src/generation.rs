//! Generation controller: spawns a policy-bound cohort, drives the fixed-step loop for a
//! staged time budget, and hands fitness back to the optimizer.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, Pacing, SimulationConfig};
use crate::fitness::evaluate_fitness;
use crate::observer::{Frame, FrameObserver, LEADERBOARD_SIZE, NullObserver, Telemetry};
use crate::policy::{Contender, Observation, Policy};
use crate::track::{Track, TrackError};
use crate::vehicle::Vehicle;

/// Errors that end a training run.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error("cannot evaluate an empty cohort")]
    EmptyCohort,
}

/// Cooperative cancellation flag shared with whoever may request a quit.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Lifecycle of the controller within one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerPhase {
    #[default]
    Idle,
    Spawning,
    Running,
    Scoring,
    Done,
}

/// Summary of a fully evaluated generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// 1-based generation index.
    pub generation: u32,
    pub ticks: u64,
    pub limit_secs: f32,
    /// Final fitness per cohort member, in cohort order.
    pub fitness: Vec<f32>,
    /// Laps completed by each cohort member.
    pub laps: Vec<u32>,
    /// Best fitness observed in any tick of any generation so far.
    pub best_fitness_ever: f32,
}

impl GenerationReport {
    /// Highest final fitness in this generation.
    #[must_use]
    pub fn best_fitness(&self) -> f32 {
        self.fitness.iter().copied().fold(0.0, f32::max)
    }
}

/// Result of asking the controller to evaluate a cohort.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Completed(GenerationReport),
    /// Cancellation was requested; no fitness was written to the cohort.
    Aborted,
}

/// Callback the optimizer invokes once per generation.
pub trait CohortEvaluator<C> {
    fn evaluate(&mut self, cohort: &mut [C]) -> Result<GenerationOutcome, TrainingError>;
}

/// Sleeps between ticks to hold the target tick rate.
struct Pacer {
    tick: Duration,
    deadline: Option<Instant>,
}

impl Pacer {
    fn new(config: &SimulationConfig) -> Self {
        let tick = match config.pacing {
            Pacing::Realtime => Duration::from_secs_f64(1.0 / f64::from(config.tick_rate)),
            Pacing::Unpaced => Duration::ZERO,
        };
        Self {
            tick,
            deadline: None,
        }
    }

    fn wait(&mut self) {
        if self.tick.is_zero() {
            return;
        }
        let now = Instant::now();
        let deadline = self.deadline.unwrap_or(now) + self.tick;
        if deadline > now {
            thread::sleep(deadline - now);
            self.deadline = Some(deadline);
        } else {
            // Fell behind; restart the cadence instead of bursting.
            self.deadline = Some(now);
        }
    }
}

/// Drives cohorts of policy-bound vehicles around a shared track.
pub struct GenerationController {
    config: SimulationConfig,
    track: Arc<Track>,
    cancel: CancelToken,
    observer: Box<dyn FrameObserver>,
    phase: ControllerPhase,
    generation: u32,
    best_fitness: f32,
}

impl fmt::Debug for GenerationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationController")
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("best_fitness", &self.best_fitness)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl GenerationController {
    /// Validate the configuration against the track and build an idle controller.
    pub fn new(config: SimulationConfig, track: Arc<Track>) -> Result<Self, TrainingError> {
        config.validate()?;
        let expected = (config.canvas_width, config.canvas_height);
        if track.canvas() != expected {
            return Err(TrackError::CanvasMismatch {
                expected,
                actual: track.canvas(),
            }
            .into());
        }
        Ok(Self {
            config,
            track,
            cancel: CancelToken::new(),
            observer: Box::new(NullObserver),
            phase: ControllerPhase::Idle,
            generation: 0,
            best_fitness: 0.0,
        })
    }

    /// Attach a frame observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn FrameObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Share an externally owned cancellation flag.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[must_use]
    pub const fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Number of generations started so far.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Best fitness observed in any tick across the whole run.
    #[must_use]
    pub const fn best_fitness(&self) -> f32 {
        self.best_fitness
    }

    /// Evaluate one generation: spawn a vehicle per contender at the shared spawn pose, run
    /// until the staged time budget expires, then write each contender's fitness.
    pub fn run_generation<C: Contender>(
        &mut self,
        cohort: &mut [C],
    ) -> Result<GenerationOutcome, TrainingError> {
        if cohort.is_empty() {
            return Err(TrainingError::EmptyCohort);
        }
        if self.cancel.is_cancelled() {
            return Ok(GenerationOutcome::Aborted);
        }

        self.generation += 1;
        let generation = self.generation;
        let config = &self.config;
        let track = Arc::clone(&self.track);
        let tick_secs = config.tick_secs();
        let limit_secs = config.schedule.budget_for(generation);
        let budget_ticks = (limit_secs / tick_secs).round() as u64;

        self.phase = ControllerPhase::Spawning;
        let mut policies: Vec<Box<dyn Policy>> = cohort.iter().map(Contender::policy).collect();
        if let Some(policy) = policies.first() {
            debug!(generation, policy = policy.kind(), "cohort policies bound");
        }
        let mut vehicles: Vec<Vehicle> = (1..=cohort.len())
            .map(|id| Vehicle::new(id as u32, config, &track))
            .collect();
        let mut fitness = vec![0.0_f32; vehicles.len()];
        let mut telemetry = Telemetry {
            generation,
            limit_secs,
            population: vehicles.len(),
            ..Telemetry::default()
        };
        let mut pacer = Pacer::new(config);

        info!(
            generation,
            population = vehicles.len(),
            limit_secs,
            "generation started"
        );
        self.phase = ControllerPhase::Running;

        let mut tick: u64 = 0;
        while tick < budget_ticks {
            if self.cancel.is_cancelled() {
                warn!(generation, tick, "cancellation requested; aborting training run");
                self.phase = ControllerPhase::Done;
                self.observer.on_generation_end(&telemetry);
                return Ok(GenerationOutcome::Aborted);
            }
            let elapsed_secs = tick as f32 * tick_secs;

            let mut active = 0;
            for (vehicle, policy) in vehicles.iter_mut().zip(policies.iter_mut()) {
                if vehicle.laps() >= config.lap_target {
                    continue;
                }
                let controls = policy.decide(&Observation::of(vehicle, config));
                vehicle.step(controls, &track, config, elapsed_secs);
                if !vehicle.crashed() {
                    active += 1;
                }
            }

            // Score only after every vehicle has moved.
            for (score, vehicle) in fitness.iter_mut().zip(&vehicles) {
                *score =
                    evaluate_fitness(vehicle, elapsed_secs, track.checkpoints(), &config.fitness);
                if *score > self.best_fitness {
                    self.best_fitness = *score;
                }
            }

            telemetry.tick = tick;
            telemetry.elapsed_secs = elapsed_secs;
            telemetry.active = active;
            telemetry.best_fitness = self.best_fitness;
            telemetry.leaders = leaders(&vehicles, &fitness);
            self.observer.on_tick(&Frame {
                vehicles: &vehicles,
                fitness: &fitness,
                checkpoints: track.checkpoints(),
                finish: track.finish(),
                telemetry: &telemetry,
            });

            tick += 1;
            pacer.wait();
        }

        self.phase = ControllerPhase::Scoring;
        for (contender, score) in cohort.iter_mut().zip(&fitness) {
            contender.set_fitness(*score);
        }
        let laps: Vec<u32> = vehicles.iter().map(Vehicle::laps).collect();
        let report = GenerationReport {
            generation,
            ticks: tick,
            limit_secs,
            fitness,
            laps,
            best_fitness_ever: self.best_fitness,
        };
        debug!(generation, fitness = ?report.fitness, "cohort scored");
        info!(
            generation,
            ticks = report.ticks,
            best = report.best_fitness(),
            best_ever = report.best_fitness_ever,
            finishers = report.laps.iter().filter(|&&laps| laps >= self.config.lap_target).count(),
            "generation finished"
        );
        self.observer.on_generation_end(&telemetry);
        self.phase = ControllerPhase::Done;
        Ok(GenerationOutcome::Completed(report))
    }
}

impl<C: Contender> CohortEvaluator<C> for GenerationController {
    fn evaluate(&mut self, cohort: &mut [C]) -> Result<GenerationOutcome, TrainingError> {
        self.run_generation(cohort)
    }
}

fn leaders(vehicles: &[Vehicle], fitness: &[f32]) -> Vec<(u32, f32)> {
    let mut ranked: Vec<(u32, f32)> = vehicles
        .iter()
        .zip(fitness)
        .map(|(vehicle, score)| (vehicle.id(), *score))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(LEADERBOARD_SIZE);
    ranked
}
