//! Frame observer that reports training progress through `tracing`.

use circuitbots_core::{Frame, FrameObserver, Telemetry};
use tracing::info;

/// Logs the telemetry block every `interval` ticks. An interval of zero only logs the end
/// of each generation.
#[derive(Debug, Clone)]
pub struct LogObserver {
    interval: u64,
    lines: u64,
}

impl LogObserver {
    #[must_use]
    pub const fn new(interval: u64) -> Self {
        Self { interval, lines: 0 }
    }

    /// Number of tick lines emitted so far.
    #[must_use]
    pub const fn lines(&self) -> u64 {
        self.lines
    }
}

impl FrameObserver for LogObserver {
    fn on_tick(&mut self, frame: &Frame<'_>) {
        let telemetry = frame.telemetry;
        if self.interval == 0 || telemetry.tick % self.interval != 0 {
            return;
        }
        self.lines += 1;
        info!(
            generation = telemetry.generation,
            elapsed_secs = telemetry.elapsed_secs,
            limit_secs = telemetry.limit_secs,
            active = telemetry.active,
            population = telemetry.population,
            best = telemetry.best_fitness,
            leaders = ?telemetry.leaders,
            "tick"
        );
    }

    fn on_generation_end(&mut self, telemetry: &Telemetry) {
        info!(
            generation = telemetry.generation,
            last_tick = telemetry.tick,
            best = telemetry.best_fitness,
            "generation telemetry closed"
        );
    }
}
