use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use circuitbots_app::{
    LogObserver, WALL_COLOR, load_checkpoints, load_json, load_track_grid, parse_rect, save_genome,
};
use circuitbots_brain::{Population, PopulationConfig};
use circuitbots_core::{
    CancelToken, GenerationController, Pacing, Rect, SimulationConfig, Track, default_checkpoints,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "circuitbots",
    version,
    about = "Evolve driving policies around a raster race track"
)]
struct Cli {
    /// Track image; pure black pixels are walls.
    #[arg(long, env = "CIRCUITBOTS_TRACK")]
    track: PathBuf,

    /// JSON simulation config. Missing fields keep their defaults.
    #[arg(long, env = "CIRCUITBOTS_CONFIG")]
    config: Option<PathBuf>,

    /// JSON optimizer config. Missing fields keep their defaults.
    #[arg(long, env = "CIRCUITBOTS_POPULATION_CONFIG")]
    population_config: Option<PathBuf>,

    /// JSON checkpoint list; the built-in circuit is used when omitted.
    #[arg(long, env = "CIRCUITBOTS_CHECKPOINTS")]
    checkpoints: Option<PathBuf>,

    /// Finish region as `left,top,width,height`.
    #[arg(long, value_parser = parse_rect, default_value = "270,200,160,40")]
    finish: Rect,

    /// Override the generation cap.
    #[arg(long)]
    generations: Option<u32>,

    /// Override the population size.
    #[arg(long)]
    population: Option<usize>,

    /// Seed the optimizer RNG for a reproducible run.
    #[arg(long, env = "CIRCUITBOTS_SEED")]
    seed: Option<u64>,

    /// Pace ticks to wall-clock time instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Where to write the winning policy.
    #[arg(long, default_value = "best_policy.json")]
    output: PathBuf,

    /// Ticks between telemetry log lines (0 logs only generation ends).
    #[arg(long, default_value_t = 60)]
    log_interval: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config: SimulationConfig = match &cli.config {
        Some(path) => load_json(path)?,
        None => SimulationConfig::default(),
    };
    if cli.realtime {
        config.pacing = Pacing::Realtime;
    }

    let mut population_config: PopulationConfig = match &cli.population_config {
        Some(path) => load_json(path)?,
        None => PopulationConfig::default(),
    };
    if let Some(generations) = cli.generations {
        population_config.generation_cap = generations;
    }
    if let Some(size) = cli.population {
        population_config.population_size = size;
    }
    if cli.seed.is_some() {
        population_config.rng_seed = cli.seed;
    }

    let grid = load_track_grid(
        &cli.track,
        config.canvas_width,
        config.canvas_height,
        WALL_COLOR,
    )?;
    let checkpoints = match &cli.checkpoints {
        Some(path) => load_checkpoints(path)?,
        None => default_checkpoints(),
    };
    let track = Arc::new(Track::new(grid, cli.finish, checkpoints).context("invalid track")?);
    info!(
        walls = track.grid().wall_count(),
        checkpoints = track.checkpoints().len(),
        finish = ?track.finish(),
        "track loaded"
    );

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        info!("received interrupt; stopping after the current tick");
        handler_token.cancel();
    })
    .context("failed to install Ctrl-C handler")?;

    let mut controller = GenerationController::new(config, track)
        .context("invalid simulation config")?
        .with_cancel_token(cancel)
        .with_observer(Box::new(LogObserver::new(cli.log_interval)));
    let mut population =
        Population::new(population_config).context("invalid population config")?;

    info!(
        population = population.config().population_size,
        generations = population.config().generation_cap,
        "starting training"
    );
    match population.run(&mut controller)? {
        Some(winner) => {
            save_genome(&cli.output, &winner)?;
            info!(
                path = %cli.output.display(),
                fitness = population.champion().map_or(0.0, |c| c.fitness()),
                "saved best policy"
            );
        }
        None => warn!("training aborted; no policy saved"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
