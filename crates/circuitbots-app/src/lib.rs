//! Support code for the `circuitbots` training binary.

pub mod assets;
pub mod telemetry;

pub use assets::{
    WALL_COLOR, load_checkpoints, load_json, load_track_grid, parse_rect, save_genome,
};
pub use telemetry::LogObserver;
