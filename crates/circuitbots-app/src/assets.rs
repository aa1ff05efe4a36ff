//! Loading track rasters, checkpoint lists and configs, and saving the winning policy.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use circuitbots_brain::PolicyGenome;
use circuitbots_core::{Checkpoint, OccupancyGrid, Rect};
use image::GenericImageView;
use image::imageops::FilterType;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Pixels of exactly this colour are walls.
pub const WALL_COLOR: [u8; 3] = [0, 0, 0];

/// Rasterise a track image into an occupancy grid of the given canvas size.
///
/// Images of another size are scaled with nearest-neighbour sampling so no new colours
/// appear at wall edges.
pub fn load_track_grid(
    path: &Path,
    width: u32,
    height: u32,
    wall: [u8; 3],
) -> Result<OccupancyGrid> {
    let image = image::open(path)
        .with_context(|| format!("failed to open track image {}", path.display()))?;
    let image = if (image.width(), image.height()) == (width, height) {
        image
    } else {
        warn!(
            source_width = image.width(),
            source_height = image.height(),
            width,
            height,
            "rescaling track image to canvas"
        );
        image.resize_exact(width, height, FilterType::Nearest)
    };
    let pixels = image.to_rgb8();
    let grid = OccupancyGrid::from_fn(width, height, |x, y| pixels.get_pixel(x, y).0 == wall)
        .context("track image does not match canvas")?;
    debug!(walls = grid.wall_count(), "track rasterised");
    Ok(grid)
}

/// Read a JSON document into `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Read a checkpoint list of the form `[{"x": .., "y": .., "radius": ..}, ...]`.
pub fn load_checkpoints(path: &Path) -> Result<Vec<Checkpoint>> {
    let checkpoints: Vec<Checkpoint> = load_json(path)?;
    if checkpoints.is_empty() {
        warn!(path = %path.display(), "checkpoint file is empty; every finish crossing counts as a lap");
    }
    Ok(checkpoints)
}

/// Parse `left,top,width,height` into a rectangle.
pub fn parse_rect(value: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [left, top, width, height] = parts.as_slice() else {
        return Err(format!("expected left,top,width,height but got `{value}`"));
    };
    let number = |field: &str, raw: &str| -> Result<i64, String> {
        raw.parse::<i64>()
            .map_err(|err| format!("invalid {field} `{raw}`: {err}"))
    };
    let left = i32::try_from(number("left", left)?).map_err(|err| err.to_string())?;
    let top = i32::try_from(number("top", top)?).map_err(|err| err.to_string())?;
    let width = u32::try_from(number("width", width)?).map_err(|err| err.to_string())?;
    let height = u32::try_from(number("height", height)?).map_err(|err| err.to_string())?;
    Ok(Rect::new(left, top, width, height))
}

/// Write the winning genome as pretty JSON.
pub fn save_genome(path: &Path, genome: &PolicyGenome) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("output path is empty");
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, genome)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
