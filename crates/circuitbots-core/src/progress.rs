//! Ordered checkpoint credit and lap completion.
//!
//! A vehicle earns checkpoint `k` only while `k` is the next expected index and has not
//! been credited this lap. A lap counts only on the rising edge of finish-region
//! occupancy after every checkpoint was credited in order.

use serde::{Deserialize, Serialize};

use crate::geometry::Position;
use crate::track::{Checkpoint, MAX_CHECKPOINTS};

/// Fixed-width set of checkpoint indices.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CheckpointBits(u64);

impl CheckpointBits {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Insert `index`, returning false if it was already present or out of range.
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= MAX_CHECKPOINTS || self.contains(index) {
            return false;
        }
        self.0 |= 1u64 << index;
        true
    }

    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        index < MAX_CHECKPOINTS && self.0 & (1u64 << index) != 0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_CHECKPOINTS).filter(|&index| self.contains(index))
    }
}

/// Result of a finish-region check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishEvent {
    /// Occupancy did not change from outside to inside.
    None,
    /// A legitimate lap finished; carries the new lap count.
    LapCompleted(u32),
    /// The region was entered before all checkpoints were credited.
    Rejected { credited: usize, required: usize },
}

/// Per-vehicle progress state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressTracker {
    next_index: usize,
    credited: CheckpointBits,
    reached: u32,
    laps: u32,
    was_on_finish: bool,
    checkpoint_times: Vec<f32>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn next_index(&self) -> usize {
        self.next_index
    }

    #[must_use]
    pub const fn credited(&self) -> CheckpointBits {
        self.credited
    }

    /// Total checkpoints credited across all laps.
    #[must_use]
    pub const fn checkpoints_reached(&self) -> u32 {
        self.reached
    }

    #[must_use]
    pub const fn laps(&self) -> u32 {
        self.laps
    }

    /// Simulated time of every checkpoint credit, oldest first.
    #[must_use]
    pub fn checkpoint_times(&self) -> &[f32] {
        &self.checkpoint_times
    }

    /// Credit the next expected checkpoint if `position` lies within it.
    ///
    /// Returns the credited index. At most one checkpoint is credited per call, and calling
    /// again without moving is a no-op because the expected index has already advanced.
    pub fn check_checkpoints(
        &mut self,
        position: Position,
        checkpoints: &[Checkpoint],
        now_secs: f32,
    ) -> Option<usize> {
        let index = self.next_index;
        let checkpoint = checkpoints.get(index)?;
        if !checkpoint.contains(position) || !self.credited.insert(index) {
            return None;
        }
        self.reached += 1;
        self.checkpoint_times.push(now_secs);
        self.next_index = (index + 1) % checkpoints.len();
        Some(index)
    }

    /// Update finish-region occupancy, completing a lap on a qualifying rising edge.
    pub fn check_finish(&mut self, on_finish: bool, checkpoint_count: usize) -> FinishEvent {
        let rising = on_finish && !self.was_on_finish;
        self.was_on_finish = on_finish;
        if !rising {
            return FinishEvent::None;
        }
        if self.next_index == 0 && self.credited.len() == checkpoint_count {
            self.laps += 1;
            self.credited.clear();
            FinishEvent::LapCompleted(self.laps)
        } else {
            FinishEvent::Rejected {
                credited: self.credited.len(),
                required: checkpoint_count,
            }
        }
    }

    /// Distance to the next expected checkpoint together with its radius.
    #[must_use]
    pub fn next_target(&self, position: Position, checkpoints: &[Checkpoint]) -> Option<(f32, f32)> {
        checkpoints
            .get(self.next_index)
            .map(|checkpoint| (position.distance(checkpoint.center()), checkpoint.radius))
    }

    /// Restore the freshly constructed state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
