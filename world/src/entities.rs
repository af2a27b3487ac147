//! Pooled level segments and the lane obstacles they carry.

use glam::Vec3;
use lane_runner_core::{Lane, ObstacleId, ObstacleKind, ObstacleSlot, LANE_AXIS, RUN_AXIS};

use crate::pool::{PoolHandle, Poolable};

/// Level segment instance recycled through a per-template pool.
#[derive(Debug, Default)]
pub(crate) struct Segment {
    pub(crate) start: Vec3,
    pub(crate) end: Vec3,
    pub(crate) obstacles: Vec<PoolHandle>,
}

impl Segment {
    pub(crate) fn place(&mut self, start: Vec3, length: f32) {
        self.start = start;
        self.end = start + RUN_AXIS * length;
    }
}

impl Poolable for Segment {
    fn reset(&mut self) {
        self.start = Vec3::ZERO;
        self.end = Vec3::ZERO;
        self.obstacles.clear();
    }
}

/// Lane obstacle instance recycled through the shared obstacle pool.
#[derive(Debug)]
pub(crate) struct Obstacle {
    pub(crate) id: ObstacleId,
    pub(crate) kind: ObstacleKind,
    pub(crate) lane: Lane,
    pub(crate) position: Vec3,
    player_inside: bool,
}

impl Default for Obstacle {
    fn default() -> Self {
        Self {
            id: ObstacleId::new(0),
            kind: ObstacleKind::Hazard,
            lane: Lane::CENTER,
            position: Vec3::ZERO,
            player_inside: false,
        }
    }
}

impl Obstacle {
    /// Places the obstacle on its lane of the segment starting at `segment_start`.
    pub(crate) fn place(
        &mut self,
        id: ObstacleId,
        slot: &ObstacleSlot,
        segment_start: Vec3,
        lane_size: f32,
    ) {
        self.id = id;
        self.kind = slot.kind;
        self.lane = slot.lane;
        self.position = lane_position(segment_start + RUN_AXIS * slot.offset, slot.lane, lane_size);
    }

    /// Tracks the player against the trigger box and reports entry edges.
    pub(crate) fn track_contact(&mut self, player: Vec3, half_extents: Vec3) -> bool {
        let delta = (player - self.position).abs();
        let inside = delta.cmple(half_extents).all();
        let entered = inside && !self.player_inside;
        self.player_inside = inside;
        entered
    }
}

impl Poolable for Obstacle {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Moves `anchor` onto the centre line of `lane`, keeping its other coordinates.
pub(crate) fn lane_position(anchor: Vec3, lane: Lane, lane_size: f32) -> Vec3 {
    let across = anchor.dot(LANE_AXIS);
    anchor + LANE_AXIS * (lane.offset(lane_size) - across)
}
