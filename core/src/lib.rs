#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the lane runner.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches. Player input
//! never reaches the world directly: it is delivered to the lane movement
//! system as [`PlayerInput`] values.

use std::time::Duration;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

mod errors;
pub mod seconds;

pub use errors::{ConfigError, LaneOutOfRange, PlacementError, PoolError, TrajectoryError};

/// Direction the runner advances along.
pub const RUN_AXIS: Vec3 = Vec3::NEG_X;

/// Direction along which the three lanes are spread.
pub const LANE_AXIS: Vec3 = Vec3::Z;

/// World up direction, opposite to gravity.
pub const UP_AXIS: Vec3 = Vec3::Y;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by one physics step.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Unfreezes the player body so physics and impulses apply to it.
    ActivatePlayer,
    /// Applies an instantaneous impulse to the player body.
    ApplyImpulse {
        /// Impulse expressed in mass-scaled world units.
        impulse: Vec3,
    },
    /// Adds a mass-independent velocity change to the player body.
    ApplyVelocityChange {
        /// Velocity delta in world units per second.
        delta: Vec3,
    },
    /// Requests that a segment built from the template is appended to the chain.
    ExtendChain {
        /// Template the new segment is instantiated from.
        template: TemplateId,
    },
    /// Publishes initial-fill progress for loader consumers.
    ReportProgress {
        /// Fraction of the initial fill that is complete, in `0.0..=1.0`.
        percent: f32,
    },
    /// Declares the initial fill complete.
    MarkGenerationReady,
    /// Adds points to the running score.
    AwardScore {
        /// Number of points to add.
        points: u32,
    },
    /// Returns an active obstacle to its pool.
    RecycleObstacle {
        /// Identifier of the obstacle to release.
        obstacle: ObstacleId,
    },
    /// Ends the current run and freezes the player.
    EndRun,
    /// Returns every placed entity to its pool and restores the initial scene.
    ResetScene,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player body became active.
    PlayerActivated,
    /// Reports that the airborne player touched the ground.
    PlayerLanded,
    /// Reports that the grounded player ran off the end of the placed chain.
    PlayerLeftGround,
    /// Reports that the player entered the level-start trigger for this run.
    LevelStartEntered,
    /// Confirms that a segment was appended to the chain.
    SegmentPlaced {
        /// Identifier assigned to the placed segment.
        segment: SegmentId,
        /// Template the segment was instantiated from.
        template: TemplateId,
        /// Anchor where the segment begins along the run axis.
        start: Vec3,
        /// Anchor where the segment ends along the run axis.
        end: Vec3,
    },
    /// Reports that a segment left the retention window and returned to its pool.
    SegmentRecycled {
        /// Identifier of the released segment.
        segment: SegmentId,
    },
    /// Reports that a chain extension request was skipped.
    SegmentRejected {
        /// Template requested for placement.
        template: TemplateId,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that an obstacle was placed on a lane of a segment.
    ObstaclePlaced {
        /// Identifier assigned to the obstacle.
        obstacle: ObstacleId,
        /// Variant of the obstacle.
        kind: ObstacleKind,
        /// Lane the obstacle occupies.
        lane: Lane,
        /// World position of the obstacle.
        position: Vec3,
    },
    /// Reports that an obstacle returned to its pool.
    ObstacleRecycled {
        /// Identifier of the released obstacle.
        obstacle: ObstacleId,
    },
    /// Reports that the player entered the trigger region of an active obstacle.
    PlayerCollided {
        /// Identifier of the obstacle that was entered.
        obstacle: ObstacleId,
        /// Variant of the obstacle.
        kind: ObstacleKind,
    },
    /// Publishes initial-fill progress. Never emitted after [`Event::GenerationReady`].
    ProgressUpdated {
        /// Fraction of the initial fill that is complete, in `0.0..=1.0`.
        percent: f32,
    },
    /// Announces, exactly once, that the initial fill is complete.
    GenerationReady,
    /// Reports the running score after it changed.
    ScoreChanged {
        /// Score accumulated during the current run.
        score: u32,
    },
    /// Reports that the player dropped below the kill height.
    PlayerFell,
    /// Announces that the current run is over.
    RunEnded {
        /// Score accumulated during the run.
        score: u32,
    },
    /// Confirms that the scene returned to its initial state.
    SceneReset,
}

/// Discrete input delivered to the lane movement system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerInput {
    /// Requests a vertical jump.
    Jump,
    /// Requests a lane change by one lane in the given direction.
    Move {
        /// Direction of the lane change.
        delta: LaneDelta,
    },
    /// Touch swipe; upward swipes jump, sideways swipes change lane.
    Swipe {
        /// Swipe direction in screen space, `y` pointing up.
        direction: Vec2,
    },
}

/// One of the three parallel tracks, indexed `-1`, `0` and `1`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i8", into = "i8")]
pub struct Lane(i8);

impl Lane {
    /// Lowest lane index.
    pub const MIN: Lane = Lane(-1);
    /// Middle lane where every run starts.
    pub const CENTER: Lane = Lane(0);
    /// Highest lane index.
    pub const MAX: Lane = Lane(1);

    /// Creates a lane from its index, rejecting values outside `-1..=1`.
    #[must_use]
    pub const fn new(index: i8) -> Option<Self> {
        if index >= Self::MIN.0 && index <= Self::MAX.0 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Signed index of the lane.
    #[must_use]
    pub const fn index(self) -> i8 {
        self.0
    }

    /// Lane reached by moving one step in the provided direction, if it exists.
    #[must_use]
    pub const fn shifted(self, delta: LaneDelta) -> Option<Self> {
        Self::new(self.0 + delta.value())
    }

    /// Across-lane coordinate of the lane centre for the provided lane width.
    #[must_use]
    pub fn offset(self, lane_size: f32) -> f32 {
        f32::from(self.0) * lane_size
    }
}

impl TryFrom<i8> for Lane {
    type Error = LaneOutOfRange;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(LaneOutOfRange(value))
    }
}

impl From<Lane> for i8 {
    fn from(lane: Lane) -> Self {
        lane.index()
    }
}

/// Direction of a single-lane move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LaneDelta {
    /// Towards lower lane indices.
    Negative,
    /// Towards higher lane indices.
    Positive,
}

impl LaneDelta {
    /// Signed step applied to a lane index.
    #[must_use]
    pub const fn value(self) -> i8 {
        match self {
            Self::Negative => -1,
            Self::Positive => 1,
        }
    }

    /// Resolves the direction from the sign of a scalar. Zero yields `None`.
    #[must_use]
    pub fn from_sign(value: f32) -> Option<Self> {
        if value > 0.0 {
            Some(Self::Positive)
        } else if value < 0.0 {
            Some(Self::Negative)
        } else {
            None
        }
    }
}

/// Unique identifier assigned to a placed segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u32);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a placed obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a configured segment template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Creates a new template identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Variants of lane obstacles reacting to player contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    /// Collectible that awards points and disappears.
    ScorePickup {
        /// Points awarded on contact.
        points: u32,
    },
    /// Obstacle that ends the run on contact.
    Hazard,
}

/// Placement of one obstacle inside a segment template.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSlot {
    /// Distance from the segment's start anchor along the run axis.
    pub offset: f32,
    /// Lane the obstacle is placed on.
    pub lane: Lane,
    /// Variant of the obstacle.
    pub kind: ObstacleKind,
}

/// Blueprint of a level segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentTemplate {
    /// Length of the segment along the run axis.
    pub length: f32,
    /// Obstacles carried by every instance of the template.
    #[serde(default)]
    pub obstacles: Vec<ObstacleSlot>,
}

impl SegmentTemplate {
    /// Creates an empty template of the provided length.
    #[must_use]
    pub fn new(length: f32) -> Self {
        Self {
            length,
            obstacles: Vec::new(),
        }
    }

    /// Adds an obstacle slot to the template.
    #[must_use]
    pub fn with_obstacle(mut self, offset: f32, lane: Lane, kind: ObstacleKind) -> Self {
        self.obstacles.push(ObstacleSlot { offset, lane, kind });
        self
    }
}

/// Immutable representation of the player body used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// World position of the body.
    pub position: Vec3,
    /// Linear velocity of the body.
    pub velocity: Vec3,
    /// Mass used to convert impulses into velocity changes.
    pub mass: f32,
    /// Whether the body currently rests on a segment.
    pub grounded: bool,
    /// Whether the body is simulated.
    pub active: bool,
}

/// Immutable representation of a placed segment used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentSnapshot {
    /// Identifier assigned to the segment.
    pub id: SegmentId,
    /// Template the segment was instantiated from.
    pub template: TemplateId,
    /// Anchor where the segment begins.
    pub start: Vec3,
    /// Anchor where the segment ends.
    pub end: Vec3,
}

/// Initial-fill progress as seen by loader consumers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenerationProgress {
    /// Last published fraction, in `0.0..=1.0`.
    pub percent: f32,
    /// Becomes `true` exactly once, when the initial fill completes.
    pub initial_fill_complete: bool,
}
