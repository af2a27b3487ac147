//! Error taxonomy shared by the world and the systems.

use thiserror::Error;

use crate::TemplateId;

/// Failure of the closed-form ballistic solve.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TrajectoryError {
    /// The target cannot be reached at the configured launch angle.
    #[error("target is unreachable at the configured launch angle")]
    InvalidTrajectory,
}

/// Failures reported by an object pool.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The available set is empty and the pool may not grow further.
    #[error("pool exhausted at capacity {capacity}")]
    Exhausted {
        /// Number of entities the pool is allowed to own.
        capacity: usize,
    },
    /// The entity is already in the available set.
    #[error("entity released twice")]
    DoubleRelease,
    /// The handle was not issued by this pool.
    #[error("handle does not belong to this pool")]
    UnknownHandle,
}

/// Reasons a chain extension may be skipped by the world.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    /// No template is registered under the requested identifier.
    #[error("unknown segment template {}", .0.get())]
    UnknownTemplate(TemplateId),
    /// A segment or obstacle could not be acquired.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// A lane index outside `-1..=1` was supplied.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("lane index {0} is outside -1..=1")]
pub struct LaneOutOfRange(pub i8);

/// Invalid tuning detected while validating configuration.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The level has nothing to generate from.
    #[error("at least one segment template is required")]
    NoTemplates,
    /// A quantity that must be strictly positive is not.
    #[error("`{field}` must be positive, got {value}")]
    NotPositive {
        /// Name of the offending setting.
        field: &'static str,
        /// Value that was supplied.
        value: f32,
    },
    /// A quantity that must not be negative is.
    #[error("`{field}` must not be negative, got {value}")]
    Negative {
        /// Name of the offending setting.
        field: &'static str,
        /// Value that was supplied.
        value: f32,
    },
    /// The kill height does not lie below the ground level.
    #[error("kill height {kill_height} must lie below the ground level {ground}")]
    KillHeightAboveGround {
        /// Height that was supplied.
        kill_height: f32,
        /// Ground level derived from the generation origin.
        ground: f32,
    },
    /// The lane-change launch angle must lie strictly between 0 and 90 degrees.
    #[error("launch angle {degrees} must lie strictly between 0 and 90 degrees")]
    LaunchAngle {
        /// Angle that was supplied.
        degrees: f32,
    },
    /// An obstacle slot lies outside the segment that carries it.
    #[error("obstacle offset {offset} lies outside template {} of length {length}", .template.get())]
    ObstacleOutsideSegment {
        /// Template carrying the slot.
        template: TemplateId,
        /// Offending slot offset.
        offset: f32,
        /// Length of the template.
        length: f32,
    },
}
