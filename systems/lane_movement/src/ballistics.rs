//! Closed-form launch velocity for arcs that land on a target point.

use glam::{Quat, Vec3};
use lane_runner_core::TrajectoryError;

/// Solves the initial velocity that carries a projectile across `displacement`
/// when launched at the fixed pitch `angle` (radians) under gravity magnitude `gravity`.
///
/// The horizontal launch direction follows the horizontal part of the
/// displacement. The speed is derived from the range equation, so the arc
/// passes through the target regardless of how far away it is. A target that
/// rises faster than the launch slope cannot be reached.
pub fn launch_velocity(
    displacement: Vec3,
    angle: f32,
    gravity: f32,
) -> Result<Vec3, TrajectoryError> {
    let distance = Vec3::new(displacement.x, 0.0, displacement.z).length();
    let denominator = distance * angle.tan() - displacement.y;
    if denominator <= 0.0 || !denominator.is_finite() {
        return Err(TrajectoryError::InvalidTrajectory);
    }

    let speed = angle.cos().recip() * (0.5 * gravity * distance * distance / denominator).sqrt();
    let local = Vec3::new(0.0, speed * angle.sin(), speed * angle.cos());
    let yaw = displacement.x.atan2(displacement.z);
    let velocity = Quat::from_rotation_y(yaw) * local;

    if velocity.is_finite() {
        Ok(velocity)
    } else {
        Err(TrajectoryError::InvalidTrajectory)
    }
}
