//! Rigid body that carries the player along the chain.

use glam::Vec3;
use lane_runner_core::{PlayerSnapshot, LANE_AXIS, UP_AXIS};

#[derive(Debug)]
pub(crate) struct PlayerBody {
    spawn: Vec3,
    mass: f32,
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) grounded: bool,
    pub(crate) active: bool,
}

impl PlayerBody {
    pub(crate) fn new(spawn: Vec3, mass: f32) -> Self {
        Self {
            spawn,
            mass,
            position: spawn,
            velocity: Vec3::ZERO,
            grounded: false,
            active: false,
        }
    }

    pub(crate) fn reset(&mut self, active: bool) {
        self.position = self.spawn;
        self.velocity = Vec3::ZERO;
        self.grounded = false;
        self.active = active;
    }

    /// Advances the body by `dt` seconds; the step is exact for constant gravity.
    pub(crate) fn integrate(&mut self, dt: f32, gravity: f32) {
        if !self.active {
            return;
        }

        if self.grounded {
            self.position += self.velocity * dt;
            return;
        }

        let acceleration = -UP_AXIS * gravity;
        self.position += self.velocity * dt + acceleration * (0.5 * dt * dt);
        self.velocity += acceleration * dt;
    }

    /// Adds a velocity change. Frozen bodies ignore it.
    pub(crate) fn apply_velocity_change(&mut self, delta: Vec3) -> bool {
        if !self.active {
            return false;
        }

        self.velocity += delta;
        if self.velocity.dot(UP_AXIS) > 0.0 {
            self.grounded = false;
        }
        true
    }

    pub(crate) fn apply_impulse(&mut self, impulse: Vec3) -> bool {
        self.apply_velocity_change(impulse / self.mass)
    }

    /// Puts the body on the ground at `height`, cancelling vertical and across-lane motion.
    pub(crate) fn land(&mut self, height: f32) {
        self.position = self.position - UP_AXIS * self.position.dot(UP_AXIS) + UP_AXIS * height;
        self.velocity -= UP_AXIS * self.velocity.dot(UP_AXIS);
        self.velocity -= LANE_AXIS * self.velocity.dot(LANE_AXIS);
        self.grounded = true;
    }

    pub(crate) fn height(&self) -> f32 {
        self.position.dot(UP_AXIS)
    }

    pub(crate) fn is_falling(&self) -> bool {
        self.velocity.dot(UP_AXIS) <= 0.0
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            velocity: self.velocity,
            mass: self.mass,
            grounded: self.grounded,
            active: self.active,
        }
    }
}
