#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Lane movement system that turns player input into jump and lane-change impulses.

use std::time::Duration;

use glam::Vec3;
use lane_runner_core::{
    Command, ConfigError, Event, Lane, LaneDelta, PlayerInput, PlayerSnapshot, TrajectoryError,
    RUN_AXIS, UP_AXIS,
};
use serde::{Deserialize, Serialize};

mod ballistics;

pub use ballistics::launch_velocity;

const DEFAULT_MAX_VELOCITY: f32 = 15.0;
const DEFAULT_ACCELERATION: f32 = 0.2;
const DEFAULT_JUMP_VELOCITY: f32 = 7.0;
const DEFAULT_LANE_INPUT_DELAY: Duration = Duration::from_millis(250);
const DEFAULT_LANE_CHANGE_ANGLE: f32 = 40.0;

/// Tuning parameters of the lane movement system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Forward speed ceiling above which the runner stops accelerating.
    pub max_velocity: f32,
    /// Forward velocity added on every physics tick below the ceiling.
    pub acceleration: f32,
    /// Vertical velocity added by a jump.
    pub jump_velocity: f32,
    /// Cooldown between landing from a lane change and accepting the next one.
    #[serde(with = "lane_runner_core::seconds")]
    pub lane_input_delay: Duration,
    /// Launch pitch of lane-change arcs, in degrees.
    pub lane_change_angle: f32,
}

impl Config {
    /// Checks that the tuning produces well-defined impulses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_velocity", self.max_velocity),
            ("acceleration", self.acceleration),
            ("jump_velocity", self.jump_velocity),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.lane_change_angle <= 0.0 || self.lane_change_angle >= 90.0 {
            return Err(ConfigError::LaunchAngle {
                degrees: self.lane_change_angle,
            });
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_velocity: DEFAULT_MAX_VELOCITY,
            acceleration: DEFAULT_ACCELERATION,
            jump_velocity: DEFAULT_JUMP_VELOCITY,
            lane_input_delay: DEFAULT_LANE_INPUT_DELAY,
            lane_change_angle: DEFAULT_LANE_CHANGE_ANGLE,
        }
    }
}

/// Input gating and lane bookkeeping of the runner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaneState {
    /// Lane the runner occupies or is travelling to.
    pub current_lane: Lane,
    /// Whether the runner touches the ground.
    pub grounded: bool,
    /// Set by a lane change; cleared once the runner landed and the cooldown elapsed.
    pub changing_lane: bool,
    /// Becomes `true` when the runner first reaches the level start.
    pub input_enabled: bool,
}

/// Reason the runner left the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AirborneCause {
    /// Vertical jump.
    Jumping,
    /// Ballistic arc towards a neighbouring lane.
    ChangingLane,
}

/// Finite-state view of the runner's movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Running on the ground.
    #[default]
    Grounded,
    /// In the air after an impulse.
    Airborne(AirborneCause),
}

/// Immutable inputs describing the track the runner moves on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackView {
    /// Distance between adjacent lane centres.
    pub lane_size: f32,
    /// Magnitude of the downward gravitational acceleration.
    pub gravity: f32,
}

/// Pure system that reacts to inputs and world events by emitting impulse commands.
#[derive(Debug)]
pub struct LaneMovement {
    config: Config,
    launch_angle: f32,
    state: LaneState,
    phase: Phase,
    pending_clear: Option<Duration>,
}

impl LaneMovement {
    /// Creates the system in its initial grounded state with input disabled.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            launch_angle: config.lane_change_angle.to_radians(),
            state: LaneState::default(),
            phase: Phase::Grounded,
            pending_clear: None,
        }
    }

    /// Current lane bookkeeping.
    #[must_use]
    pub const fn state(&self) -> LaneState {
        self.state
    }

    /// Current movement phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the system to its initial state.
    pub fn reset(&mut self) {
        self.state = LaneState::default();
        self.phase = Phase::Grounded;
        self.pending_clear = None;
    }

    /// Consumes world events, player inputs and the player view to emit movement commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        inputs: &[PlayerInput],
        player: &PlayerSnapshot,
        track: TrackView,
        out: &mut Vec<Command>,
    ) {
        let mut physics_ticks = 0_usize;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    self.advance_cooldown(*dt);
                    physics_ticks += 1;
                }
                Event::LevelStartEntered => {
                    if !self.state.input_enabled {
                        log::debug!("lane input enabled");
                    }
                    self.state.input_enabled = true;
                }
                Event::PlayerLanded => self.on_landed(),
                Event::PlayerLeftGround => self.state.grounded = false,
                Event::SceneReset => self.reset(),
                _ => {}
            }
        }

        for input in inputs {
            match *input {
                PlayerInput::Jump => self.jump(player, out),
                PlayerInput::Move { delta } => self.change_lane(delta, player, track, out),
                PlayerInput::Swipe { direction } => {
                    if direction.y > 0.0 {
                        self.jump(player, out);
                    } else if let Some(delta) = LaneDelta::from_sign(direction.x) {
                        self.change_lane(delta, player, track, out);
                    }
                }
            }
        }

        self.accelerate(physics_ticks, player, out);
    }

    fn advance_cooldown(&mut self, dt: Duration) {
        let Some(remaining) = self.pending_clear else {
            return;
        };

        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.pending_clear = None;
            self.state.changing_lane = false;
            log::debug!("lane change cooldown elapsed");
        } else {
            self.pending_clear = Some(remaining);
        }
    }

    fn on_landed(&mut self) {
        let previous = self.phase;
        self.state.grounded = true;
        self.phase = Phase::Grounded;

        if previous != Phase::Airborne(AirborneCause::ChangingLane) || self.pending_clear.is_some()
        {
            return;
        }

        if self.config.lane_input_delay.is_zero() {
            self.state.changing_lane = false;
        } else {
            self.pending_clear = Some(self.config.lane_input_delay);
        }
    }

    fn accepts_input(&self, player: &PlayerSnapshot) -> bool {
        self.state.input_enabled && self.state.grounded && player.active
    }

    fn jump(&mut self, player: &PlayerSnapshot, out: &mut Vec<Command>) {
        if !self.accepts_input(player) {
            return;
        }

        self.state.grounded = false;
        self.phase = Phase::Airborne(AirborneCause::Jumping);
        out.push(Command::ApplyVelocityChange {
            delta: UP_AXIS * self.config.jump_velocity,
        });
    }

    fn change_lane(
        &mut self,
        delta: LaneDelta,
        player: &PlayerSnapshot,
        track: TrackView,
        out: &mut Vec<Command>,
    ) {
        if !self.accepts_input(player) || self.state.changing_lane {
            return;
        }

        let Some(target) = self.state.current_lane.shifted(delta) else {
            return;
        };

        let impulse = match self.lane_change_impulse(target, player, track) {
            Ok(impulse) => impulse,
            Err(error) => {
                log::warn!(
                    "skipped lane change to {}: {error}",
                    target.index()
                );
                return;
            }
        };

        log::debug!(
            "changing lane {} -> {}",
            self.state.current_lane.index(),
            target.index()
        );
        self.state.current_lane = target;
        self.state.grounded = false;
        self.state.changing_lane = true;
        self.phase = Phase::Airborne(AirborneCause::ChangingLane);
        out.push(Command::ApplyImpulse { impulse });
    }

    fn lane_change_impulse(
        &self,
        target: Lane,
        player: &PlayerSnapshot,
        track: TrackView,
    ) -> Result<Vec3, TrajectoryError> {
        let displacement = Vec3::new(0.0, 0.0, target.offset(track.lane_size) - player.position.z);
        let velocity = launch_velocity(displacement, self.launch_angle, track.gravity)?;
        Ok(velocity * player.mass)
    }

    fn accelerate(&self, physics_ticks: usize, player: &PlayerSnapshot, out: &mut Vec<Command>) {
        if !player.active || !(self.state.grounded || self.state.changing_lane) {
            return;
        }

        if player.velocity.dot(RUN_AXIS).abs() >= self.config.max_velocity {
            return;
        }

        for _ in 0..physics_ticks {
            out.push(Command::ApplyVelocityChange {
                delta: RUN_AXIS * self.config.acceleration,
            });
        }
    }
}

impl Default for LaneMovement {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
