#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session bootstrap that wires the world and the lane runner systems together.
//!
//! The session owns every collaborator and passes them to each other
//! explicitly. Each frame it applies a `Tick`, hands the resulting events to
//! the systems, applies their commands, and repeats until the cascade settles.

use std::{fmt, time::Duration};

use lane_runner_core::{Command, ConfigError, Event, PlayerInput};
use lane_runner_system_lane_movement::{
    Config as MovementConfig, LaneMovement, LaneState, Phase, TrackView,
};
use lane_runner_system_level_streaming::{
    Config as StreamingConfig, LevelStreaming, StreamingView,
};
use lane_runner_system_scoring::Scoring;
use lane_runner_world::{self as world, query, World, WorldConfig};
use serde::{Deserialize, Serialize};

const DEFAULT_FIXED_TIMESTEP: Duration = Duration::from_millis(20);
const MAX_CASCADE_DEPTH: usize = 64;

/// Configuration bundle for a complete lane runner session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// World tuning.
    pub world: WorldConfig,
    /// Lane movement tuning.
    pub movement: MovementConfig,
    /// Level streaming tuning.
    pub streaming: StreamingConfig,
    /// Physics tick length used by [`Session::advance`].
    #[serde(with = "lane_runner_core::seconds")]
    pub fixed_timestep: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            movement: MovementConfig::default(),
            streaming: StreamingConfig::default(),
            fixed_timestep: DEFAULT_FIXED_TIMESTEP,
        }
    }
}

impl SessionConfig {
    /// Validates every section of the bundle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate()?;
        self.movement.validate()?;
        self.streaming.validate()?;
        if self.fixed_timestep.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "fixed_timestep",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Handle returned by [`Session::subscribe`]; pass it to [`Session::unsubscribe`] on teardown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(&Event)>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(Subscription, Listener)>,
}

impl ListenerRegistry {
    fn subscribe(&mut self, listener: Listener) -> Subscription {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((subscription, listener));
        subscription
    }

    fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let Some(index) = self
            .listeners
            .iter()
            .position(|(candidate, _)| *candidate == subscription)
        else {
            return false;
        };
        let _ = self.listeners.remove(index);
        true
    }

    fn publish(&mut self, events: &[Event]) {
        for event in events {
            for (_, listener) in &mut self.listeners {
                listener(event);
            }
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Running lane runner: world, systems, pending input and listeners.
#[derive(Debug)]
pub struct Session {
    world: World,
    movement: LaneMovement,
    streaming: LevelStreaming,
    scoring: Scoring,
    pending_inputs: Vec<PlayerInput>,
    listeners: ListenerRegistry,
    frame_events: Vec<Event>,
    fixed_timestep: Duration,
    accumulator: Duration,
}

impl Session {
    /// Builds a session from validated configuration.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            world: World::new(config.world)?,
            movement: LaneMovement::new(config.movement),
            streaming: LevelStreaming::new(config.streaming),
            scoring: Scoring::new(),
            pending_inputs: Vec::new(),
            listeners: ListenerRegistry::default(),
            frame_events: Vec::new(),
            fixed_timestep: config.fixed_timestep,
            accumulator: Duration::ZERO,
        })
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Lane bookkeeping of the movement system.
    #[must_use]
    pub fn lane_state(&self) -> LaneState {
        self.movement.state()
    }

    /// Movement phase of the runner.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.movement.phase()
    }

    /// Events produced by the most recent step or reset.
    #[must_use]
    pub fn frame_events(&self) -> &[Event] {
        &self.frame_events
    }

    /// Queues an input for delivery with the next physics tick.
    pub fn push_input(&mut self, input: PlayerInput) {
        self.pending_inputs.push(input);
    }

    /// Registers a listener that observes every event in subscription order.
    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) -> Subscription {
        self.listeners.subscribe(Box::new(listener))
    }

    /// Removes a listener. Returns `false` when the subscription is unknown.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    /// Runs as many fixed physics ticks as fit into `elapsed` and returns their count.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        self.accumulator = self.accumulator.saturating_add(elapsed);
        let mut ticks = 0;
        while self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            self.step(self.fixed_timestep);
            ticks += 1;
        }
        ticks
    }

    /// Runs a single physics tick of length `dt`.
    pub fn step(&mut self, dt: Duration) {
        self.frame_events.clear();
        let inputs = std::mem::take(&mut self.pending_inputs);
        self.dispatch(Command::Tick { dt }, inputs);
    }

    /// Resets the scene: the chain, the runner and every in-flight generation pass.
    pub fn reset(&mut self) {
        self.frame_events.clear();
        self.pending_inputs.clear();
        self.accumulator = Duration::ZERO;
        self.dispatch(Command::ResetScene, Vec::new());
    }

    fn dispatch(&mut self, command: Command, mut inputs: Vec<PlayerInput>) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        let mut depth = 0;
        while !events.is_empty() {
            depth += 1;
            if depth > MAX_CASCADE_DEPTH {
                log::warn!("command cascade did not settle; dropping {} events", events.len());
                break;
            }

            self.listeners.publish(&events);
            self.frame_events.extend(events.iter().cloned());

            let mut commands = Vec::new();
            if events.contains(&Event::GenerationReady) {
                commands.push(Command::ActivatePlayer);
            }

            let player = query::player(&self.world);
            let track = TrackView {
                lane_size: query::lane_size(&self.world),
                gravity: query::gravity(&self.world),
            };
            self.movement
                .handle(&events, &inputs, &player, track, &mut commands);
            inputs.clear();

            let view = StreamingView {
                player_position: query::player_position(&self.world),
                leading_edge: query::leading_edge(&self.world),
                template_count: query::template_count(&self.world),
            };
            self.streaming.handle(&events, view, &mut commands);
            self.scoring.handle(&events, &mut commands);

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bundle_is_valid() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
        assert_eq!(
            SessionConfig::default().fixed_timestep,
            Duration::from_millis(20)
        );
    }

    #[test]
    fn zero_timestep_is_rejected() {
        let config = SessionConfig {
            fixed_timestep: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert!(matches!(
            Session::new(config),
            Err(ConfigError::NotPositive {
                field: "fixed_timestep",
                ..
            })
        ));
    }

    #[test]
    fn advance_runs_whole_fixed_ticks() {
        let mut session = Session::new(SessionConfig::default()).expect("valid configuration");
        assert_eq!(session.advance(Duration::from_millis(50)), 2);
        assert_eq!(session.advance(Duration::from_millis(10)), 1);
    }
}
