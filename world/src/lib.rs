#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the lane runner.
//!
//! The world owns the level chain, the entity pools, and the player body. It
//! is mutated exclusively through [`apply`] and observed through [`query`].

use std::time::Duration;

use lane_runner_core::{
    Command, ConfigError, Event, GenerationProgress, ObstacleId, PlacementError, PoolError,
    SegmentId, SegmentTemplate, TemplateId,
};

mod body;
mod chain;
mod config;
mod entities;
pub mod pool;

pub use config::WorldConfig;
pub use pool::{ObjectPool, PoolHandle, PoolPolicy, Poolable};

use body::PlayerBody;
use chain::{ChainLink, LevelChain};
use entities::{Obstacle, Segment};

/// Number of lanes on either side of the centre lane that carry ground.
const HALF_LANE_SPAN: f32 = 1.5;

/// Represents the authoritative lane runner world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    segment_pools: Vec<ObjectPool<Segment>>,
    obstacle_pool: ObjectPool<Obstacle>,
    chain: LevelChain,
    body: PlayerBody,
    player_activated: bool,
    level_started: bool,
    run_over: bool,
    score: u32,
    progress: GenerationProgress,
    next_segment_id: u32,
    next_obstacle_id: u32,
}

impl World {
    /// Creates a new world from validated configuration.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let segment_pools = config
            .templates
            .iter()
            .map(|_| ObjectPool::new(config.segment_pool))
            .collect();
        let obstacle_pool = ObjectPool::new(config.obstacle_pool);
        let chain = LevelChain::new(config.generation_origin);
        let body = PlayerBody::new(config.spawn_position, config.player_mass);

        Ok(Self {
            config,
            segment_pools,
            obstacle_pool,
            chain,
            body,
            player_activated: false,
            level_started: false,
            run_over: false,
            score: 0,
            progress: GenerationProgress::default(),
            next_segment_id: 0,
            next_obstacle_id: 0,
        })
    }

    fn template(&self, template: TemplateId) -> Option<&SegmentTemplate> {
        usize::try_from(template.get())
            .ok()
            .and_then(|index| self.config.templates.get(index))
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !self.body.active {
            return;
        }

        self.body.integrate(dt.as_secs_f32(), self.config.gravity);

        let ground = self.chain.origin().y;
        let half_width = self.config.lane_size * HALF_LANE_SPAN;
        let supported = self
            .chain
            .link_under(self.body.position, half_width)
            .is_some();

        if self.body.grounded {
            if !supported {
                self.body.grounded = false;
                log::debug!("player left the chain at {:?}", self.body.position);
                out_events.push(Event::PlayerLeftGround);
            }
        } else if supported
            && self.body.is_falling()
            && self.body.height() <= ground
            && self.body.height() >= ground - self.config.landing_tolerance
        {
            self.body.land(ground);
            out_events.push(Event::PlayerLanded);
        }

        if self.body.grounded && !self.level_started {
            self.level_started = true;
            log::debug!("player entered the level start");
            out_events.push(Event::LevelStartEntered);
        }

        self.detect_obstacle_contacts(out_events);

        if self.body.height() < self.config.kill_height {
            out_events.push(Event::PlayerFell);
            self.end_run(out_events);
            return;
        }

        self.recycle_trailing_segments(out_events);
    }

    fn detect_obstacle_contacts(&mut self, out_events: &mut Vec<Event>) {
        let player = self.body.position;
        let half_extents = self.config.trigger_half_extents;
        for link in self.chain.links() {
            let Some(segment) = self.segment_pools[template_index(link.template)].get(link.handle)
            else {
                continue;
            };
            for handle in &segment.obstacles {
                let Some(obstacle) = self.obstacle_pool.get_mut(*handle) else {
                    continue;
                };
                if obstacle.track_contact(player, half_extents) {
                    out_events.push(Event::PlayerCollided {
                        obstacle: obstacle.id,
                        kind: obstacle.kind,
                    });
                }
            }
        }
    }

    fn recycle_trailing_segments(&mut self, out_events: &mut Vec<Event>) {
        while let Some(link) = self
            .chain
            .pop_trailing(self.body.position, self.config.retention_distance)
        {
            self.release_segment(link, Some(&mut *out_events));
            out_events.push(Event::SegmentRecycled {
                segment: link.segment,
            });
        }
    }

    fn release_segment(&mut self, link: ChainLink, mut out_events: Option<&mut Vec<Event>>) {
        let pool = &mut self.segment_pools[template_index(link.template)];
        let obstacles = match pool.get_mut(link.handle) {
            Some(segment) => std::mem::take(&mut segment.obstacles),
            None => Vec::new(),
        };

        for handle in obstacles {
            let obstacle = self.obstacle_pool.get(handle).map(|obstacle| obstacle.id);
            if let Err(error) = self.obstacle_pool.release(handle) {
                log::warn!("failed to release obstacle {handle:?}: {error}");
                continue;
            }
            if let (Some(events), Some(obstacle)) = (out_events.as_deref_mut(), obstacle) {
                events.push(Event::ObstacleRecycled { obstacle });
            }
        }

        if let Err(error) = pool.release(link.handle) {
            log::warn!(
                "failed to release segment {}: {error}",
                link.segment.get()
            );
        }
    }

    fn place_segment(
        &mut self,
        template: TemplateId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlacementError> {
        let blueprint = self
            .template(template)
            .cloned()
            .ok_or(PlacementError::UnknownTemplate(template))?;
        let pool = &mut self.segment_pools[template_index(template)];
        let handle = pool.acquire()?;

        let mut obstacles = Vec::with_capacity(blueprint.obstacles.len());
        for _ in &blueprint.obstacles {
            match self.obstacle_pool.acquire() {
                Ok(obstacle) => obstacles.push(obstacle),
                Err(error) => {
                    for obstacle in obstacles {
                        if let Err(release) = self.obstacle_pool.release(obstacle) {
                            log::warn!("failed to roll back obstacle {obstacle:?}: {release}");
                        }
                    }
                    if let Err(release) = pool.release(handle) {
                        log::warn!("failed to roll back segment {handle:?}: {release}");
                    }
                    return Err(error.into());
                }
            }
        }

        let start = self.chain.leading_edge();
        let segment_id = SegmentId::new(self.next_segment_id);
        self.next_segment_id = self.next_segment_id.wrapping_add(1);

        let mut placed = Vec::with_capacity(obstacles.len());
        for (handle, slot) in obstacles.iter().zip(&blueprint.obstacles) {
            let obstacle_id = ObstacleId::new(self.next_obstacle_id);
            self.next_obstacle_id = self.next_obstacle_id.wrapping_add(1);
            if let Some(obstacle) = self.obstacle_pool.get_mut(*handle) {
                obstacle.place(obstacle_id, slot, start, self.config.lane_size);
                placed.push(Event::ObstaclePlaced {
                    obstacle: obstacle.id,
                    kind: obstacle.kind,
                    lane: obstacle.lane,
                    position: obstacle.position,
                });
            }
        }

        let Some(segment) = pool.get_mut(handle) else {
            return Err(PlacementError::Pool(PoolError::UnknownHandle));
        };
        segment.place(start, blueprint.length);
        segment.obstacles = obstacles;
        let end = segment.end;

        self.chain.append(ChainLink {
            segment: segment_id,
            template,
            handle,
            start,
            end,
        });
        log::debug!(
            "placed segment {} from template {} at {start:?}",
            segment_id.get(),
            template.get()
        );

        out_events.push(Event::SegmentPlaced {
            segment: segment_id,
            template,
            start,
            end,
        });
        out_events.extend(placed);
        Ok(())
    }

    fn recycle_obstacle(&mut self, obstacle: ObstacleId, out_events: &mut Vec<Event>) {
        for link in self.chain.links() {
            let pool = &mut self.segment_pools[template_index(link.template)];
            let Some(segment) = pool.get_mut(link.handle) else {
                continue;
            };
            let position = segment.obstacles.iter().position(|handle| {
                self.obstacle_pool
                    .get(*handle)
                    .is_some_and(|candidate| candidate.id == obstacle)
            });
            if let Some(position) = position {
                let handle = segment.obstacles.swap_remove(position);
                match self.obstacle_pool.release(handle) {
                    Ok(()) => out_events.push(Event::ObstacleRecycled { obstacle }),
                    Err(error) => log::warn!(
                        "failed to release obstacle {}: {error}",
                        obstacle.get()
                    ),
                }
                return;
            }
        }

        log::debug!("obstacle {} is not active; nothing to recycle", obstacle.get());
    }

    fn end_run(&mut self, out_events: &mut Vec<Event>) {
        if self.run_over {
            return;
        }

        self.run_over = true;
        self.body.active = false;
        log::info!("run ended with score {}", self.score);
        out_events.push(Event::RunEnded { score: self.score });
    }

    fn reset_scene(&mut self, out_events: &mut Vec<Event>) {
        let links = self.chain.reset();
        let released = links.len();
        for link in links {
            self.release_segment(link, None);
        }

        self.body.reset(self.player_activated);
        self.level_started = false;
        self.run_over = false;
        self.score = 0;
        self.next_segment_id = 0;
        self.next_obstacle_id = 0;
        log::debug!("scene reset released {released} segments");
        out_events.push(Event::SceneReset);
    }
}

fn template_index(template: TemplateId) -> usize {
    template.get() as usize
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(dt, out_events);
        }
        Command::ActivatePlayer => {
            if world.player_activated {
                return;
            }
            world.player_activated = true;
            if !world.run_over {
                world.body.active = true;
            }
            log::info!("player activated");
            out_events.push(Event::PlayerActivated);
        }
        Command::ApplyImpulse { impulse } => {
            if !world.body.apply_impulse(impulse) {
                log::debug!("ignored impulse on frozen player");
            }
        }
        Command::ApplyVelocityChange { delta } => {
            let _ = world.body.apply_velocity_change(delta);
        }
        Command::ExtendChain { template } => {
            if let Err(reason) = world.place_segment(template, out_events) {
                log::warn!("skipped segment from template {}: {reason}", template.get());
                out_events.push(Event::SegmentRejected { template, reason });
            }
        }
        Command::ReportProgress { percent } => {
            if world.progress.initial_fill_complete {
                return;
            }
            let percent = percent.clamp(0.0, 1.0).max(world.progress.percent);
            world.progress.percent = percent;
            out_events.push(Event::ProgressUpdated { percent });
        }
        Command::MarkGenerationReady => {
            if world.progress.initial_fill_complete {
                return;
            }
            world.progress.percent = 1.0;
            world.progress.initial_fill_complete = true;
            log::info!("initial level fill complete");
            out_events.push(Event::GenerationReady);
        }
        Command::AwardScore { points } => {
            if world.run_over {
                return;
            }
            world.score = world.score.saturating_add(points);
            out_events.push(Event::ScoreChanged { score: world.score });
        }
        Command::RecycleObstacle { obstacle } => world.recycle_obstacle(obstacle, out_events),
        Command::EndRun => world.end_run(out_events),
        Command::ResetScene => world.reset_scene(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use lane_runner_core::{
        GenerationProgress, Lane, ObstacleId, ObstacleKind, PlayerSnapshot, SegmentId,
        SegmentSnapshot,
    };

    use super::{template_index, World};

    /// Captures the player body state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.body.snapshot()
    }

    /// Current world position of the player, as requested by the level generator.
    #[must_use]
    pub fn player_position(world: &World) -> Vec3 {
        world.body.position
    }

    /// End anchor of the forward-most placed segment, or the origin when the chain is empty.
    #[must_use]
    pub fn leading_edge(world: &World) -> Vec3 {
        world.chain.leading_edge()
    }

    /// Anchor the chain grows from after construction or reset.
    #[must_use]
    pub fn generation_origin(world: &World) -> Vec3 {
        world.chain.origin()
    }

    /// Number of configured segment templates.
    #[must_use]
    pub fn template_count(world: &World) -> usize {
        world.config.templates.len()
    }

    /// Distance between adjacent lane centres.
    #[must_use]
    pub fn lane_size(world: &World) -> f32 {
        world.config.lane_size
    }

    /// Magnitude of the downward gravitational acceleration.
    #[must_use]
    pub fn gravity(world: &World) -> f32 {
        world.config.gravity
    }

    /// Captures the placed segments from rear to leading edge.
    #[must_use]
    pub fn segments(world: &World) -> Vec<SegmentSnapshot> {
        world
            .chain
            .links()
            .filter_map(|link| {
                let segment = world.segment_pools[template_index(link.template)].get(link.handle)?;
                Some(SegmentSnapshot {
                    id: link.segment,
                    template: link.template,
                    start: segment.start,
                    end: segment.end,
                })
            })
            .collect()
    }

    /// Captures every active obstacle in chain order.
    #[must_use]
    pub fn obstacles(world: &World) -> Vec<ObstacleSnapshot> {
        let mut snapshots = Vec::new();
        for link in world.chain.links() {
            let Some(segment) = world.segment_pools[template_index(link.template)].get(link.handle)
            else {
                continue;
            };
            snapshots.extend(segment.obstacles.iter().filter_map(|handle| {
                world
                    .obstacle_pool
                    .get(*handle)
                    .map(|obstacle| ObstacleSnapshot {
                        id: obstacle.id,
                        segment: link.segment,
                        kind: obstacle.kind,
                        lane: obstacle.lane,
                        position: obstacle.position,
                    })
            }));
        }
        snapshots
    }

    /// Initial-fill progress as last published.
    #[must_use]
    pub fn progress(world: &World) -> GenerationProgress {
        world.progress
    }

    /// Score accumulated during the current run.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Reports whether the current run has ended.
    #[must_use]
    pub fn is_run_over(world: &World) -> bool {
        world.run_over
    }

    /// Reports whether the player entered the level start during this run.
    #[must_use]
    pub fn level_started(world: &World) -> bool {
        world.level_started
    }

    /// Counts pooled entities per set.
    #[must_use]
    pub fn pool_usage(world: &World) -> PoolUsage {
        PoolUsage {
            active_segments: world.segment_pools.iter().map(|pool| pool.active_count()).sum(),
            available_segments: world
                .segment_pools
                .iter()
                .map(|pool| pool.available_count())
                .sum(),
            active_obstacles: world.obstacle_pool.active_count(),
            available_obstacles: world.obstacle_pool.available_count(),
        }
    }

    /// Immutable representation of a placed obstacle.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ObstacleSnapshot {
        /// Identifier assigned to the obstacle.
        pub id: ObstacleId,
        /// Segment carrying the obstacle.
        pub segment: SegmentId,
        /// Variant of the obstacle.
        pub kind: ObstacleKind,
        /// Lane the obstacle occupies.
        pub lane: Lane,
        /// World position of the obstacle.
        pub position: Vec3,
    }

    /// Number of pooled entities in each set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PoolUsage {
        /// Segments currently part of the chain.
        pub active_segments: usize,
        /// Segments waiting for reuse.
        pub available_segments: usize,
        /// Obstacles currently placed on segments.
        pub active_obstacles: usize,
        /// Obstacles waiting for reuse.
        pub available_obstacles: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lane_runner_core::{Lane, ObstacleKind, RUN_AXIS};

    fn world_with(templates: Vec<SegmentTemplate>) -> World {
        World::new(WorldConfig {
            templates,
            ..WorldConfig::default()
        })
        .expect("valid configuration")
    }

    fn extend(world: &mut World, template: u32) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::ExtendChain {
                template: TemplateId::new(template),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn extend_chain_places_segment_at_leading_edge() {
        let mut world = world_with(vec![SegmentTemplate::new(20.0)]);
        let origin = query::generation_origin(&world);

        let events = extend(&mut world, 0);

        assert_eq!(
            events,
            vec![Event::SegmentPlaced {
                segment: SegmentId::new(0),
                template: TemplateId::new(0),
                start: origin,
                end: origin + RUN_AXIS * 20.0,
            }]
        );
        assert_eq!(query::leading_edge(&world), origin + RUN_AXIS * 20.0);
    }

    #[test]
    fn obstacles_follow_lane_placement_rule() {
        let template = SegmentTemplate::new(20.0)
            .with_obstacle(5.0, Lane::MIN, ObstacleKind::Hazard)
            .with_obstacle(8.0, Lane::MAX, ObstacleKind::ScorePickup { points: 1 });
        let mut world = world_with(vec![template]);
        let origin = query::generation_origin(&world);
        let lane_size = query::lane_size(&world);

        let _ = extend(&mut world, 0);

        let obstacles = query::obstacles(&world);
        assert_eq!(obstacles.len(), 2);
        assert_eq!(
            obstacles[0].position,
            Vec3::new(origin.x - 5.0, origin.y, -lane_size)
        );
        assert_eq!(
            obstacles[1].position,
            Vec3::new(origin.x - 8.0, origin.y, lane_size)
        );
    }

    #[test]
    fn unknown_template_is_rejected_without_mutation() {
        let mut world = world_with(vec![SegmentTemplate::new(20.0)]);
        let edge = query::leading_edge(&world);

        let events = extend(&mut world, 3);

        assert_eq!(
            events,
            vec![Event::SegmentRejected {
                template: TemplateId::new(3),
                reason: PlacementError::UnknownTemplate(TemplateId::new(3)),
            }]
        );
        assert_eq!(query::leading_edge(&world), edge);
    }

    #[test]
    fn capped_obstacle_pool_rolls_back_partial_placement() {
        let template = SegmentTemplate::new(20.0)
            .with_obstacle(5.0, Lane::MIN, ObstacleKind::Hazard)
            .with_obstacle(8.0, Lane::MAX, ObstacleKind::Hazard);
        let mut world = World::new(WorldConfig {
            templates: vec![template],
            obstacle_pool: PoolPolicy::Capped { capacity: 3 },
            ..WorldConfig::default()
        })
        .expect("valid configuration");

        let _ = extend(&mut world, 0);
        let edge = query::leading_edge(&world);
        let events = extend(&mut world, 0);

        assert!(matches!(
            events.as_slice(),
            [Event::SegmentRejected {
                reason: PlacementError::Pool(PoolError::Exhausted { capacity: 3 }),
                ..
            }]
        ));
        assert_eq!(query::leading_edge(&world), edge);
        let usage = query::pool_usage(&world);
        assert_eq!(usage.active_segments, 1);
        assert_eq!(usage.active_obstacles, 2);
    }

    #[test]
    fn progress_is_monotonic_and_silenced_after_ready() {
        let mut world = world_with(vec![SegmentTemplate::new(20.0)]);
        let mut events = Vec::new();

        apply(&mut world, Command::ReportProgress { percent: 0.4 }, &mut events);
        apply(&mut world, Command::ReportProgress { percent: 0.2 }, &mut events);
        apply(&mut world, Command::MarkGenerationReady, &mut events);
        apply(&mut world, Command::ReportProgress { percent: 0.9 }, &mut events);
        apply(&mut world, Command::MarkGenerationReady, &mut events);

        assert_eq!(
            events,
            vec![
                Event::ProgressUpdated { percent: 0.4 },
                Event::ProgressUpdated { percent: 0.4 },
                Event::GenerationReady,
            ]
        );
        assert!(query::progress(&world).initial_fill_complete);
    }

    #[test]
    fn reset_returns_every_entity_to_its_pool() {
        let template =
            SegmentTemplate::new(20.0).with_obstacle(5.0, Lane::CENTER, ObstacleKind::Hazard);
        let mut world = world_with(vec![template]);
        for _ in 0..4 {
            let _ = extend(&mut world, 0);
        }

        let mut events = Vec::new();
        apply(&mut world, Command::ResetScene, &mut events);

        assert_eq!(events, vec![Event::SceneReset]);
        assert!(query::segments(&world).is_empty());
        assert_eq!(query::leading_edge(&world), query::generation_origin(&world));
        let usage = query::pool_usage(&world);
        assert_eq!(usage.active_segments, 0);
        assert_eq!(usage.active_obstacles, 0);
        assert_eq!(usage.available_segments, 4);
        assert_eq!(usage.available_obstacles, 4);
    }

    #[test]
    fn inactive_player_ignores_impulses() {
        let mut world = world_with(vec![SegmentTemplate::new(20.0)]);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ApplyImpulse {
                impulse: Vec3::new(0.0, 5.0, 0.0),
            },
            &mut events,
        );

        assert_eq!(query::player(&world).velocity, Vec3::ZERO);
        assert!(events.is_empty());
    }
}
