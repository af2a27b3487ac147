#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure scoring system that resolves player collisions with lane obstacles.

use lane_runner_core::{Command, Event, ObstacleKind};

/// Pure system that turns obstacle collisions into score and run-end commands.
#[derive(Debug, Default)]
pub struct Scoring {
    run_over: bool,
}

impl Scoring {
    /// Creates a scoring system for a fresh run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and emits the commands that resolve collisions.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RunEnded { .. } => self.run_over = true,
                Event::SceneReset => self.run_over = false,
                Event::PlayerCollided { obstacle, kind } if !self.run_over => match *kind {
                    ObstacleKind::ScorePickup { points } => {
                        out.push(Command::AwardScore { points });
                        out.push(Command::RecycleObstacle {
                            obstacle: *obstacle,
                        });
                    }
                    ObstacleKind::Hazard => {
                        log::debug!("player hit hazard {}", obstacle.get());
                        self.run_over = true;
                        out.push(Command::EndRun);
                    }
                },
                _ => {}
            }
        }
    }
}
