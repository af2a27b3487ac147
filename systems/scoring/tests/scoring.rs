use std::time::Duration;

use lane_runner_core::{Command, Event, Lane, ObstacleKind, SegmentTemplate, TemplateId, RUN_AXIS};
use lane_runner_system_scoring::Scoring;
use lane_runner_world::{self as world, query, World, WorldConfig};

fn dispatch(world: &mut World, scoring: &mut Scoring, command: Command, log: &mut Vec<Event>) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);

    while !events.is_empty() {
        log.extend(events.iter().cloned());
        let mut commands = Vec::new();
        scoring.handle(&events, &mut commands);

        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}

#[test]
fn pickup_scores_then_hazard_ends_the_run() {
    let template = SegmentTemplate::new(30.0)
        .with_obstacle(10.0, Lane::CENTER, ObstacleKind::ScorePickup { points: 10 })
        .with_obstacle(20.0, Lane::CENTER, ObstacleKind::Hazard);
    let mut world = World::new(WorldConfig {
        templates: vec![template],
        ..WorldConfig::default()
    })
    .expect("valid configuration");
    let mut scoring = Scoring::new();
    let mut log = Vec::new();

    for command in [
        Command::ExtendChain {
            template: TemplateId::new(0),
        },
        Command::ExtendChain {
            template: TemplateId::new(0),
        },
        Command::ActivatePlayer,
        Command::ApplyVelocityChange {
            delta: RUN_AXIS * 10.0,
        },
    ] {
        dispatch(&mut world, &mut scoring, command, &mut log);
    }
    for _ in 0..150 {
        dispatch(
            &mut world,
            &mut scoring,
            Command::Tick {
                dt: Duration::from_millis(20),
            },
            &mut log,
        );
    }

    let outcome: Vec<_> = log
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::ScoreChanged { .. } | Event::ObstacleRecycled { .. } | Event::RunEnded { .. }
            )
        })
        .cloned()
        .collect();
    assert!(matches!(
        outcome.as_slice(),
        [
            Event::ScoreChanged { score: 10 },
            Event::ObstacleRecycled { .. },
            Event::RunEnded { score: 10 },
        ]
    ));
    assert!(query::is_run_over(&world));
    assert_eq!(query::score(&world), 10);
}
