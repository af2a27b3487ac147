#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless lane runner session.

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use glam::Vec2;
use lane_runner_core::{Event, LaneDelta, PlayerInput, RUN_AXIS};
use lane_runner_system_bootstrap::{Session, SessionConfig};
use lane_runner_world::query;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Render-rate frame fed to the fixed-step accumulator.
const FRAME: Duration = Duration::from_micros(16_667);

/// Headless lane runner driven by a seeded autopilot.
#[derive(Debug, Parser)]
#[command(name = "lane-runner", about = "Runs the lane runner core without a renderer")]
struct CliArgs {
    /// TOML file with session tuning; defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Simulated time to run, in seconds.
    #[arg(long, default_value_t = 60.0)]
    seconds: f64,
    /// Seed shared by the autopilot and the template selection.
    #[arg(long)]
    seed: Option<u64>,
    /// Delay between two autopilot inputs, in seconds.
    #[arg(long, default_value_t = 0.75)]
    input_interval: f64,
    /// Start a new run whenever the current one ends.
    #[arg(long)]
    restart: bool,
}

/// Entry point for the lane runner command-line interface.
fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.streaming.seed = seed;
    }
    let duration = Duration::try_from_secs_f64(args.seconds)
        .with_context(|| format!("invalid run length {}", args.seconds))?;
    let input_interval = Duration::try_from_secs_f64(args.input_interval)
        .with_context(|| format!("invalid input interval {}", args.input_interval))?;
    let autopilot_seed = config.streaming.seed;

    let mut session = Session::new(config).context("invalid session configuration")?;
    let summary = Rc::new(RefCell::new(RunSummary::default()));
    let sink = Rc::clone(&summary);
    let subscription = session.subscribe(move |event| sink.borrow_mut().record(event));

    let mut autopilot = Autopilot::new(autopilot_seed, input_interval);
    let mut elapsed = Duration::ZERO;
    while elapsed < duration {
        if let Some(input) = autopilot.poll(FRAME) {
            log::debug!("autopilot input {input:?}");
            session.push_input(input);
        }
        let _ = session.advance(FRAME);
        elapsed += FRAME;

        if query::is_run_over(session.world()) {
            if !args.restart {
                break;
            }
            session.reset();
        }
    }

    let _ = session.unsubscribe(subscription);
    let summary = summary.borrow();
    println!(
        "simulated {:.1}s | runs {} | best score {} | segments placed {} | recycled {} | distance {:.1}",
        elapsed.as_secs_f64(),
        summary.runs_ended.max(1),
        summary.best_score,
        summary.segments_placed,
        summary.segments_recycled,
        query::player_position(session.world()).dot(RUN_AXIS),
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    parse_config(&contents)
        .with_context(|| format!("failed to parse session config at {}", path.display()))
}

fn parse_config(contents: &str) -> Result<SessionConfig> {
    let config: SessionConfig =
        toml::from_str(contents).context("failed to parse session config toml contents")?;
    config.validate().context("session config is invalid")?;
    Ok(config)
}

/// Aggregates the event stream of a session for the final report.
#[derive(Debug, Default)]
struct RunSummary {
    segments_placed: usize,
    segments_recycled: usize,
    runs_ended: usize,
    best_score: u32,
}

impl RunSummary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::SegmentPlaced { .. } => self.segments_placed += 1,
            Event::SegmentRecycled { .. } => self.segments_recycled += 1,
            Event::SegmentRejected { template, reason } => {
                log::warn!("segment from template {} rejected: {reason}", template.get());
            }
            Event::ProgressUpdated { percent } => {
                log::info!("level generation {:.0}%", percent * 100.0);
            }
            Event::GenerationReady => log::info!("level ready"),
            Event::RunEnded { score } => {
                self.runs_ended += 1;
                self.best_score = self.best_score.max(*score);
                log::info!("run ended with score {score}");
            }
            Event::TimeAdvanced { .. } => {}
            other => log::debug!("{other:?}"),
        }
    }
}

/// Seeded input source standing in for a player.
#[derive(Debug)]
struct Autopilot {
    rng: ChaCha8Rng,
    interval: Duration,
    until_next: Duration,
}

impl Autopilot {
    fn new(seed: u64, interval: Duration) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            interval,
            until_next: interval,
        }
    }

    fn poll(&mut self, frame: Duration) -> Option<PlayerInput> {
        if self.interval.is_zero() {
            return None;
        }

        self.until_next = self.until_next.saturating_sub(frame);
        if !self.until_next.is_zero() {
            return None;
        }
        self.until_next = self.interval;

        let input = match self.rng.gen_range(0..5) {
            0 => PlayerInput::Jump,
            1 => PlayerInput::Move {
                delta: LaneDelta::Negative,
            },
            2 => PlayerInput::Move {
                delta: LaneDelta::Positive,
            },
            _ => PlayerInput::Swipe {
                direction: Vec2::new(self.rng.gen_range(-1.0..=1.0), self.rng.gen_range(-1.0..=1.0)),
            },
        };
        Some(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_runner_core::{Lane, ObstacleKind};
    use lane_runner_world::PoolPolicy;

    #[test]
    fn parses_partial_toml_over_defaults() {
        let config = parse_config(
            r#"
            fixed_timestep = 0.01

            [movement]
            lane_input_delay = 0.5

            [streaming]
            generation_distance = 90.0
            seed = 3

            [world]
            lane_size = 3.0
            segment_pool = { capped = { capacity = 32 } }

            [[world.templates]]
            length = 20.0
            obstacles = [
                { offset = 5.0, lane = -1, kind = "hazard" },
                { offset = 8.0, lane = 1, kind = { score_pickup = { points = 4 } } },
            ]
            "#,
        )
        .expect("valid config");

        assert_eq!(config.fixed_timestep, Duration::from_millis(10));
        assert_eq!(config.movement.lane_input_delay, Duration::from_millis(500));
        assert_eq!(config.movement.max_velocity, 15.0);
        assert_eq!(config.streaming.seed, 3);
        assert_eq!(config.world.lane_size, 3.0);
        assert_eq!(config.world.segment_pool, PoolPolicy::Capped { capacity: 32 });
        let slots = &config.world.templates[0].obstacles;
        assert_eq!(slots[0].lane, Lane::MIN);
        assert_eq!(slots[1].kind, ObstacleKind::ScorePickup { points: 4 });
    }

    #[test]
    fn out_of_range_lane_is_rejected() {
        let result = parse_config(
            r#"
            [[world.templates]]
            length = 20.0
            obstacles = [{ offset = 5.0, lane = 2, kind = "hazard" }]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_template_list_fails_validation() {
        let result = parse_config("[world]\ntemplates = []\n");
        let error = result.expect_err("validation rejects empty templates");
        assert!(format!("{error:#}").contains("at least one segment template"));
    }

    #[test]
    fn autopilot_fires_on_its_interval() {
        let mut autopilot = Autopilot::new(1, Duration::from_millis(50));
        let frame = Duration::from_millis(20);
        let fired: Vec<bool> = (0..6).map(|_| autopilot.poll(frame).is_some()).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
    }
}
