#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level streaming system that keeps a gapless chain of segments ahead of the runner.
//!
//! A sampling cycle reads the player position at a fixed interval and launches
//! a generation pass. Every pass is a small state machine advanced by one step
//! per physics tick; each step appends at most one segment, so a pass never
//! stalls a frame. Passes may overlap. The world serializes the resulting
//! `ExtendChain` commands, so the chain stays contiguous.

use std::time::Duration;

use glam::Vec3;
use lane_runner_core::{Command, ConfigError, Event, TemplateId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const DEFAULT_GENERATION_DISTANCE: f32 = 150.0;
const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_READY_GRACE: Duration = Duration::from_millis(500);
const DEFAULT_SEED: u64 = 0x6c61_6e65_7275_6e00;

/// Tuning parameters of the level streaming system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Safety margin the chain must extend beyond the sampled player position.
    pub generation_distance: f32,
    /// Delay between two player-position samples.
    #[serde(with = "lane_runner_core::seconds")]
    pub sample_interval: Duration,
    /// Delay between publishing full progress and signalling generation ready.
    #[serde(with = "lane_runner_core::seconds")]
    pub ready_grace: Duration,
    /// Seed of the template selection stream.
    pub seed: u64,
}

impl Config {
    /// Checks that the generator can make progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation_distance <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "generation_distance",
                value: self.generation_distance,
            });
        }
        if self.sample_interval.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "sample_interval",
                value: 0.0,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation_distance: DEFAULT_GENERATION_DISTANCE,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            ready_grace: DEFAULT_READY_GRACE,
            seed: DEFAULT_SEED,
        }
    }
}

/// Read-only inputs the generator consumes every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamingView {
    /// Current world position of the player.
    pub player_position: Vec3,
    /// End anchor of the forward-most placed segment.
    pub leading_edge: Vec3,
    /// Number of templates the world can instantiate.
    pub template_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PassStage {
    Extending { placed: bool },
    Grace { remaining: Duration },
}

#[derive(Clone, Copy, Debug)]
struct GenerationPass {
    stage: PassStage,
}

/// Pure system that emits chain extensions and initial-fill progress.
#[derive(Debug)]
pub struct LevelStreaming {
    config: Config,
    rng: ChaCha8Rng,
    sampled_position: Vec3,
    until_sample: Duration,
    passes: Vec<GenerationPass>,
    fill_complete: bool,
    grace_started: bool,
}

impl LevelStreaming {
    /// Creates the generator; the first sample is taken on the next physics tick.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            sampled_position: Vec3::ZERO,
            until_sample: Duration::ZERO,
            passes: Vec::new(),
            fill_complete: false,
            grace_started: false,
        }
    }

    /// Number of generation passes currently in flight.
    #[must_use]
    pub fn active_passes(&self) -> usize {
        self.passes.len()
    }

    /// Reports whether the generator observed the end of the initial fill.
    #[must_use]
    pub const fn fill_complete(&self) -> bool {
        self.fill_complete
    }

    /// Consumes world events and the streaming view to emit generation commands.
    pub fn handle(&mut self, events: &[Event], view: StreamingView, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.tick(*dt, view, out),
                Event::GenerationReady => self.fill_complete = true,
                Event::SegmentRejected { .. } => self.pause_extension(),
                Event::SceneReset => self.restart(),
                _ => {}
            }
        }
    }

    fn restart(&mut self) {
        if !self.passes.is_empty() {
            log::debug!("cancelling {} generation passes", self.passes.len());
        }
        self.passes.clear();
        self.until_sample = Duration::ZERO;
        self.grace_started = false;
    }

    /// Retires every extending pass; the next sample starts a fresh one.
    fn pause_extension(&mut self) {
        let before = self.passes.len();
        self.passes
            .retain(|pass| matches!(pass.stage, PassStage::Grace { .. }));
        let retired = before - self.passes.len();
        if retired > 0 {
            log::debug!("segment rejected; retired {retired} generation passes");
        }
    }

    fn tick(&mut self, dt: Duration, view: StreamingView, out: &mut Vec<Command>) {
        if self.until_sample.is_zero() {
            self.sampled_position = view.player_position;
            self.passes.push(GenerationPass {
                stage: PassStage::Extending { placed: false },
            });
            self.until_sample = self.config.sample_interval;
        }

        let mut passes = std::mem::take(&mut self.passes);
        passes.retain_mut(|pass| self.step(pass, dt, view, out));
        self.passes = passes;

        self.until_sample = self.until_sample.saturating_sub(dt);
    }

    /// Advances one pass by a single step. Returns `false` once the pass has finished.
    fn step(
        &mut self,
        pass: &mut GenerationPass,
        dt: Duration,
        view: StreamingView,
        out: &mut Vec<Command>,
    ) -> bool {
        match pass.stage {
            PassStage::Extending { placed } => {
                let distance = self.sampled_position.distance(view.leading_edge);
                if placed && !self.fill_complete {
                    out.push(Command::ReportProgress {
                        percent: self.fill_fraction(distance),
                    });
                }

                if distance < self.config.generation_distance {
                    let Some(template) = self.pick_template(view.template_count) else {
                        return false;
                    };
                    out.push(Command::ExtendChain { template });
                    pass.stage = PassStage::Extending { placed: true };
                    return true;
                }

                if self.fill_complete || self.grace_started {
                    return false;
                }

                self.grace_started = true;
                out.push(Command::ReportProgress { percent: 1.0 });
                pass.stage = PassStage::Grace {
                    remaining: self.config.ready_grace,
                };
                true
            }
            PassStage::Grace { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    out.push(Command::MarkGenerationReady);
                    return false;
                }
                pass.stage = PassStage::Grace { remaining };
                true
            }
        }
    }

    fn fill_fraction(&self, distance: f32) -> f32 {
        distance.clamp(0.0, self.config.generation_distance) / self.config.generation_distance
    }

    fn pick_template(&mut self, template_count: usize) -> Option<TemplateId> {
        if template_count == 0 {
            log::warn!("no segment templates available; generation pass abandoned");
            return None;
        }

        let index = self.rng.gen_range(0..template_count);
        u32::try_from(index).ok().map(TemplateId::new)
    }
}

impl Default for LevelStreaming {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_runner_core::{PlacementError, PoolError};

    const FRAME: Duration = Duration::from_millis(20);

    fn view(edge: f32) -> StreamingView {
        StreamingView {
            player_position: Vec3::ZERO,
            leading_edge: Vec3::new(-edge, 0.0, 0.0),
            template_count: 3,
        }
    }

    #[test]
    fn first_tick_samples_and_extends() {
        let mut streaming = LevelStreaming::default();
        let mut out = Vec::new();

        streaming.handle(&[Event::TimeAdvanced { dt: FRAME }], view(0.0), &mut out);

        assert!(matches!(out.as_slice(), [Command::ExtendChain { .. }]));
        assert_eq!(streaming.active_passes(), 1);
    }

    #[test]
    fn satisfied_margin_enters_grace_then_signals_ready() {
        let mut streaming = LevelStreaming::new(Config {
            ready_grace: Duration::from_millis(40),
            ..Config::default()
        });
        let mut out = Vec::new();

        streaming.handle(&[Event::TimeAdvanced { dt: FRAME }], view(200.0), &mut out);
        assert_eq!(out, vec![Command::ReportProgress { percent: 1.0 }]);

        out.clear();
        streaming.handle(&[Event::TimeAdvanced { dt: FRAME }], view(200.0), &mut out);
        assert!(out.is_empty());

        streaming.handle(&[Event::TimeAdvanced { dt: FRAME }], view(200.0), &mut out);
        assert_eq!(out, vec![Command::MarkGenerationReady]);
        assert_eq!(streaming.active_passes(), 0);
    }

    #[test]
    fn rejected_segment_retires_extending_passes() {
        let mut streaming = LevelStreaming::default();
        let mut out = Vec::new();
        streaming.handle(&[Event::TimeAdvanced { dt: FRAME }], view(0.0), &mut out);
        let Some(Command::ExtendChain { template }) = out.pop() else {
            panic!("expected a chain extension, got {out:?}");
        };

        streaming.handle(
            &[Event::SegmentRejected {
                template,
                reason: PlacementError::Pool(PoolError::Exhausted { capacity: 3 }),
            }],
            view(0.0),
            &mut out,
        );

        assert!(out.is_empty());
        assert_eq!(streaming.active_passes(), 0);
    }

    #[test]
    fn template_choice_is_reproducible_for_a_seed() {
        let picks = |seed| {
            let mut streaming = LevelStreaming::new(Config {
                seed,
                ..Config::default()
            });
            (0..32)
                .filter_map(|_| streaming.pick_template(4))
                .collect::<Vec<_>>()
        };

        assert_eq!(picks(7), picks(7));
        assert!(picks(7).iter().all(|template| template.get() < 4));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = Config {
            sample_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
