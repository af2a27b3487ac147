//! Tuning for the authoritative world.

use glam::Vec3;
use lane_runner_core::{ConfigError, Lane, ObstacleKind, SegmentTemplate, TemplateId};
use serde::{Deserialize, Serialize};

use crate::pool::PoolPolicy;

const DEFAULT_LANE_SIZE: f32 = 2.5;
const DEFAULT_GRAVITY: f32 = 9.81;
const DEFAULT_PLAYER_MASS: f32 = 1.0;
const DEFAULT_RETENTION_DISTANCE: f32 = 40.0;
const DEFAULT_LANDING_TOLERANCE: f32 = 0.5;
const DEFAULT_KILL_HEIGHT: f32 = -10.0;
const PICKUP_POINTS: u32 = 10;

/// Configuration parameters required to construct the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Distance between adjacent lane centres.
    pub lane_size: f32,
    /// Magnitude of the downward gravitational acceleration.
    pub gravity: f32,
    /// Mass of the player body.
    pub player_mass: f32,
    /// Position the player occupies on spawn and after every scene reset.
    pub spawn_position: Vec3,
    /// Anchor the first segment of the chain starts at. Its height is the ground level.
    pub generation_origin: Vec3,
    /// How far behind the player a segment's end anchor may fall before it is recycled.
    pub retention_distance: f32,
    /// Depth below the ground within which a falling player still lands.
    pub landing_tolerance: f32,
    /// Height below which the player is considered lost.
    pub kill_height: f32,
    /// Half extents of the trigger box around every obstacle.
    pub trigger_half_extents: Vec3,
    /// Exhaustion policy of the per-template segment pools.
    pub segment_pool: PoolPolicy,
    /// Exhaustion policy of the obstacle pool.
    pub obstacle_pool: PoolPolicy,
    /// Segment blueprints the generator chooses from.
    pub templates: Vec<SegmentTemplate>,
}

impl WorldConfig {
    /// Checks that the configuration describes a playable level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("lane_size", self.lane_size)?;
        ensure_positive("gravity", self.gravity)?;
        ensure_positive("player_mass", self.player_mass)?;
        ensure_positive("retention_distance", self.retention_distance)?;
        ensure_not_negative("landing_tolerance", self.landing_tolerance)?;
        ensure_not_negative("trigger_half_extents.x", self.trigger_half_extents.x)?;
        ensure_not_negative("trigger_half_extents.y", self.trigger_half_extents.y)?;
        ensure_not_negative("trigger_half_extents.z", self.trigger_half_extents.z)?;
        let ground = self.generation_origin.y;
        if self.kill_height.is_nan() || self.kill_height >= ground {
            return Err(ConfigError::KillHeightAboveGround {
                kill_height: self.kill_height,
                ground,
            });
        }
        if self.templates.is_empty() {
            return Err(ConfigError::NoTemplates);
        }

        for (index, template) in self.templates.iter().enumerate() {
            ensure_positive("templates.length", template.length)?;
            for slot in &template.obstacles {
                if slot.offset < 0.0 || slot.offset > template.length {
                    return Err(ConfigError::ObstacleOutsideSegment {
                        template: TemplateId::new(index as u32),
                        offset: slot.offset,
                        length: template.length,
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            lane_size: DEFAULT_LANE_SIZE,
            gravity: DEFAULT_GRAVITY,
            player_mass: DEFAULT_PLAYER_MASS,
            spawn_position: Vec3::ZERO,
            generation_origin: Vec3::new(5.0, 0.0, 0.0),
            retention_distance: DEFAULT_RETENTION_DISTANCE,
            landing_tolerance: DEFAULT_LANDING_TOLERANCE,
            kill_height: DEFAULT_KILL_HEIGHT,
            trigger_half_extents: Vec3::new(0.6, 1.0, 0.6),
            segment_pool: PoolPolicy::Grow,
            obstacle_pool: PoolPolicy::Grow,
            templates: default_templates(),
        }
    }
}

fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn ensure_not_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn default_templates() -> Vec<SegmentTemplate> {
    let pickup = ObstacleKind::ScorePickup {
        points: PICKUP_POINTS,
    };
    vec![
        SegmentTemplate::new(30.0)
            .with_obstacle(10.0, Lane::CENTER, pickup)
            .with_obstacle(20.0, Lane::CENTER, pickup),
        SegmentTemplate::new(30.0)
            .with_obstacle(15.0, Lane::MIN, ObstacleKind::Hazard)
            .with_obstacle(15.0, Lane::MAX, pickup),
        SegmentTemplate::new(30.0)
            .with_obstacle(15.0, Lane::MAX, ObstacleKind::Hazard)
            .with_obstacle(15.0, Lane::MIN, pickup),
        SegmentTemplate::new(40.0)
            .with_obstacle(10.0, Lane::CENTER, ObstacleKind::Hazard)
            .with_obstacle(20.0, Lane::MIN, pickup)
            .with_obstacle(20.0, Lane::MAX, pickup)
            .with_obstacle(30.0, Lane::MIN, ObstacleKind::Hazard),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        assert_eq!(WorldConfig::default().validate(), Ok(()));
    }

    #[test]
    fn missing_templates_are_rejected() {
        let config = WorldConfig {
            templates: Vec::new(),
            ..WorldConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoTemplates));
    }

    #[test]
    fn zero_length_segment_is_rejected() {
        let config = WorldConfig {
            templates: vec![SegmentTemplate::new(0.0)],
            ..WorldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "templates.length",
                ..
            })
        ));
    }

    #[test]
    fn negative_landing_tolerance_is_rejected() {
        let config = WorldConfig {
            landing_tolerance: -0.1,
            ..WorldConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "landing_tolerance",
                value: -0.1,
            })
        );
    }

    #[test]
    fn negative_trigger_extent_is_rejected() {
        let config = WorldConfig {
            trigger_half_extents: Vec3::new(0.6, -1.0, 0.6),
            ..WorldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "trigger_half_extents.y",
                ..
            })
        ));
    }

    #[test]
    fn kill_height_must_lie_below_ground() {
        let config = WorldConfig {
            generation_origin: Vec3::new(5.0, 2.0, 0.0),
            kill_height: 2.0,
            ..WorldConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::KillHeightAboveGround {
                kill_height: 2.0,
                ground: 2.0,
            })
        );
    }

    #[test]
    fn obstacle_beyond_segment_end_is_rejected() {
        let config = WorldConfig {
            templates: vec![SegmentTemplate::new(10.0).with_obstacle(
                12.0,
                Lane::CENTER,
                ObstacleKind::Hazard,
            )],
            ..WorldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ObstacleOutsideSegment { .. })
        ));
    }
}
