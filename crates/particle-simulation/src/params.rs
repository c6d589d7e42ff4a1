//! Engine parameters for runtime tuning

use particle_physics::{MotionParams, PointerField, GLOW_BLUR};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    // Physics
    pub motion: MotionParams,
    pub pointer: PointerField,

    // Population
    /// Particles seeded when no snapshot can be restored
    pub initial_count: usize,
    /// Default particles start up to this far above the top edge
    pub initial_drop_height: f32,
    /// Hard cap on live particles, spawns beyond it are dropped
    pub max_particles: usize,

    // Spawn bursts
    pub burst_count: usize,
    pub burst_speed_min: f32,
    pub burst_speed_max: f32,
    /// Radius of the disc around the click point that spawns are scattered in
    pub burst_jitter: f32,

    // Rendering
    pub connections_enabled: bool,
    /// Connections are only drawn while the population is below this
    pub connection_population_limit: usize,
    pub connection_distance: f32,
    pub connection_alpha: f32,
    pub line_width: f32,
    /// Alpha of the background wash painted each frame (trail length)
    pub fade_alpha: f32,
    pub glow_blur: f32,

    // Persistence
    pub snapshot_limit: usize,
    pub snapshot_freshness_ms: u64,
    pub autosave_interval_ms: u64,
}

impl EngineParams {
    pub fn snapshot_freshness(&self) -> Duration {
        Duration::from_millis(self.snapshot_freshness_ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms)
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            motion: MotionParams::default(),
            pointer: PointerField::default(),

            initial_count: 50,
            initial_drop_height: 200.0,
            max_particles: 5000,

            burst_count: 20,
            burst_speed_min: 1.0,
            burst_speed_max: 3.0,
            burst_jitter: 10.0,

            connections_enabled: true,
            connection_population_limit: 150,
            connection_distance: 150.0,
            connection_alpha: 0.3,
            line_width: 1.0,
            fade_alpha: 0.3,
            glow_blur: GLOW_BLUR,

            snapshot_limit: 200,
            snapshot_freshness_ms: 5 * 60 * 1000,
            autosave_interval_ms: 1000,
        }
    }
}

/// Named tuning revisions of the engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    /// Lively floor bounce with heavy ground friction
    #[default]
    Current,
    /// Softer symmetric bounces, larger and faster bursts, slower autosave
    Classic,
}

impl Revision {
    pub fn params(self) -> EngineParams {
        match self {
            Revision::Current => EngineParams::default(),
            Revision::Classic => {
                let defaults = EngineParams::default();
                EngineParams {
                    motion: MotionParams {
                        wall_bounce: 0.8,
                        floor_bounce: 0.8,
                        ground_friction: 0.9,
                        ..defaults.motion
                    },
                    burst_count: 30,
                    burst_speed_min: 2.0,
                    burst_speed_max: 5.0,
                    autosave_interval_ms: 2000,
                    ..defaults
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: EngineParams =
            serde_json::from_str(r#"{ "max_particles": 10, "motion": { "gravity": 0.5 } }"#)
                .unwrap();

        assert_eq!(params.max_particles, 10);
        assert_eq!(params.motion.gravity, 0.5);
        assert_eq!(params.motion.damping, MotionParams::default().damping);
        assert_eq!(params.burst_count, EngineParams::default().burst_count);
    }

    #[test]
    fn test_revisions_differ_only_in_tuning() {
        let current = Revision::Current.params();
        let classic = Revision::Classic.params();

        assert_eq!(current, EngineParams::default());
        assert_ne!(current.burst_count, classic.burst_count);
        assert_eq!(current.max_particles, classic.max_particles);
        assert_eq!(current.snapshot_limit, classic.snapshot_limit);
    }

    #[test]
    fn test_revision_names() {
        let r: Revision = serde_json::from_str(r#""classic""#).unwrap();
        assert_eq!(r, Revision::Classic);
    }
}
