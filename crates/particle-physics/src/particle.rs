//! Particle record and its persisted kinematic subset

use crate::color::{random_particle_color, Rgba};
use crate::constants::{DEFAULT_SPEED, RADIUS_MIN, RADIUS_SPREAD};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Canvas dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }
}

/// Position and velocity of a particle, the only part that survives a reload
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

/// A simulated point mass
///
/// Radius, mass, color and opacity are drawn once at construction and never
/// change afterwards; position and velocity are advanced every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    radius: f32,
    mass: f32,
    color: Rgba,
    opacity: f32,
}

impl Particle {
    /// Create a particle with a random appearance
    ///
    /// Without an explicit velocity each axis is drawn from `[-1, 1)`.
    pub fn new<R: Rng + ?Sized>(position: Vec2, velocity: Option<Vec2>, rng: &mut R) -> Self {
        let velocity = velocity.unwrap_or_else(|| {
            Vec2::new(
                (rng.random::<f32>() - 0.5) * 2.0 * DEFAULT_SPEED,
                (rng.random::<f32>() - 0.5) * 2.0 * DEFAULT_SPEED,
            )
        });
        let radius = RADIUS_MIN + rng.random::<f32>() * RADIUS_SPREAD;
        let color = random_particle_color(rng);
        let opacity = rng.random::<f32>() * 0.5 + 0.5;

        Self {
            position,
            velocity,
            radius,
            mass: radius,
            color,
            opacity,
        }
    }

    /// Rebuild a particle from persisted kinematics
    ///
    /// Only motion is restored; radius, mass and color are drawn afresh.
    pub fn from_kinematics<R: Rng + ?Sized>(data: Kinematics, rng: &mut R) -> Self {
        Self::new(
            Vec2::new(data.x, data.y),
            Some(Vec2::new(data.vx, data.vy)),
            rng,
        )
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Informational only, the drawn alpha comes from [`Particle::color`]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Accelerate by `force / mass`
    pub fn apply_force(&mut self, force: Vec2) {
        self.velocity += force / self.mass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mass_equals_radius() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let p = Particle::new(Vec2::ZERO, None, &mut rng);
            assert_eq!(p.mass(), p.radius());
            assert!(p.radius() >= RADIUS_MIN && p.radius() < RADIUS_MIN + RADIUS_SPREAD);
            assert!(p.opacity() >= 0.5 && p.opacity() < 1.0);
        }
    }

    #[test]
    fn test_default_velocity_range() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let p = Particle::new(Vec2::ZERO, None, &mut rng);
            assert!(p.velocity.x >= -1.0 && p.velocity.x < 1.0);
            assert!(p.velocity.y >= -1.0 && p.velocity.y < 1.0);
        }
    }

    #[test]
    fn test_kinematics_survive_rebuild() {
        let mut rng = StdRng::seed_from_u64(3);
        let k = Kinematics {
            x: 12.5,
            y: -40.0,
            vx: 0.25,
            vy: 3.0,
        };
        let p = Particle::from_kinematics(k, &mut rng);
        assert_eq!(p.kinematics(), k);
    }

    #[test]
    fn test_apply_force_scales_by_mass() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut p = Particle::new(Vec2::ZERO, Some(Vec2::ZERO), &mut rng);
        p.apply_force(Vec2::new(p.mass() * 2.0, 0.0));
        assert!((p.velocity.x - 2.0).abs() < 1e-5);
        assert_eq!(p.velocity.y, 0.0);
    }

    #[test]
    fn test_kinematics_json_field_names() {
        let k = Kinematics {
            x: 1.0,
            y: 2.0,
            vx: 3.0,
            vy: 4.0,
        };
        let json = serde_json::to_string(&k).unwrap();
        assert_eq!(json, r#"{"x":1.0,"y":2.0,"vx":3.0,"vy":4.0}"#);
    }
}
