//! Per-frame motion: gravity, drag, boundary bounces and the pointer field

use crate::constants::*;
use crate::particle::{Bounds, Particle};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Coefficients of the per-frame integration step
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    pub gravity: f32,
    pub damping: f32,
    pub wall_bounce: f32,
    pub floor_bounce: f32,
    pub ground_friction: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            damping: DAMPING,
            wall_bounce: WALL_BOUNCE,
            floor_bounce: FLOOR_BOUNCE,
            ground_friction: GROUND_FRICTION,
        }
    }
}

/// Repulsion field centered on the pointer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerField {
    pub radius: f32,
    /// Per-axis force scale at the field center
    pub strength: Vec2,
}

impl Default for PointerField {
    fn default() -> Self {
        Self {
            radius: POINTER_RADIUS,
            strength: Vec2::splat(POINTER_STRENGTH),
        }
    }
}

/// Advance one particle by `dt` frames and resolve boundary contact
pub fn integrate(particle: &mut Particle, dt: f32, bounds: Bounds, motion: &MotionParams) {
    particle.velocity.y += motion.gravity * dt;
    particle.position += particle.velocity * dt;
    particle.velocity *= motion.damping.powf(dt);

    resolve_boundaries(particle, bounds, motion);
}

/// Clamp to the side walls and the floor, bouncing off each
///
/// The top edge is open so particles can fall in from above the canvas.
pub fn resolve_boundaries(particle: &mut Particle, bounds: Bounds, motion: &MotionParams) {
    let r = particle.radius();

    if particle.position.x - r < 0.0 {
        particle.position.x = r;
        particle.velocity.x *= -motion.wall_bounce;
    } else if particle.position.x + r > bounds.width {
        particle.position.x = bounds.width - r;
        particle.velocity.x *= -motion.wall_bounce;
    }

    if particle.position.y + r > bounds.height {
        particle.position.y = bounds.height - r;
        particle.velocity.y *= -motion.floor_bounce;
        particle.velocity.x *= motion.ground_friction;
    }
}

/// Force exerted by the pointer at `pointer` on a particle at `position`
///
/// Magnitude falls linearly from 1 at the pointer to 0 at the field radius and
/// points away from the pointer. A particle exactly on the pointer is pushed
/// along +x.
pub fn pointer_force(position: Vec2, pointer: Vec2, field: &PointerField) -> Vec2 {
    let offset = position - pointer;
    let distance = offset.length();

    if distance >= field.radius {
        return Vec2::ZERO;
    }

    let magnitude = (field.radius - distance) / field.radius;
    let direction = offset.try_normalize().unwrap_or(Vec2::X);

    direction * magnitude * field.strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn particle_at(rng: &mut StdRng, position: Vec2, velocity: Vec2) -> Particle {
        Particle::new(position, Some(velocity), rng)
    }

    #[test]
    fn test_free_fall_step() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut p = particle_at(&mut rng, Vec2::new(50.0, 50.0), Vec2::ZERO);
        let motion = MotionParams::default();
        integrate(&mut p, 1.0, Bounds::new(100.0, 100.0), &motion);

        assert!((p.position.y - 50.1).abs() < 1e-5);
        assert!((p.velocity.y - 0.1 * 0.99).abs() < 1e-6);
        assert_eq!(p.position.x, 50.0);
    }

    #[test]
    fn test_left_wall_bounce() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut p = particle_at(&mut rng, Vec2::new(1.0, 50.0), Vec2::new(-5.0, 0.0));
        let motion = MotionParams::default();
        integrate(&mut p, 1.0, Bounds::new(100.0, 100.0), &motion);

        assert_eq!(p.position.x, p.radius());
        assert!(p.velocity.x > 0.0);
        assert!((p.velocity.x - 5.0 * 0.99 * motion.wall_bounce).abs() < 1e-4);
    }

    #[test]
    fn test_floor_bounce_applies_friction() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut p = particle_at(&mut rng, Vec2::new(50.0, 99.0), Vec2::new(2.0, 4.0));
        let motion = MotionParams::default();
        integrate(&mut p, 1.0, Bounds::new(100.0, 100.0), &motion);

        assert_eq!(p.position.y, 100.0 - p.radius());
        assert!(p.velocity.y < 0.0);
        assert!((p.velocity.x - 2.0 * 0.99 * motion.ground_friction).abs() < 1e-4);
    }

    #[test]
    fn test_top_edge_is_open() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut p = particle_at(&mut rng, Vec2::new(50.0, -150.0), Vec2::new(0.0, -3.0));
        integrate(&mut p, 1.0, Bounds::new(100.0, 100.0), &MotionParams::default());

        assert!(p.position.y < -150.0);
        assert!(p.velocity.y < 0.0);
    }

    #[test]
    fn test_bounds_hold_after_every_step() {
        let mut rng = StdRng::seed_from_u64(14);
        let bounds = Bounds::new(320.0, 240.0);
        let motion = MotionParams::default();
        let mut particles: Vec<Particle> = (0..200)
            .map(|_| {
                let pos = Vec2::new(
                    rng.random::<f32>() * bounds.width,
                    rng.random::<f32>() * bounds.height,
                );
                let vel = Vec2::new(
                    rng.random_range(-40.0..40.0),
                    rng.random_range(-40.0..40.0),
                );
                particle_at(&mut rng, pos, vel)
            })
            .collect();

        for _ in 0..500 {
            for p in &mut particles {
                integrate(p, 1.0, bounds, &motion);
                let r = p.radius();
                assert!(p.position.x >= r && p.position.x <= bounds.width - r);
                assert!(p.position.y <= bounds.height - r);
            }
        }
    }

    #[test]
    fn test_pointer_force_zero_at_field_edge() {
        let field = PointerField::default();
        let force = pointer_force(Vec2::new(field.radius, 0.0), Vec2::ZERO, &field);
        assert_eq!(force, Vec2::ZERO);

        let outside = pointer_force(Vec2::new(0.0, 250.0), Vec2::ZERO, &field);
        assert_eq!(outside, Vec2::ZERO);
    }

    #[test]
    fn test_pointer_force_maximal_at_center() {
        let field = PointerField::default();
        let center = pointer_force(Vec2::new(30.0, 30.0), Vec2::new(30.0, 30.0), &field);
        assert_eq!(center, Vec2::new(field.strength.x, 0.0));

        let near = pointer_force(Vec2::new(40.0, 30.0), Vec2::new(30.0, 30.0), &field);
        assert!(near.length() < center.length());
    }

    #[test]
    fn test_pointer_force_repels() {
        let field = PointerField::default();
        let pointer = Vec2::new(100.0, 100.0);
        let force = pointer_force(Vec2::new(100.0, 150.0), pointer, &field);

        assert!(force.y > 0.0);
        assert!(force.x.abs() < 1e-4);
        assert!((force.y - 0.5 * field.strength.y).abs() < 1e-3);
    }
}
