//! # Particle Physics
//!
//! Point-mass particles for a decorative 2D canvas: gravity, air drag,
//! wall and floor bounces, and a repulsive pointer field.

pub mod color;
pub mod constants;
pub mod forces;
pub mod particle;

pub use color::*;
pub use constants::*;
pub use forces::*;
pub use particle::*;
