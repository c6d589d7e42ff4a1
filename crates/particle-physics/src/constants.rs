//! Default tuning constants for the canvas simulation
//!
//! All distances are in canvas pixels and all rates are per rendered frame,
//! so a simulation step of `dt = 1.0` advances exactly one frame.

/// Downward acceleration added to the vertical velocity every frame
pub const GRAVITY: f32 = 0.1;

/// Per-frame velocity retention (air resistance)
pub const DAMPING: f32 = 0.99;

/// Restitution when hitting the left or right wall
pub const WALL_BOUNCE: f32 = 0.85;

/// Restitution when hitting the floor
pub const FLOOR_BOUNCE: f32 = 0.95;

/// Horizontal velocity retained on floor contact
pub const GROUND_FRICTION: f32 = 0.7;

/// Radius of the pointer's repulsion field
pub const POINTER_RADIUS: f32 = 100.0;

/// Force scale of the pointer field at its center
pub const POINTER_STRENGTH: f32 = 100.0;

// Particle appearance, randomised per particle
/// Smallest particle radius
pub const RADIUS_MIN: f32 = 1.0;

/// Width of the radius range, radius is drawn from `[RADIUS_MIN, RADIUS_MIN + RADIUS_SPREAD)`
pub const RADIUS_SPREAD: f32 = 2.0;

/// Default per-axis velocity magnitude for particles created without one
pub const DEFAULT_SPEED: f32 = 1.0;

/// Blur radius of the glow drawn around each particle
pub const GLOW_BLUR: f32 = 15.0;
