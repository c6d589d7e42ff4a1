//! # Particle Renderer
//!
//! wgpu-backed 2D canvas for the particle engine.

pub mod batch;
pub mod canvas;
pub mod error;
pub mod instance;

pub use batch::*;
pub use canvas::*;
pub use error::*;
pub use instance::*;
