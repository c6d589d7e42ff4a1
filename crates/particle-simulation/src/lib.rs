//! # Particle Simulation Engine
//!
//! Owns the live particle population, advances and draws it once per frame,
//! reacts to the pointer, spawns bursts on demand and persists a snapshot of
//! the population so a restart can pick up where it left off.

pub mod autosave;
pub mod error;
pub mod params;
pub mod pointer;
pub mod simulation;
pub mod snapshot;
pub mod surface;

pub use autosave::*;
pub use error::*;
pub use params::*;
pub use pointer::*;
pub use simulation::*;
pub use snapshot::*;
pub use surface::*;
