//! Particle engine: seeding, per-frame update and draw, bursts and snapshots

use crate::autosave::AutosaveTimer;
use crate::error::SnapshotError;
use crate::params::EngineParams;
use crate::pointer::PointerTracker;
use crate::snapshot::{now_millis, Snapshot, SnapshotPersistence, SnapshotStore};
use crate::surface::DrawSurface;
use glam::Vec2;
use particle_physics::{
    integrate, pointer_force, Bounds, Particle, Rgba, BACKGROUND, CONNECTION,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::time::Instant;

/// Simulation time advanced per rendered frame
const FRAME_STEP: f32 = 1.0;

/// How the initial population was produced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seeding {
    Restored { count: usize },
    Defaults { count: usize },
}

/// The whole animation state: population, pointer, persistence and timers
pub struct ParticleSystem {
    params: EngineParams,
    bounds: Bounds,
    particles: Vec<Particle>,
    pointer: PointerTracker,
    persistence: SnapshotPersistence,
    autosave: AutosaveTimer,
    rng: StdRng,
    seeding: Seeding,
    running: bool,
    frame: u64,
}

impl ParticleSystem {
    /// Start the engine, restoring the stored snapshot when it is fresh
    pub fn new(params: EngineParams, bounds: Bounds, store: Box<dyn SnapshotStore>) -> Self {
        Self::with_rng(params, bounds, store, StdRng::from_os_rng())
    }

    pub fn with_rng(
        params: EngineParams,
        bounds: Bounds,
        store: Box<dyn SnapshotStore>,
        rng: StdRng,
    ) -> Self {
        Self::started_at(params, bounds, store, rng, now_millis())
    }

    /// Start the engine as if the wall clock read `now_ms`
    pub fn started_at(
        params: EngineParams,
        bounds: Bounds,
        store: Box<dyn SnapshotStore>,
        rng: StdRng,
        now_ms: u64,
    ) -> Self {
        let persistence =
            SnapshotPersistence::new(store, params.snapshot_limit, params.snapshot_freshness());

        let mut system = Self {
            autosave: AutosaveTimer::new(params.autosave_interval(), Instant::now()),
            params,
            bounds,
            particles: Vec::new(),
            pointer: PointerTracker::new(),
            persistence,
            rng,
            seeding: Seeding::Defaults { count: 0 },
            running: true,
            frame: 0,
        };

        system.seeding = match system.persistence.load(now_ms) {
            Ok(snapshot) => system.restore(&snapshot),
            Err(SnapshotError::Missing) => {
                log::debug!("No particle snapshot stored");
                system.seed_defaults()
            }
            Err(e @ SnapshotError::Stale { .. }) => {
                log::info!("Discarding particle snapshot: {}", e);
                system.seed_defaults()
            }
            Err(e) => {
                log::warn!("Failed to load particle state: {}", e);
                system.seed_defaults()
            }
        };

        match system.seeding {
            Seeding::Restored { count } => log::info!("✓ Restored {} particles", count),
            Seeding::Defaults { count } => log::info!("✓ Seeded {} particles", count),
        }

        system
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Seeding {
        if snapshot.canvas() != self.bounds {
            // Positions are kept as captured, even if that is now off-canvas
            log::info!(
                "Snapshot captured on a {}x{} canvas, restoring onto {}x{} unscaled",
                snapshot.canvas_width,
                snapshot.canvas_height,
                self.bounds.width,
                self.bounds.height
            );
        }

        let rng = &mut self.rng;
        self.particles = snapshot
            .particles
            .iter()
            .take(self.params.max_particles)
            .map(|k| Particle::from_kinematics(*k, rng))
            .collect();

        Seeding::Restored {
            count: self.particles.len(),
        }
    }

    /// Scatter the default population above the top edge
    fn seed_defaults(&mut self) -> Seeding {
        let count = self.params.initial_count.min(self.params.max_particles);
        self.particles.reserve(count);

        for _ in 0..count {
            let position = Vec2::new(
                self.rng.random::<f32>() * self.bounds.width,
                -self.rng.random::<f32>() * self.params.initial_drop_height,
            );
            let particle = Particle::new(position, None, &mut self.rng);
            self.particles.push(particle);
        }

        Seeding::Defaults { count }
    }

    /// Fade, connect, advance and draw one frame
    ///
    /// Returns `false` without touching the surface once the engine is stopped.
    pub fn tick<S: DrawSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        if !self.running {
            return false;
        }

        let size = surface.size();
        surface.fill_rect(
            Vec2::ZERO,
            Vec2::new(size.width, size.height),
            BACKGROUND.with_alpha(self.params.fade_alpha),
        );

        // Lines go first so particles are drawn over them
        if self.connections_active() {
            self.draw_connections(surface);
        }

        let pointer = self.pointer.state().active_position();
        let glow = self.params.glow_blur;

        for particle in &mut self.particles {
            integrate(particle, FRAME_STEP, self.bounds, &self.params.motion);

            if let Some(at) = pointer {
                particle.apply_force(pointer_force(particle.position, at, &self.params.pointer));
            }

            draw_particle(surface, particle, glow);
        }

        self.frame += 1;
        true
    }

    /// Whether this frame's population is small enough to draw connections
    pub fn connections_active(&self) -> bool {
        self.params.connections_enabled
            && self.particles.len() < self.params.connection_population_limit
    }

    /// Join every pair of particles closer than the connection distance
    ///
    /// Quadratic in the population, which is why [`ParticleSystem::tick`] only
    /// calls it below the population limit.
    pub fn draw_connections<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        let max_distance = self.params.connection_distance;

        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = a.position.distance(b.position);
                if distance < max_distance {
                    let alpha = (1.0 - distance / max_distance) * self.params.connection_alpha;
                    surface.stroke_line(
                        a.position,
                        b.position,
                        self.params.line_width,
                        CONNECTION.with_alpha(alpha),
                    );
                }
            }
        }
    }

    /// Release a radial burst at `at`, returning how many particles fit under the cap
    pub fn spawn_burst(&mut self, at: Vec2) -> usize {
        let count = self.params.burst_count;
        let (speed_min, speed_max) = (self.params.burst_speed_min, self.params.burst_speed_max);
        let mut added = 0;

        for i in 0..count {
            if self.particles.len() >= self.params.max_particles {
                continue;
            }

            let angle = TAU * i as f32 / count as f32;
            let speed = if speed_max > speed_min {
                self.rng.random_range(speed_min..speed_max)
            } else {
                speed_min
            };
            let jitter = Vec2::from_angle(self.rng.random::<f32>() * TAU)
                * self.rng.random::<f32>()
                * self.params.burst_jitter;

            let particle = Particle::new(
                at + jitter,
                Some(Vec2::from_angle(angle) * speed),
                &mut self.rng,
            );
            self.particles.push(particle);
            added += 1;
        }

        if added < count {
            log::debug!(
                "Particle cap {} reached, dropped {} of {} spawns",
                self.params.max_particles,
                count - added,
                count
            );
        }

        added
    }

    /// Persist the current population, stamped with the wall clock
    pub fn save_snapshot(&mut self) -> Result<(), SnapshotError> {
        self.save_snapshot_at(now_millis())
    }

    pub fn save_snapshot_at(&mut self, now_ms: u64) -> Result<(), SnapshotError> {
        self.persistence.save(&self.particles, self.bounds, now_ms)
    }

    /// Save, logging instead of returning any failure
    pub fn save_or_warn(&mut self) {
        if let Err(e) = self.save_snapshot() {
            log::warn!("Failed to save particle state: {}", e);
        }
    }

    /// Save if the autosave interval has elapsed; returns whether a save was attempted
    pub fn autosave(&mut self, now: Instant) -> bool {
        if self.autosave.poll(now) {
            self.save_or_warn();
            true
        } else {
            false
        }
    }

    pub fn next_autosave(&self) -> Instant {
        self.autosave.deadline()
    }

    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Stop animating; calling it again has no further effect
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            log::debug!("Particle engine stopped after {} frames", self.frame);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut PointerTracker {
        &mut self.pointer
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn seeding(&self) -> Seeding {
        self.seeding
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

/// Filled glowing circle; the glow is cleared afterwards so it cannot bleed into later draws
fn draw_particle<S: DrawSurface + ?Sized>(surface: &mut S, particle: &Particle, glow: f32) {
    let color = particle.color();
    surface.set_shadow(glow, color);
    surface.fill_circle(particle.position, particle.radius(), color);
    surface.set_shadow(0.0, Rgba::TRANSPARENT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MemoryStore;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn engine(params: EngineParams, seed: u64) -> ParticleSystem {
        ParticleSystem::with_rng(
            params,
            Bounds::new(800.0, 600.0),
            Box::new(MemoryStore::new()),
            StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn test_default_seeding_above_canvas() {
        let system = engine(EngineParams::default(), 1);

        assert_eq!(system.seeding(), Seeding::Defaults { count: 50 });
        for p in system.particles() {
            assert!(p.position.x >= 0.0 && p.position.x < 800.0);
            assert!(p.position.y <= 0.0 && p.position.y > -200.0);
        }
    }

    #[test]
    fn test_frame_draw_order() {
        let mut system = engine(EngineParams::default(), 2);
        let mut surface = RecordingSurface::new(system.bounds());
        assert!(system.tick(&mut surface));

        let commands = surface.commands();
        match &commands[0] {
            DrawCommand::FillRect { size, color, .. } => {
                assert_eq!(*size, Vec2::new(800.0, 600.0));
                assert_eq!(*color, BACKGROUND.with_alpha(0.3));
            }
            other => panic!("frame must start with the fade, got {other:?}"),
        }

        let first_circle = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::FillCircle { .. }))
            .unwrap();
        let last_line = commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::StrokeLine { .. }));
        if let Some(last_line) = last_line {
            assert!(last_line < first_circle);
        }
        assert_eq!(surface.circle_count(), 50);
    }

    #[test]
    fn test_glow_is_reset_after_each_particle() {
        let mut system = engine(EngineParams::default(), 3);
        let mut surface = RecordingSurface::new(system.bounds());
        system.tick(&mut surface);

        for command in surface.commands() {
            if let DrawCommand::FillCircle { color, shadow, .. } = command {
                assert_eq!(shadow.blur, 15.0);
                assert_eq!(shadow.color, *color);
            }
        }
        assert_eq!(surface.shadow().blur, 0.0);
    }

    #[test]
    fn test_connection_alpha_falls_with_distance() {
        let params = EngineParams {
            initial_count: 0,
            ..EngineParams::default()
        };
        let mut system = engine(params, 4);
        system.particles.push(Particle::new(Vec2::new(0.0, 0.0), Some(Vec2::ZERO), &mut system.rng));
        system.particles.push(Particle::new(Vec2::new(75.0, 0.0), Some(Vec2::ZERO), &mut system.rng));
        system.particles.push(Particle::new(Vec2::new(500.0, 0.0), Some(Vec2::ZERO), &mut system.rng));

        let mut surface = RecordingSurface::new(system.bounds());
        system.draw_connections(&mut surface);

        assert_eq!(surface.line_count(), 1);
        match &surface.commands()[0] {
            DrawCommand::StrokeLine { color, width, .. } => {
                assert!((color.a - 0.15).abs() < 1e-6);
                assert_eq!(*width, 1.0);
            }
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn test_pressed_pointer_exerts_no_force() {
        let params = EngineParams {
            initial_count: 0,
            motion: particle_physics::MotionParams {
                gravity: 0.0,
                ..Default::default()
            },
            ..EngineParams::default()
        };
        let mut system = engine(params, 5);
        system.particles.push(Particle::new(Vec2::new(400.0, 300.0), Some(Vec2::ZERO), &mut system.rng));
        system.pointer_mut().moved(Vec2::new(405.0, 300.0));
        system.pointer_mut().primary_pressed();

        let mut surface = RecordingSurface::new(system.bounds());
        system.tick(&mut surface);
        assert_eq!(system.particles()[0].velocity, Vec2::ZERO);

        system.pointer_mut().primary_released();
        system.tick(&mut surface);
        assert!(system.particles()[0].velocity.x < 0.0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut system = engine(EngineParams::default(), 6);
        let mut surface = RecordingSurface::new(system.bounds());

        system.stop();
        system.stop();
        assert!(!system.is_running());
        assert!(!system.tick(&mut surface));
        assert!(surface.commands().is_empty());
        assert_eq!(system.frame_count(), 0);
    }

    #[test]
    fn test_burst_respects_zero_width_speed_range() {
        let params = EngineParams {
            initial_count: 0,
            burst_count: 4,
            burst_speed_min: 2.0,
            burst_speed_max: 2.0,
            burst_jitter: 0.0,
            ..EngineParams::default()
        };
        let mut system = engine(params, 7);
        assert_eq!(system.spawn_burst(Vec2::new(50.0, 50.0)), 4);

        let v = system.particles()[1].velocity;
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 2.0).abs() < 1e-5);
        assert_eq!(system.particles()[1].position, Vec2::new(50.0, 50.0));
    }
}
