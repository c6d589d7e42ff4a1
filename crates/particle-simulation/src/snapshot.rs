//! Best-effort persistence of the particle population
//!
//! A snapshot holds the kinematics of the first few hundred particles plus
//! the time and canvas size at capture. It is written to a single named slot
//! of a key-value store and read back once at start-up, provided it is recent
//! enough. Losing a snapshot is harmless: the engine simply seeds defaults.

use crate::error::SnapshotError;
use particle_physics::{Bounds, Kinematics, Particle};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Storage slot the engine reads and writes
pub const STATE_KEY: &str = "particleState";

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub particles: Vec<Kinematics>,
    /// Capture time, epoch milliseconds
    pub timestamp: u64,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl Snapshot {
    /// Capture at most `limit` particles, in population order
    pub fn capture(particles: &[Particle], limit: usize, bounds: Bounds, now_ms: u64) -> Self {
        Self {
            particles: particles
                .iter()
                .take(limit)
                .map(Particle::kinematics)
                .collect(),
            timestamp: now_ms,
            canvas_width: bounds.width,
            canvas_height: bounds.height,
        }
    }

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    pub fn canvas(&self) -> Bounds {
        Bounds::new(self.canvas_width, self.canvas_height)
    }
}

/// Named-slot string storage
pub trait SnapshotStore {
    fn read(&self, key: &str) -> io::Result<Option<String>>;

    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;

    /// Removing an absent key is not an error
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

/// In-memory store; clones share the same slots
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slots: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.borrow().contains_key(key)
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.slots
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the system temp directory, so state lives only as long as it does
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("particle-canvas"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash mid-write never leaves half a record
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(tmp, self.path(key))
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Saves and restores snapshots in one slot of a [`SnapshotStore`]
pub struct SnapshotPersistence {
    store: Box<dyn SnapshotStore>,
    key: String,
    limit: usize,
    freshness: Duration,
}

impl SnapshotPersistence {
    pub fn new(store: Box<dyn SnapshotStore>, limit: usize, freshness: Duration) -> Self {
        Self {
            store,
            key: STATE_KEY.to_owned(),
            limit,
            freshness,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(
        &mut self,
        particles: &[Particle],
        bounds: Bounds,
        now_ms: u64,
    ) -> Result<(), SnapshotError> {
        let snapshot = Snapshot::capture(particles, self.limit, bounds, now_ms);
        let encoded = serde_json::to_string(&snapshot)?;
        self.store.write(&self.key, &encoded)?;
        Ok(())
    }

    /// Read the stored snapshot if it is younger than the freshness window
    ///
    /// Stale and unparsable records are removed from storage.
    pub fn load(&mut self, now_ms: u64) -> Result<Snapshot, SnapshotError> {
        let raw = self.store.read(&self.key)?.ok_or(SnapshotError::Missing)?;

        let snapshot: Snapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.discard();
                return Err(e.into());
            }
        };

        let age_ms = snapshot.age_ms(now_ms);
        let limit_ms = self.freshness.as_millis() as u64;
        if age_ms > limit_ms {
            self.discard();
            return Err(SnapshotError::Stale { age_ms, limit_ms });
        }

        Ok(snapshot)
    }

    fn discard(&mut self) {
        if let Err(e) = self.store.remove(&self.key) {
            log::warn!("Failed to remove snapshot '{}': {}", self.key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

    fn population(n: usize) -> Vec<Particle> {
        let mut rng = StdRng::seed_from_u64(99);
        (0..n)
            .map(|i| {
                Particle::new(
                    Vec2::new(i as f32, i as f32 * 2.0),
                    Some(Vec2::new(0.5, -0.5)),
                    &mut rng,
                )
            })
            .collect()
    }

    fn persistence(store: &MemoryStore) -> SnapshotPersistence {
        SnapshotPersistence::new(Box::new(store.clone()), 200, FIVE_MINUTES)
    }

    #[test]
    fn test_capture_is_capped() {
        let particles = population(250);
        let snapshot = Snapshot::capture(&particles, 200, Bounds::new(800.0, 600.0), 5);

        assert_eq!(snapshot.particles.len(), 200);
        assert_eq!(snapshot.particles[199], particles[199].kinematics());
    }

    #[test]
    fn test_record_format() {
        let particles = population(1);
        let snapshot = Snapshot::capture(&particles, 200, Bounds::new(800.0, 600.0), 42);
        let value: serde_json::Value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["canvasWidth"], 800.0);
        assert_eq!(value["canvasHeight"], 600.0);
        assert_eq!(value["particles"][0]["vx"], 0.5);
    }

    #[test]
    fn test_accepts_integer_canvas_size() {
        let raw = r#"{"particles":[{"x":1,"y":2,"vx":3,"vy":4}],"timestamp":10,"canvasWidth":800,"canvasHeight":600}"#;
        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.canvas(), Bounds::new(800.0, 600.0));
        assert_eq!(snapshot.particles[0].vy, 4.0);
    }

    #[test]
    fn test_round_trip_within_window() {
        let store = MemoryStore::new();
        let mut persistence = persistence(&store);
        let particles = population(30);

        persistence
            .save(&particles, Bounds::new(640.0, 480.0), 1_000)
            .unwrap();
        let snapshot = persistence.load(1_000 + 60_000).unwrap();

        let expected: Vec<Kinematics> = particles.iter().map(Particle::kinematics).collect();
        assert_eq!(snapshot.particles, expected);
        assert!(store.contains(STATE_KEY));
    }

    #[test]
    fn test_custom_slot() {
        let store = MemoryStore::new();
        let mut persistence = persistence(&store).with_key("demoState");
        assert_eq!(persistence.key(), "demoState");

        persistence
            .save(&population(2), Bounds::new(100.0, 100.0), 0)
            .unwrap();
        assert!(store.contains("demoState"));
        assert!(!store.contains(STATE_KEY));
    }

    #[test]
    fn test_missing_record() {
        let store = MemoryStore::new();
        let mut persistence = persistence(&store);
        assert!(matches!(persistence.load(0), Err(SnapshotError::Missing)));
    }

    #[test]
    fn test_stale_record_is_removed() {
        let store = MemoryStore::new();
        let mut persistence = persistence(&store);
        persistence
            .save(&population(3), Bounds::new(100.0, 100.0), 0)
            .unwrap();

        let six_minutes = 6 * 60 * 1000;
        match persistence.load(six_minutes) {
            Err(SnapshotError::Stale { age_ms, .. }) => assert_eq!(age_ms, six_minutes),
            other => panic!("expected stale snapshot, got {other:?}"),
        }
        assert!(!store.contains(STATE_KEY));
    }

    #[test]
    fn test_malformed_record_is_removed() {
        let mut store = MemoryStore::new();
        store.write(STATE_KEY, "{not json").unwrap();
        let mut persistence = persistence(&store);

        assert!(matches!(
            persistence.load(0),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(!store.contains(STATE_KEY));
    }

    #[test]
    fn test_file_store_slots() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("state"));

        assert_eq!(store.read(STATE_KEY).unwrap(), None);
        store.write(STATE_KEY, "{}").unwrap();
        assert_eq!(store.read(STATE_KEY).unwrap().as_deref(), Some("{}"));

        store.remove(STATE_KEY).unwrap();
        store.remove(STATE_KEY).unwrap();
        assert_eq!(store.read(STATE_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut persistence = SnapshotPersistence::new(
            Box::new(FileStore::new(dir.path())),
            200,
            FIVE_MINUTES,
        );
        let particles = population(5);

        persistence
            .save(&particles, Bounds::new(300.0, 200.0), 500)
            .unwrap();
        let snapshot = persistence.load(600).unwrap();
        assert_eq!(snapshot.particles.len(), 5);
        assert_eq!(snapshot.particles[4], particles[4].kinematics());
    }
}
