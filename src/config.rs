//! Startup settings, read from the JSON file named by `PARTICLES_CONFIG`

use anyhow::Context;
use particle_simulation::{EngineParams, FileStore, Revision};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "PARTICLES_CONFIG";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub revision: Revision,
    /// Full parameter set; overrides `revision` when present
    pub engine: Option<EngineParams>,
    /// Where snapshots are stored (defaults to a directory under the system temp dir)
    pub storage_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `PARTICLES_CONFIG`, falling back to defaults
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };

        match Self::from_file(Path::new(&path)) {
            Ok(settings) => {
                log::info!("✓ Loaded settings from {}", Path::new(&path).display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn engine_params(&self) -> EngineParams {
        self.engine.unwrap_or_else(|| self.revision.params())
    }

    pub fn store(&self) -> FileStore {
        match &self.storage_dir {
            Some(dir) => FileStore::new(dir.clone()),
            None => FileStore::in_temp_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_use_current_revision() {
        let settings = Settings::default();
        assert_eq!(settings.engine_params(), Revision::Current.params());
        assert_eq!(settings.store().dir(), FileStore::in_temp_dir().dir());
    }

    #[test]
    fn test_revision_selects_preset() {
        let file = write_settings(r#"{ "revision": "classic" }"#);
        let settings = Settings::from_file(file.path()).unwrap();

        assert_eq!(settings.revision, Revision::Classic);
        assert_eq!(settings.engine_params(), Revision::Classic.params());
    }

    #[test]
    fn test_engine_overrides_revision() {
        let file = write_settings(
            r#"{
                "revision": "classic",
                "engine": { "max_particles": 300, "burst_count": 5 },
                "storage_dir": "/var/tmp/particles"
            }"#,
        );
        let settings = Settings::from_file(file.path()).unwrap();
        let params = settings.engine_params();

        assert_eq!(params.max_particles, 300);
        assert_eq!(params.burst_count, 5);
        // Unlisted fields take the engine defaults, not the classic preset
        assert_eq!(params.autosave_interval_ms, EngineParams::default().autosave_interval_ms);
        assert_eq!(settings.store().dir(), Path::new("/var/tmp/particles"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = write_settings("{ revision: ");
        assert!(Settings::from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::from_file(&dir.path().join("absent.json")).is_err());
    }
}
