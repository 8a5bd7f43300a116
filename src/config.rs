//! JSON file persistence for pool settings.
//!
//! [`SettingsFile`] is the external configuration loader the pool consumes
//! its [`Settings`] from: read the file at startup, hand the value to
//! [`crate::PoolManager::replace_settings`], and the pool never touches the
//! filesystem itself. Backup/restore keep a `<path>~` sibling so a bad edit
//! can be rolled back.

use crate::settings::Settings;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no settings file path configured")]
    MissingPath,

    #[error("failed to access settings file")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid JSON")]
    Json(#[from] serde_json::Error),
}

/// Reads and writes [`Settings`] as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from the file.
    pub fn read(&self) -> Result<Settings, ConfigError> {
        self.read_from(&self.checked_path()?)
    }

    /// Persist settings to the file.
    pub fn write(&self, settings: &Settings) -> Result<(), ConfigError> {
        self.write_to(&self.checked_path()?, settings)
    }

    /// Save a copy of the current settings next to the main file.
    pub fn backup(&self, settings: &Settings) -> Result<(), ConfigError> {
        self.write_to(&self.backup_path()?, settings)
    }

    /// Bring the backup copy back: load it, rewrite the main file with it,
    /// and return the restored settings.
    pub fn restore(&self) -> Result<Settings, ConfigError> {
        let settings = self.read_from(&self.backup_path()?)?;
        self.write_to(&self.checked_path()?, &settings)?;
        Ok(settings)
    }

    fn read_from(&self, path: &Path) -> Result<Settings, ConfigError> {
        let buf = fs::read(path)?;
        let settings = serde_json::from_slice(&buf)?;
        debug!(path = %path.display(), "loaded pool settings");
        Ok(settings)
    }

    fn write_to(&self, path: &Path, settings: &Settings) -> Result<(), ConfigError> {
        let buf = serde_json::to_vec_pretty(settings)?;
        fs::write(path, buf)?;
        debug!(path = %path.display(), "wrote pool settings");
        Ok(())
    }

    fn checked_path(&self) -> Result<PathBuf, ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath);
        }
        Ok(self.path.clone())
    }

    fn backup_path(&self) -> Result<PathBuf, ConfigError> {
        let mut name = OsString::from(self.checked_path()?);
        name.push("~");
        Ok(PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ConnectionDescriptor;
    use serde_json::json;

    fn sample_settings() -> Settings {
        let mut settings = Settings::default();
        settings.pool.insert(
            "main".into(),
            ConnectionDescriptor {
                driver: "sqlite".into(),
                connection_string_params: [("path".to_string(), json!("app.db"))]
                    .into_iter()
                    .collect(),
                after_connection: vec![],
            },
        );
        settings
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = SettingsFile::new(dir.path().join("settings.json"));

        let settings = sample_settings();
        file.write(&settings).unwrap();
        let loaded = file.read().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let file = SettingsFile::new("");
        assert!(matches!(
            file.read(),
            Err(ConfigError::MissingPath)
        ));
        assert!(matches!(
            file.write(&Settings::default()),
            Err(ConfigError::MissingPath)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = SettingsFile::new(dir.path().join("absent.json"));
        assert!(matches!(file.read(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let file = SettingsFile::new(&path);
        assert!(matches!(file.read(), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_backup_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let file = SettingsFile::new(&path);

        let good = sample_settings();
        file.write(&good).unwrap();
        file.backup(&good).unwrap();

        // Clobber the main file, then roll back from the backup.
        file.write(&Settings::default()).unwrap();
        let restored = file.restore().unwrap();
        assert_eq!(restored, good);
        assert_eq!(file.read().unwrap(), good);
    }
}
