use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, DefaultConfig};

const MAX_BACKUPS: usize = 5;

/// Owns the on-disk layout of `~/.macrocoach`.
pub struct StorageManager {
    app_dir: PathBuf,
    profile_file: PathBuf,
    goals_file: PathBuf,
}

impl StorageManager {
    pub fn new() -> Result<Self> {
        Ok(Self::with_root(config::app_dir()?))
    }

    pub fn with_root(app_dir: PathBuf) -> Self {
        let profile_file = app_dir.join("profile.json");
        let goals_file = app_dir.join("goals.json");

        Self {
            app_dir,
            profile_file,
            goals_file,
        }
    }

    pub fn initialize_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.app_dir)?;
        fs::create_dir_all(self.backup_dir())?;

        if !self.profile_file.exists() {
            self.write_json(&self.profile_file, &Value::Object(Default::default()))?;
        }

        if !self.goals_file.exists() {
            self.write_json(&self.goals_file, &Value::Array(Vec::new()))?;
        }

        let config_file = self.config_path();
        if !config_file.exists() {
            fs::write(&config_file, DefaultConfig::create_default_config_file())?;
        }

        Ok(())
    }

    /// Reads the stored profile; an absent file is an empty profile.
    pub fn read_profile(&self) -> Result<Value> {
        if !self.profile_file.exists() {
            return Ok(Value::Object(Default::default()));
        }

        self.read_json(&self.profile_file)
    }

    pub fn write_profile(&self, profile: &Value) -> Result<()> {
        self.backup_profile()?;
        self.write_json(&self.profile_file, profile)
    }

    pub fn read_goals(&self) -> Result<Vec<String>> {
        if !self.goals_file.exists() {
            return Ok(Vec::new());
        }

        let goals = self.read_json(&self.goals_file)?;
        serde_json::from_value(goals)
            .with_context(|| format!("{} is not a list of goals", self.goals_file.display()))
    }

    pub fn write_goals(&self, goals: &[String]) -> Result<()> {
        self.write_json(&self.goals_file, &serde_json::to_value(goals)?)
    }

    pub fn app_dir(&self) -> &PathBuf {
        &self.app_dir
    }

    pub fn profile_path(&self) -> &PathBuf {
        &self.profile_file
    }

    pub fn goals_path(&self) -> &PathBuf {
        &self.goals_file
    }

    pub fn notes_db_path(&self) -> PathBuf {
        self.app_dir.join("notes.db")
    }

    pub fn config_path(&self) -> PathBuf {
        self.app_dir.join("config.toml")
    }

    fn backup_dir(&self) -> PathBuf {
        self.app_dir.join("backups")
    }

    fn read_json(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
    }

    fn write_json(&self, path: &Path, value: &Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(value)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn backup_profile(&self) -> Result<()> {
        if !self.profile_file.exists() {
            return Ok(());
        }

        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir)?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_path = backup_dir.join(format!("profile_{timestamp}.json"));

        fs::copy(&self.profile_file, backup_path)?;

        self.cleanup_old_backups()?;

        Ok(())
    }

    fn cleanup_old_backups(&self) -> Result<()> {
        let mut backups: Vec<_> = fs::read_dir(self.backup_dir())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("profile_"))
            .collect();

        // Names embed the timestamp, so newest sorts last.
        backups.sort_by_key(|entry| entry.file_name());
        backups.reverse();

        for backup in backups.iter().skip(MAX_BACKUPS) {
            if let Err(e) = fs::remove_file(backup.path()) {
                log::warn!("Failed to remove old profile backup: {e}");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn storage() -> (TempDir, StorageManager) {
        let dir = TempDir::new().unwrap();
        let storage = StorageManager::with_root(dir.path().join(".macrocoach"));
        (dir, storage)
    }

    #[test]
    fn initialize_creates_layout() {
        let (_dir, storage) = storage();
        storage.initialize_directory().unwrap();

        assert!(storage.profile_path().exists());
        assert!(storage.goals_path().exists());
        assert!(storage.config_path().exists());
        assert_eq!(storage.read_profile().unwrap(), json!({}));
        assert!(storage.read_goals().unwrap().is_empty());
    }

    #[test]
    fn missing_files_read_as_empty() {
        let (_dir, storage) = storage();

        assert_eq!(storage.read_profile().unwrap(), json!({}));
        assert!(storage.read_goals().unwrap().is_empty());
    }

    #[test]
    fn profile_round_trips_with_key_order() {
        let (_dir, storage) = storage();
        let profile = json!({"zeta": 1, "alpha": {"nested": [1, 2]}});

        storage.write_profile(&profile).unwrap();
        let read = storage.read_profile().unwrap();

        let keys: Vec<&String> = read.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(read, profile);
    }

    #[test]
    fn overwriting_profile_keeps_limited_backups() {
        let (_dir, storage) = storage();

        for i in 0..8 {
            storage.write_profile(&json!({ "version": i })).unwrap();
        }

        let backups = fs::read_dir(storage.app_dir().join("backups"))
            .unwrap()
            .count();
        assert!(backups <= MAX_BACKUPS);
        assert_eq!(storage.read_profile().unwrap(), json!({"version": 7}));
    }

    #[test]
    fn goals_that_are_not_strings_are_rejected() {
        let (_dir, storage) = storage();
        fs::create_dir_all(storage.app_dir()).unwrap();
        fs::write(storage.goals_path(), "[1, 2]").unwrap();

        assert!(storage.read_goals().is_err());
    }
}
