use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::ai::Note;
use crate::profile::{NoteStore, StorageManager, StoredNote};

/// Profile, goals and notes for the local user.
pub struct ProfileManager {
    notes: NoteStore,
    storage: StorageManager,
}

impl ProfileManager {
    pub fn new() -> Result<Self> {
        Self::open(StorageManager::new()?)
    }

    pub fn open(storage: StorageManager) -> Result<Self> {
        fs::create_dir_all(storage.app_dir()).with_context(|| {
            format!("Failed to create {}", storage.app_dir().display())
        })?;
        let notes = NoteStore::new(storage.notes_db_path())?;

        Ok(Self { notes, storage })
    }

    pub fn initialize_directory(&self) -> Result<()> {
        info!("Initializing macrocoach directory structure");
        self.storage.initialize_directory()
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    // Profile

    pub fn profile(&self) -> Result<Value> {
        self.storage.read_profile()
    }

    /// Sets a dotted `key` to `raw`, parsed as JSON when possible.
    pub fn set_field(&self, key: &str, raw: &str) -> Result<Value> {
        let mut profile = self.profile()?;
        set_path(&mut profile, key, parse_value(raw))?;
        self.storage.write_profile(&profile)?;

        debug!("Set profile field {key}");
        Ok(profile)
    }

    pub fn unset_field(&self, key: &str) -> Result<bool> {
        let mut profile = self.profile()?;
        let removed = remove_path(&mut profile, key)?;
        if removed {
            self.storage.write_profile(&profile)?;
        }
        Ok(removed)
    }

    /// Replaces the profile with the contents of a JSON or TOML file.
    pub fn import_profile(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let profile: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?,
            _ => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        };

        if !profile.is_object() {
            bail!("A profile must be an object of attributes");
        }

        self.storage.write_profile(&profile)?;
        info!("Imported profile from {}", path.display());
        Ok(profile)
    }

    // Goals

    pub fn goals(&self) -> Result<Vec<String>> {
        self.storage.read_goals()
    }

    pub fn add_goal(&self, label: &str) -> Result<Vec<String>> {
        let mut goals = self.goals()?;
        goals.push(label.to_string());
        self.storage.write_goals(&goals)?;
        Ok(goals)
    }

    pub fn clear_goals(&self) -> Result<usize> {
        let cleared = self.goals()?.len();
        self.storage.write_goals(&[])?;
        Ok(cleared)
    }

    // Notes

    pub fn notes(&self) -> Result<Vec<StoredNote>> {
        self.notes.list()
    }

    /// Stored notes in the shape the prompt builder expects.
    pub fn prompt_notes(&self) -> Result<Vec<Note>> {
        Ok(self.notes()?.iter().map(StoredNote::to_note).collect())
    }

    pub fn add_note(&self, text: &str) -> Result<StoredNote> {
        self.notes.add(text)
    }

    pub fn remove_note(&self, id: &str) -> Result<bool> {
        self.notes.remove(id)
    }

    pub fn clear_notes(&self) -> Result<usize> {
        self.notes.clear()
    }

    pub fn note_count(&self) -> Result<usize> {
        self.notes.count()
    }
}

/// Interprets command-line input as JSON, or as a plain string otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        bail!("Invalid profile key '{key}'");
    }
    Ok(segments)
}

/// Sets `value` at a dotted path, creating intermediate objects.
pub fn set_path(root: &mut Value, key: &str, value: Value) -> Result<()> {
    let segments = split_key(key)?;
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Invalid profile key '{key}'"))?;

    if !root.is_object() {
        *root = Value::Object(Map::new());
    }

    let mut current = root;
    for segment in parents {
        let map = current
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("'{segment}' is not an object"))?;
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !current.is_object() {
            bail!("'{segment}' in '{key}' is not an object");
        }
    }

    match current.as_object_mut() {
        Some(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        None => bail!("'{key}' has no object to hold it"),
    }
}

/// Removes the value at a dotted path. Returns whether anything was removed.
pub fn remove_path(root: &mut Value, key: &str) -> Result<bool> {
    let segments = split_key(key)?;
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Invalid profile key '{key}'"))?;

    let mut current = root;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(next) => current = next,
            None => return Ok(false),
        }
    }

    Ok(current
        .as_object_mut()
        .map(|map| map.shift_remove(*last).is_some())
        .unwrap_or(false))
}
