use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

use crate::ai::Note;

/// A note as kept in the local notes database.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNote {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl StoredNote {
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    pub fn to_note(&self) -> Note {
        let mut extra = Map::new();
        extra.insert("id".to_string(), Value::from(self.id.to_string()));
        extra.insert(
            "created_at".to_string(),
            Value::from(self.created_at.to_rfc3339()),
        );

        Note {
            text: Some(self.text.clone()),
            extra,
        }
    }
}

pub struct NoteStore {
    connection: Connection,
}

impl NoteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let connection = Connection::open(db_path)?;

        connection.execute_batch(include_str!("../../sql/schema.sql"))?;

        Ok(Self { connection })
    }

    pub fn add(&self, text: &str) -> Result<StoredNote> {
        let note = StoredNote {
            id: Uuid::new_v4(),
            text: text.to_string(),
            created_at: Utc::now(),
        };

        self.connection.execute(
            "INSERT INTO notes (id, text, created_at) VALUES (?1, ?2, ?3)",
            params![
                note.id.to_string(),
                note.text,
                note.created_at.to_rfc3339()
            ],
        )?;

        Ok(note)
    }

    /// All notes, oldest first.
    pub fn list(&self) -> Result<Vec<StoredNote>> {
        let mut stmt = self
            .connection
            .prepare("SELECT id, text, created_at FROM notes ORDER BY seq ASC")?;

        let notes = stmt
            .query_map([], Self::note_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    /// Removes the note whose id equals or starts with `id`.
    ///
    /// The id may be given with or without dashes. Returns `false` when
    /// nothing matched. A prefix matching several notes is an error, as is
    /// an id that is empty or not made of hex digits and dashes.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let prefix = id.trim().to_lowercase();
        if prefix.is_empty() {
            bail!("A note id is required");
        }
        if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            bail!("'{id}' is not a note id");
        }

        let matches: i64 = self.connection.query_row(
            "SELECT COUNT(*) FROM notes WHERE substr(id, 1, length(?1)) = ?1 \
             OR substr(replace(id, '-', ''), 1, length(?1)) = ?1",
            params![prefix],
            |row| row.get(0),
        )?;

        match matches {
            0 => Ok(false),
            1 => {
                self.connection.execute(
                    "DELETE FROM notes WHERE substr(id, 1, length(?1)) = ?1 \
                     OR substr(replace(id, '-', ''), 1, length(?1)) = ?1",
                    params![prefix],
                )?;
                Ok(true)
            }
            n => bail!("Note id '{id}' is ambiguous ({n} notes match)"),
        }
    }

    pub fn clear(&self) -> Result<usize> {
        let removed = self.connection.execute("DELETE FROM notes", [])?;
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn note_from_row(row: &Row<'_>) -> rusqlite::Result<StoredNote> {
        let id: String = row.get(0)?;
        let text: String = row.get(1)?;
        let created_at: String = row.get(2)?;

        let id = Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);

        Ok(StoredNote {
            id,
            text,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, NoteStore) {
        let dir = TempDir::new().unwrap();
        let store = NoteStore::new(dir.path().join("notes.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn notes_list_in_insertion_order() {
        let (_dir, store) = store();
        store.add("first").unwrap();
        store.add("second").unwrap();
        store.add("third").unwrap();

        let texts: Vec<String> = store.list().unwrap().into_iter().map(|n| n.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn notes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.db");

        let added = NoteStore::new(&path).unwrap().add("knee pain").unwrap();
        let listed = NoteStore::new(&path).unwrap().list().unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, added.id);
        assert_eq!(listed[0].text, "knee pain");
    }

    #[test]
    fn remove_by_full_or_short_id() {
        let (_dir, store) = store();
        let a = store.add("a").unwrap();
        let b = store.add("b").unwrap();

        assert!(store.remove(&a.id.to_string()).unwrap());
        assert!(store.remove(&b.short_id()).unwrap());
        assert!(!store.remove("ffffffff").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn wildcards_and_blank_ids_remove_nothing() {
        let (_dir, store) = store();
        store.add("only note").unwrap();

        assert!(store.remove("%").is_err());
        assert!(store.remove("________").is_err());
        assert!(store.remove("").is_err());
        assert!(store.remove("   ").is_err());
        assert_eq!(store.count().unwrap(), 1);
    }

    fn insert_with_id(store: &NoteStore, id: &str, text: &str) {
        store
            .connection
            .execute(
                "INSERT INTO notes (id, text, created_at) VALUES (?1, ?2, ?3)",
                params![id, text, Utc::now().to_rfc3339()],
            )
            .unwrap();
    }

    #[test]
    fn shared_prefix_is_ambiguous() {
        let (_dir, store) = store();
        insert_with_id(&store, "abcd1234-0000-4000-8000-000000000001", "a");
        insert_with_id(&store, "abcd5678-0000-4000-8000-000000000002", "b");

        let err = store.remove("abcd").unwrap_err();
        assert!(err.to_string().contains("ambiguous"), "{err}");
        assert_eq!(store.count().unwrap(), 2);

        assert!(store.remove("abcd5").unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let (_dir, store) = store();
        store.add("a").unwrap();
        store.add("b").unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn stored_note_converts_to_prompt_note() {
        let (_dir, store) = store();
        let stored = store.add("vegetarian since May").unwrap();

        let note = stored.to_note();
        assert_eq!(note.text(), "vegetarian since May");
        assert_eq!(
            note.extra.get("id"),
            Some(&Value::from(stored.id.to_string()))
        );
    }
}
