use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Note;
use super::envelope::{GeneratedNote, ImageAnalysis};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("note store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("note {0} not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Notes kept in a single pretty-printed JSON file.
///
/// Every operation is scoped to one owner; notes of other owners are
/// invisible. The file is read on every call, so several processes can
/// share it as long as they do not write concurrently.
#[derive(Debug, Clone)]
pub struct NoteStore {
    path: PathBuf,
}

impl NoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Note>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, notes: &[Note]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(notes)?)?;
        Ok(())
    }

    /// Notes of `owner`, newest first.
    pub fn list(&self, owner: &str) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .load()?
            .into_iter()
            .filter(|n| n.owner_id == owner)
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    pub fn get(&self, owner: &str, id: &str) -> Result<Note> {
        self.load()?
            .into_iter()
            .find(|n| n.owner_id == owner && n.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn insert(&self, note: &Note) -> Result<()> {
        let mut notes = self.load()?;
        notes.push(note.clone());
        self.save(&notes)?;
        tracing::debug!(id = %note.id, "note stored");
        Ok(())
    }

    /// Replace the stored note with the same owner and id.
    pub fn update(&self, note: &Note) -> Result<()> {
        let mut notes = self.load()?;
        let slot = notes
            .iter_mut()
            .find(|n| n.owner_id == note.owner_id && n.id == note.id)
            .ok_or_else(|| StoreError::NotFound(note.id.clone()))?;
        *slot = note.clone();
        self.save(&notes)
    }

    /// Store every generated note for `owner`. A note without a subject
    /// takes the category of the analyzed image, when there is one.
    pub fn import(
        &self,
        owner: &str,
        generated: Vec<GeneratedNote>,
        image_url: Option<&str>,
        analysis: Option<&ImageAnalysis>,
    ) -> Result<Vec<Note>> {
        let imported: Vec<Note> = generated
            .into_iter()
            .map(|item| {
                let subject = item
                    .subject
                    .filter(|s| !s.trim().is_empty())
                    .or_else(|| analysis.map(|a| a.category.clone()));
                Note::new(
                    owner,
                    subject,
                    item.note_content,
                    image_url.map(ToString::to_string),
                )
            })
            .collect();
        let mut notes = self.load()?;
        notes.extend(imported.iter().cloned());
        self.save(&notes)?;
        tracing::debug!(count = imported.len(), "generated notes stored");
        Ok(imported)
    }

    /// Manual edit: swap the whole content of a stored note.
    pub fn replace_content(&self, owner: &str, id: &str, content: impl Into<String>) -> Result<Note> {
        let mut note = self.get(owner, id)?;
        note.replace_content(content);
        self.update(&note)?;
        Ok(note)
    }

    pub fn remove(&self, owner: &str, id: &str) -> Result<Note> {
        let mut notes = self.load()?;
        let idx = notes
            .iter()
            .position(|n| n.owner_id == owner && n.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = notes.remove(idx);
        self.save(&notes)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::envelope::{parse_generated_notes, parse_image_analysis};
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn store() -> (TempDir, NoteStore) {
        let dir = TempDir::new().unwrap();
        let store = NoteStore::new(dir.path().join("notes").join("notes.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.list("me").unwrap().is_empty());
    }

    #[test]
    fn test_insert_then_get() {
        let (_dir, store) = store();
        let note = Note::new("me", Some("Bio".to_string()), "cells", None);
        store.insert(&note).unwrap();
        assert_eq!(store.get("me", &note.id).unwrap(), note);
        assert!(store.path().exists());
    }

    #[test]
    fn test_owner_scoping() {
        let (_dir, store) = store();
        let mine = Note::new("me", None, "a", None);
        let theirs = Note::new("them", None, "b", None);
        store.insert(&mine).unwrap();
        store.insert(&theirs).unwrap();

        assert_eq!(store.list("me").unwrap(), vec![mine.clone()]);
        assert!(matches!(
            store.get("me", &theirs.id),
            Err(StoreError::NotFound(_))
        ));
        assert!(store.remove("me", &theirs.id).is_err());
        assert_eq!(store.list("them").unwrap().len(), 1);
    }

    #[test]
    fn test_list_newest_first() {
        let (_dir, store) = store();
        let mut old = Note::new("me", None, "old", None);
        old.created_at = Utc::now() - Duration::days(2);
        let new = Note::new("me", None, "new", None);
        store.insert(&old).unwrap();
        store.insert(&new).unwrap();
        let listed = store.list("me").unwrap();
        assert_eq!(listed[0].note_content, "new");
        assert_eq!(listed[1].note_content, "old");
    }

    #[test]
    fn test_update_replaces_content() {
        let (_dir, store) = store();
        let mut note = Note::new("me", None, "before", None);
        store.insert(&note).unwrap();
        note.replace_content("after");
        store.update(&note).unwrap();
        assert_eq!(store.get("me", &note.id).unwrap().note_content, "after");
    }

    #[test]
    fn test_manual_edit_replaces_content_and_bumps_modified() {
        let (_dir, store) = store();
        let mut note = Note::new("me", None, "draft", None);
        note.last_modified = Utc::now() - Duration::hours(1);
        store.insert(&note).unwrap();

        let edited = store.replace_content("me", &note.id, "## Final").unwrap();
        assert_eq!(edited.note_content, "## Final");
        assert!(edited.last_modified > note.last_modified);
        assert_eq!(edited.created_at, note.created_at);
        assert_eq!(store.get("me", &note.id).unwrap(), edited);

        assert!(matches!(
            store.replace_content("them", &note.id, "x"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_import_falls_back_to_image_category() {
        let (dir, store) = store();
        let analysis_path = dir.path().join("analysis.json");
        fs::write(&analysis_path, r#"{"category": "Biology", "description": "A leaf"}"#).unwrap();
        let analysis = parse_image_analysis(&fs::read_to_string(&analysis_path).unwrap());

        let generated = parse_generated_notes(
            r#"[{"noteContent": "**Leaves**"}, {"subject": "Chemistry", "noteContent": "x"}]"#,
        );
        let imported = store
            .import("me", generated, Some("leaf.jpg"), Some(&analysis))
            .unwrap();

        assert_eq!(imported[0].subject.as_deref(), Some("biology"));
        assert_eq!(imported[1].subject.as_deref(), Some("Chemistry"));
        let stored = store.get("me", &imported[0].id).unwrap();
        assert_eq!(stored.subject.as_deref(), Some("biology"));
        assert_eq!(stored.image_url.as_deref(), Some("leaf.jpg"));
    }

    #[test]
    fn test_import_without_analysis_keeps_missing_subject() {
        let (_dir, store) = store();
        let generated = parse_generated_notes(r#"[{"noteContent": "plain"}]"#);
        let imported = store.import("me", generated, None, None).unwrap();
        assert_eq!(imported[0].subject, None);
        assert_eq!(imported[0].subject_or_default(), "General");
    }

    #[test]
    fn test_update_unknown_note_fails() {
        let (_dir, store) = store();
        let note = Note::new("me", None, "x", None);
        assert!(matches!(store.update(&note), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_remove() {
        let (_dir, store) = store();
        let note = Note::new("me", None, "x", None);
        store.insert(&note).unwrap();
        let removed = store.remove("me", &note.id).unwrap();
        assert_eq!(removed.id, note.id);
        assert!(store.list("me").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_reports_json_error() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.list("me"), Err(StoreError::Json(_))));
    }
}
