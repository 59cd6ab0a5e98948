//! Study notes and the operations the viewer performs on them.

pub mod envelope;
mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use store::{NoteStore, StoreError};

pub const DEFAULT_SUBJECT: &str = "General";
/// Subject filter value that matches every note.
pub const ALL_SUBJECTS: &str = "All";
pub const PREVIEW_CHARS: usize = 200;
const ASSISTANT_HEADING: &str = "## AI Assistant Notes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub note_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Note {
    pub fn new(
        owner_id: impl Into<String>,
        subject: Option<String>,
        note_content: impl Into<String>,
        image_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            subject,
            note_content: note_content.into(),
            image_url,
            created_at: now,
            last_modified: now,
        }
    }

    pub fn subject_or_default(&self) -> &str {
        self.subject
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SUBJECT)
    }

    /// Swap the whole content. Notes are never patched in place.
    pub fn replace_content(&mut self, content: impl Into<String>) {
        self.note_content = content.into();
        self.last_modified = Utc::now();
    }

    /// Append every assistant reply of `chat` under an assistant section.
    ///
    /// Returns `false` and leaves the note untouched when the chat holds no
    /// assistant text.
    pub fn apply_assistant_update(&mut self, chat: &[ChatMessage]) -> bool {
        let replies = chat
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .map(|m| m.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        if replies.is_empty() {
            return false;
        }
        let content = format!(
            "{}\n\n---\n\n{ASSISTANT_HEADING}\n\n{replies}",
            self.note_content
        );
        self.replace_content(content);
        true
    }

    /// First `max_chars` characters, with `...` when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.note_content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    pub fn export_file_name(&self) -> String {
        crate::export::file_name_for(self.subject.as_deref())
    }

    pub fn text_download_name(&self) -> String {
        format!("study-notes-{}.txt", self.created_at.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Search and subject filter for note listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub search: Option<String>,
    pub subject: Option<String>,
}

impl NoteFilter {
    pub fn matches(&self, note: &Note) -> bool {
        self.matches_search(note) && self.matches_subject(note)
    }

    fn matches_search(&self, note: &Note) -> bool {
        let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        note.note_content.to_lowercase().contains(&term)
            || note
                .subject
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&term))
    }

    fn matches_subject(&self, note: &Note) -> bool {
        match self.subject.as_deref() {
            None | Some(ALL_SUBJECTS) => true,
            Some(subject) => note.subject.as_deref() == Some(subject),
        }
    }

    pub fn apply<'a>(&self, notes: &'a [Note]) -> Vec<&'a Note> {
        notes.iter().filter(|n| self.matches(n)).collect()
    }
}

/// `"All"` followed by each distinct subject in first-seen order.
pub fn subjects(notes: &[Note]) -> Vec<String> {
    let mut out = vec![ALL_SUBJECTS.to_string()];
    for subject in notes.iter().filter_map(|n| n.subject.as_deref()) {
        if !subject.is_empty() && !out[1..].iter().any(|s| s == subject) {
            out.push(subject.to_string());
        }
    }
    out
}
