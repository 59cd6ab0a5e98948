//! Interactive note viewer.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::document::DisplayOptions;
use crate::mermaid::{DiagramEngine, MermaidEngine};
use crate::note::NoteStore;

/// Where the displayed note comes from.
#[derive(Debug, Clone)]
pub enum NoteSource {
    /// A plain text file holding note content.
    File(PathBuf),
    /// A note in the local store.
    Stored {
        store: NoteStore,
        owner: String,
        id: String,
    },
}

impl Default for NoteSource {
    fn default() -> Self {
        Self::File(PathBuf::new())
    }
}

/// A loaded note: display title and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedNote {
    pub title: String,
    pub content: Option<String>,
}

impl NoteSource {
    /// Read the note.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the note is not in
    /// the store.
    pub fn load(&self) -> Result<LoadedNote> {
        match self {
            Self::File(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok(LoadedNote {
                    title: path.file_name().map_or_else(
                        || "untitled".to_string(),
                        |name| name.to_string_lossy().into_owned(),
                    ),
                    content: Some(content),
                })
            }
            Self::Stored { store, owner, id } => {
                let note = store
                    .get(owner, id)
                    .with_context(|| format!("Failed to load note {id}"))?;
                Ok(LoadedNote {
                    title: note.subject_or_default().to_string(),
                    content: Some(note.note_content),
                })
            }
        }
    }

    /// The file to watch for changes.
    pub fn watch_path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Stored { store, .. } => store.path(),
        }
    }
}

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    source: NoteSource,
    options: DisplayOptions,
    watch_enabled: bool,
    engine: Arc<dyn DiagramEngine>,
}

impl App {
    pub fn new(source: NoteSource) -> Self {
        Self {
            source,
            options: DisplayOptions::default(),
            watch_enabled: false,
            engine: Arc::new(MermaidEngine),
        }
    }

    /// Enable or disable file watching.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    #[must_use]
    pub const fn with_options(mut self, options: DisplayOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a different diagram engine.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn DiagramEngine>) -> Self {
        self.engine = engine;
        self
    }
}
