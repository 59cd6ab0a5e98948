//! Reload notification for a note file on disk.
//!
//! The parent directory is watched rather than the file, since editors
//! commonly save by writing a new file and renaming it over the old one.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Collapses a burst of events into a single notification.
#[derive(Debug, Clone, Copy)]
struct Debounce {
    quiet: Duration,
    last_seen: Option<Instant>,
}

impl Debounce {
    const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_seen: None,
        }
    }

    fn touch(&mut self, at: Instant) {
        self.last_seen = Some(at);
    }

    fn fire(&mut self, now: Instant) -> bool {
        match self.last_seen {
            Some(seen) if now.duration_since(seen) >= self.quiet => {
                self.last_seen = None;
                true
            }
            _ => false,
        }
    }
}

pub struct NoteWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    dir: PathBuf,
    note_path: PathBuf,
    note_name: Option<OsString>,
    debounce: Debounce,
}

impl NoteWatcher {
    /// Watch the note at `path`.
    ///
    /// # Errors
    /// Returns an error if the directory holding the note cannot be watched.
    pub fn new(path: impl AsRef<Path>, quiet: Duration) -> notify::Result<Self> {
        // Backends report canonical paths.
        let note_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let note_name = note_path.file_name().map(std::ffi::OsStr::to_os_string);
        let dir = containing_dir(&note_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %note_path.display(), "watching note");

        Ok(Self {
            _watcher: watcher,
            rx,
            dir,
            note_path,
            note_name,
            debounce: Debounce::new(quiet),
        })
    }

    pub fn note_path(&self) -> &Path {
        &self.note_path
    }

    /// Drain pending events. True once the note has been quiet for the
    /// debounce interval after a change.
    pub fn take_change_ready(&mut self) -> bool {
        let mut relevant = 0u32;
        let mut ignored = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.touches_note(&ev) => relevant += 1,
                Ok(_) => ignored += 1,
                Err(err) => {
                    tracing::warn!("note watcher error: {err}");
                    crate::perf::log_event("watcher.error", err.to_string());
                }
            }
        }
        if relevant + ignored > 0 {
            crate::perf::log_event(
                "watcher.poll",
                format!(
                    "relevant={relevant} ignored={ignored} note={}",
                    self.note_path.display()
                ),
            );
        }
        let now = Instant::now();
        if relevant > 0 {
            self.debounce.touch(now);
        }
        self.debounce.fire(now)
    }

    fn touches_note(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.dir
                || path == &self.note_path
                || self
                    .note_name
                    .as_ref()
                    .is_some_and(|name| path.file_name() == Some(name.as_os_str()))
        })
    }
}

fn containing_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
