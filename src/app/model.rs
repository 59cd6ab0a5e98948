use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::text::Line;

use crate::document::DisplayOptions;
use crate::render::NoteView;
use crate::ui::viewport::Viewport;

use super::NoteSource;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug)]
pub struct Model {
    /// The note and its current render generation
    pub view: NoteView,
    pub viewport: Viewport,
    pub source: NoteSource,
    /// Shown in the status bar
    pub title: String,
    pub watch_enabled: bool,
    pub should_quit: bool,
    /// The render tree laid out for the current width
    lines: Vec<Line<'static>>,
    toast: Option<Toast>,
}

impl Model {
    pub fn new(
        source: NoteSource,
        title: String,
        view: NoteView,
        terminal_size: (u16, u16),
    ) -> Self {
        let mut model = Self {
            view,
            viewport: Viewport::new(
                terminal_size.0,
                crate::ui::note_area_height(terminal_size.1, false),
                0,
            ),
            source,
            title,
            watch_enabled: false,
            should_quit: false,
            lines: Vec::new(),
            toast: None,
        };
        model.relayout();
        model
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Lay the current tree out again for the viewport width.
    pub fn relayout(&mut self) {
        let _scope = crate::perf::scope("app.relayout");
        let width = crate::ui::note_content_width(self.viewport.width());
        self.lines = crate::ui::tree_lines(self.view.tree(), width);
        self.viewport.set_total_lines(self.lines.len());
    }

    /// Leave the skeleton and start diagram work.
    pub fn confirm_interactive(&mut self) {
        self.view.confirm_interactive();
        self.relayout();
    }

    pub fn set_options(&mut self, options: DisplayOptions) {
        self.view.set_options(options);
        self.relayout();
    }

    pub(super) fn reload_from_source(&mut self) -> Result<()> {
        let loaded = self.source.load()?;
        self.title = loaded.title;
        self.view.reload(loaded.content.as_deref());
        self.relayout();
        Ok(())
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self {
            view: NoteView::default(),
            viewport: Viewport::new(80, 23, 0),
            source: NoteSource::default(),
            title: String::new(),
            watch_enabled: false,
            should_quit: false,
            lines: Vec::new(),
            toast: None,
        }
    }
}
