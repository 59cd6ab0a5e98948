// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. note::NoteStore)
    clippy::module_name_repetitions
)]

//! # snapnote
//!
//! Study notes in the terminal and on paper.
//!
//! snapnote reads the lightweight note format produced by the note
//! generator (headings, bullets, `<mermaid>` diagrams, `[FORMULA: ...]` boxes
//! and colored spans) and shows it with:
//! - Diagrams rendered off the UI thread, with stale results discarded
//! - A skeleton frame until the terminal is known to be interactive
//! - Font and paper styles
//! - Paginated A4 PDF export
//! - A local note store with search and subject filters
//!
//! ```
//! use snapnote::document::{Block, parse};
//!
//! let blocks = parse("## Energy\n[FORMULA: E = mc^2]");
//! assert!(matches!(&blocks[1], Block::Formula { text } if text == "E = mc^2"));
//! ```
//!
//! ## Architecture
//!
//! The viewer uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`document`]: Note content parsing
//! - [`render`]: Render trees and async diagram scheduling
//! - [`mermaid`]: Diagram validation and layout
//! - [`export`]: PDF export
//! - [`note`]: Note records, generator envelopes and the note store
//! - [`app`]: Main application loop and state
//! - [`ui`]: Terminal UI components
//! - [`watcher`]: File watching

pub mod app;
pub mod config;
pub mod document;
pub mod export;
pub mod mermaid;
pub mod note;
pub mod perf;
pub mod render;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::document::{DisplayOptions, parse};
    pub use crate::export::export_note;
    pub use crate::note::{Note, NoteStore};
    pub use crate::render::{NoteView, RenderContext};
    pub use crate::ui::viewport::Viewport;
}
