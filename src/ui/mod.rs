//! Terminal UI components.
//!
//! - [`viewport`]: Scroll position and visible range management
//! - [`lines`]: Render tree to terminal lines
//! - [`style`]: Colors and display-option modifiers

pub mod lines;
pub mod style;
pub mod viewport;

mod render;
mod status;

pub use lines::{lines_to_text, tree_lines};
pub use render::{note_area_height, note_content_width, render};
pub use status::status_text;

pub const DOCUMENT_LEFT_PADDING: u16 = 2;
