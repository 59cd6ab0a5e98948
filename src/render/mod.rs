//! Interactive note rendering.
//!
//! Parsed blocks become a [`RenderTree`]. Diagrams are rendered in the
//! background by a [`DiagramScheduler`] and applied to the tree as they
//! finish; each one fails on its own without touching the rest of the note.
//!
//! [`NoteView`] owns one note's current render generation. Reloading the
//! note or changing display options starts a new generation, and results
//! that arrive for an older generation are dropped.

mod scheduler;
mod tree;
mod view;

pub use scheduler::{DiagramKey, DiagramOutcome, DiagramScheduler};
pub use tree::{
    DiagramFailure, DiagramMount, DiagramState, HeadingTier, PresentedRun, RenderNode,
    RenderTree, SKELETON_ROWS, render_blocks,
};
pub use view::{NoteView, PollSummary, RenderContext};
