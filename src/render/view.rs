//! A note opened for display, with its diagram work in flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::document::{Block, DisplayOptions, parse_optional};
use crate::mermaid::{DiagramEngine, EDITOR_URL, MermaidEngine};

use super::scheduler::{DiagramOutcome, DiagramScheduler};
use super::tree::{DiagramFailure, DiagramState, RenderTree, render_blocks};

/// Where the renderer is running.
///
/// Diagram work only happens once the interactive context is confirmed;
/// before that the view shows a skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    Prerender,
    Interactive,
}

/// Counts from one [`NoteView::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub applied: usize,
    pub discarded: usize,
}

impl PollSummary {
    pub const fn changed(self) -> bool {
        self.applied > 0
    }
}

#[derive(Debug)]
pub struct NoteView {
    blocks: Vec<Block>,
    options: DisplayOptions,
    context: RenderContext,
    tree: RenderTree,
    scheduler: DiagramScheduler,
}

impl Default for NoteView {
    fn default() -> Self {
        Self::open(
            None,
            DisplayOptions::default(),
            RenderContext::Prerender,
            Arc::new(MermaidEngine),
        )
    }
}

impl NoteView {
    /// Parse `content` and build the first render generation.
    pub fn open(
        content: Option<&str>,
        options: DisplayOptions,
        context: RenderContext,
        engine: Arc<dyn DiagramEngine>,
    ) -> Self {
        let mut view = Self {
            blocks: Vec::new(),
            options,
            context,
            tree: RenderTree::empty(options),
            scheduler: DiagramScheduler::new(engine),
        };
        view.blocks = parse_content(content);
        view.rebuild();
        view
    }

    pub const fn context(&self) -> RenderContext {
        self.context
    }

    pub const fn options(&self) -> DisplayOptions {
        self.options
    }

    pub const fn tree(&self) -> &RenderTree {
        &self.tree
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Switch to the interactive context. Replaces the skeleton with the
    /// real tree and submits diagram work. No-op when already interactive.
    pub fn confirm_interactive(&mut self) {
        if self.context == RenderContext::Interactive {
            return;
        }
        self.context = RenderContext::Interactive;
        self.rebuild();
    }

    /// Replace the note content. In-flight diagram work from the previous
    /// generation is discarded when it arrives.
    pub fn reload(&mut self, content: Option<&str>) {
        self.blocks = parse_content(content);
        self.rebuild();
    }

    /// Change display options. Only toggling diagrams starts a new
    /// generation; font and paper are presentation only and keep the
    /// current mounts and their in-flight work.
    pub fn set_options(&mut self, options: DisplayOptions) {
        let regenerate = options.show_diagrams != self.options.show_diagrams;
        self.options = options;
        if regenerate {
            self.rebuild();
        } else {
            self.tree.options = options;
        }
    }

    /// Apply every finished diagram outcome without blocking.
    pub fn poll(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();
        while let Some(outcome) = self.scheduler.try_next() {
            self.apply(outcome, &mut summary);
        }
        summary
    }

    /// Block until every diagram resolved or `timeout` elapsed.
    /// Returns whether the tree is fully settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut summary = PollSummary::default();
        while !self.is_settled() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let Some(outcome) = self.scheduler.next_timeout(remaining) else {
                break;
            };
            self.apply(outcome, &mut summary);
        }
        self.is_settled()
    }

    pub fn is_settled(&self) -> bool {
        self.tree.pending_count() == 0
    }

    fn rebuild(&mut self) {
        let blocks = &self.blocks;
        self.tree = match self.context {
            RenderContext::Prerender => RenderTree::skeleton(blocks, self.options),
            RenderContext::Interactive => render_blocks(blocks, &self.options),
        };
        crate::perf::log_event(
            "render.generation",
            format!(
                "token={} context={:?} blocks={} nodes={}",
                self.tree.token,
                self.context,
                self.blocks.len(),
                self.tree.nodes.len()
            ),
        );
        if self.context == RenderContext::Interactive {
            for mount in self.tree.mounts() {
                self.scheduler.submit(mount.key, mount.source.clone());
            }
        }
    }

    fn apply(&mut self, outcome: DiagramOutcome, summary: &mut PollSummary) {
        let DiagramOutcome { key, result } = outcome;
        let Some(mount) = self.tree.mount_mut(key) else {
            tracing::debug!(
                index = key.index,
                token = key.token,
                "discarding diagram result for a mount that is gone"
            );
            crate::perf::log_event(
                "diagram.stale",
                format!("index={} token={}", key.index, key.token),
            );
            summary.discarded += 1;
            return;
        };

        mount.state = match result {
            Ok(artifact) => DiagramState::Ready(artifact),
            Err(err) => {
                tracing::warn!(index = key.index, "diagram failed to render: {err}");
                DiagramState::Failed(DiagramFailure {
                    message: err.to_string(),
                    source: mount.source.clone(),
                    editor_url: EDITOR_URL.to_string(),
                })
            }
        };
        summary.applied += 1;
    }
}

fn parse_content(content: Option<&str>) -> Vec<Block> {
    // Whitespace-only content is treated as missing.
    parse_optional(content.filter(|c| !c.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mermaid::{DiagramArtifact, DiagramError};
    use crate::render::RenderNode;

    const WAIT: Duration = Duration::from_secs(5);

    /// Delegates to the mermaid engine, but sleeps on sources that mention
    /// `slow` and panics on `boom`.
    struct TestEngine;

    impl DiagramEngine for TestEngine {
        fn render(&self, source: &str) -> Result<DiagramArtifact, DiagramError> {
            if source.contains("slow") {
                std::thread::sleep(Duration::from_millis(150));
            }
            assert!(!source.contains("boom"), "boom");
            MermaidEngine.render(source)
        }
    }

    fn interactive(content: &str) -> NoteView {
        NoteView::open(
            Some(content),
            DisplayOptions::default(),
            RenderContext::Interactive,
            Arc::new(TestEngine),
        )
    }

    fn states(view: &NoteView) -> Vec<&DiagramState> {
        view.tree().mounts().map(|m| &m.state).collect()
    }

    #[test]
    fn test_failed_diagram_does_not_affect_sibling() {
        let mut view = interactive(
            "<mermaid>graf TD\nA-->B</mermaid>\nText between\n<mermaid>graph TD\nA-->B</mermaid>",
        );
        assert!(view.settle(WAIT));
        let states = states(&view);
        assert_eq!(states.len(), 2);
        let DiagramState::Failed(failure) = states[0] else {
            panic!("first diagram should fail, got {:?}", states[0]);
        };
        assert!(failure.message.contains("graf"));
        assert_eq!(failure.source, "graf TD\nA-->B");
        assert_eq!(failure.editor_url, EDITOR_URL);
        assert!(matches!(states[1], DiagramState::Ready(_)));
        assert!(matches!(view.tree().nodes[1], RenderNode::Paragraph(_)));
    }

    #[test]
    fn test_panicking_diagram_fails_alone() {
        let mut view = interactive(
            "<mermaid>graph TD\nboom</mermaid>\n<mermaid>graph TD\nA-->B</mermaid>",
        );
        assert!(view.settle(WAIT));
        let states = states(&view);
        assert!(matches!(states[0], DiagramState::Failed(_)));
        assert!(matches!(states[1], DiagramState::Ready(_)));
    }

    #[test]
    fn test_prerender_shows_skeleton_and_schedules_nothing() {
        let mut view = NoteView::open(
            Some("## Heading\n<mermaid>graph TD\nA-->B</mermaid>"),
            DisplayOptions::default(),
            RenderContext::Prerender,
            Arc::new(TestEngine),
        );
        assert!(matches!(view.tree().nodes[..], [RenderNode::Skeleton { .. }]));
        assert_eq!(view.tree().mounts().count(), 0);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(view.poll(), PollSummary::default());

        view.confirm_interactive();
        assert_eq!(view.context(), RenderContext::Interactive);
        assert_eq!(view.tree().pending_count(), 1);
        assert!(view.settle(WAIT));
    }

    #[test]
    fn test_reload_discards_stale_results() {
        let mut view = interactive("<mermaid>graph TD\nslow-->A</mermaid>");
        let old_token = view.tree().token;
        view.reload(Some("<mermaid>pie\n\"A\" : 1</mermaid>"));
        assert_ne!(view.tree().token, old_token);

        assert!(view.settle(WAIT));
        std::thread::sleep(Duration::from_millis(300));
        let summary = view.poll();
        assert_eq!(summary.applied, 0);

        let DiagramState::Ready(artifact) = states(&view)[0] else {
            panic!("expected ready diagram");
        };
        assert_eq!(artifact.kind, crate::mermaid::DiagramKind::Pie);
    }

    #[test]
    fn test_hidden_diagrams_are_never_scheduled() {
        let mut view = NoteView::open(
            Some("<mermaid>graph TD\nA-->B</mermaid>"),
            DisplayOptions {
                show_diagrams: false,
                ..DisplayOptions::default()
            },
            RenderContext::Interactive,
            Arc::new(TestEngine),
        );
        assert!(view.tree().is_empty());
        assert!(view.is_settled());
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(view.poll().applied, 0);
    }

    #[test]
    fn test_toggling_diagrams_back_on_schedules_new_generation() {
        let mut view = interactive("<mermaid>graph TD\nA-->B</mermaid>");
        assert!(view.settle(WAIT));
        let mut options = view.options();
        options.show_diagrams = false;
        view.set_options(options);
        assert_eq!(view.tree().mounts().count(), 0);

        options.show_diagrams = true;
        view.set_options(options);
        assert_eq!(view.tree().pending_count(), 1);
        assert!(view.settle(WAIT));
    }

    #[test]
    fn test_font_and_paper_changes_keep_diagram_mounts() {
        use crate::document::{FontStyle, PaperStyle};

        let mut view = interactive("<mermaid>graph TD\nA-->B</mermaid>");
        assert!(view.settle(WAIT));
        let token = view.tree().token;

        let options = DisplayOptions {
            font_style: FontStyle::System,
            paper_style: PaperStyle::Grid,
            ..view.options()
        };
        view.set_options(options);
        assert_eq!(view.tree().token, token);
        assert_eq!(view.tree().options, options);
        assert!(matches!(states(&view)[..], [DiagramState::Ready(_)]));
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(view.poll(), PollSummary::default());
    }

    #[test]
    fn test_font_change_while_pending_keeps_in_flight_work() {
        let mut view = interactive("<mermaid>graph TD\nslow-->A</mermaid>");
        let current = view.options();
        view.set_options(DisplayOptions {
            font_style: current.font_style.next(),
            ..current
        });
        assert_eq!(view.tree().pending_count(), 1);
        assert!(view.settle(WAIT));
        assert!(matches!(states(&view)[..], [DiagramState::Ready(_)]));
    }

    #[test]
    fn test_missing_content_renders_empty_tree() {
        for content in [None, Some(""), Some("  \n\t\n")] {
            let view = NoteView::open(
                content,
                DisplayOptions::default(),
                RenderContext::Interactive,
                Arc::new(TestEngine),
            );
            assert!(view.tree().is_empty());
            assert!(view.is_settled());
        }
    }

    #[test]
    fn test_settle_times_out_on_slow_engine() {
        let mut view = interactive("<mermaid>graph TD\nslow-->A</mermaid>");
        assert!(!view.settle(Duration::from_millis(1)));
        assert!(view.settle(WAIT));
    }
}
