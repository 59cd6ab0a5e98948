//! The render tree produced from parsed blocks.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::{Block, DisplayOptions, Rgb, StyledRun};
use crate::mermaid::DiagramArtifact;

use super::scheduler::DiagramKey;

/// Placeholder rows shown while the interactive context is not confirmed.
pub const SKELETON_ROWS: usize = 4;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Draw a fresh, process-unique render generation token.
pub(crate) fn next_token() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingTier {
    Title,
    Section,
    Subsection,
}

impl HeadingTier {
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => Self::Title,
            2 => Self::Section,
            _ => Self::Subsection,
        }
    }
}

/// A run with its tag already mapped to a presentation color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedRun {
    pub text: String,
    pub bold: bool,
    pub color: Option<Rgb>,
}

impl From<&StyledRun> for PresentedRun {
    fn from(run: &StyledRun) -> Self {
        Self {
            text: run.text.clone(),
            bold: run.is_bold(),
            color: run.color.rgb(),
        }
    }
}

fn present(runs: &[StyledRun]) -> Vec<PresentedRun> {
    runs.iter().map(PresentedRun::from).collect()
}

/// What a diagram block shows when it could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramFailure {
    pub message: String,
    /// The diagram source, verbatim.
    pub source: String,
    pub editor_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramState {
    Pending,
    Ready(DiagramArtifact),
    Failed(DiagramFailure),
}

/// The mount point of one diagram in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramMount {
    pub key: DiagramKey,
    pub source: String,
    pub state: DiagramState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    Heading {
        tier: HeadingTier,
        runs: Vec<PresentedRun>,
    },
    Paragraph(Vec<PresentedRun>),
    /// Unbroken run of bullet blocks, one entry per item.
    List(Vec<Vec<PresentedRun>>),
    Formula(String),
    Divider,
    Diagram(DiagramMount),
    /// Deterministic placeholder shown before the interactive context exists.
    Skeleton { rows: usize },
}

/// Presentable output of one render generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
    pub options: DisplayOptions,
    pub token: u64,
}

impl RenderTree {
    pub fn empty(options: DisplayOptions) -> Self {
        Self {
            nodes: Vec::new(),
            options,
            token: next_token(),
        }
    }

    /// Placeholder tree. Nothing in it depends on diagram work.
    pub fn skeleton(blocks: &[Block], options: DisplayOptions) -> Self {
        let mut tree = Self::empty(options);
        if !blocks.is_empty() {
            tree.nodes.push(RenderNode::Skeleton {
                rows: SKELETON_ROWS,
            });
        }
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn mounts(&self) -> impl Iterator<Item = &DiagramMount> {
        self.nodes.iter().filter_map(|node| match node {
            RenderNode::Diagram(mount) => Some(mount),
            _ => None,
        })
    }

    pub fn mount_mut(&mut self, key: DiagramKey) -> Option<&mut DiagramMount> {
        self.nodes.iter_mut().find_map(|node| match node {
            RenderNode::Diagram(mount) if mount.key == key => Some(mount),
            _ => None,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.mounts()
            .filter(|m| matches!(m.state, DiagramState::Pending))
            .count()
    }

    pub fn first_failure(&self) -> Option<&DiagramFailure> {
        self.mounts().find_map(|m| match &m.state {
            DiagramState::Failed(failure) => Some(failure),
            _ => None,
        })
    }
}

/// Map parsed blocks to a render tree.
///
/// Every diagram mount starts `Pending` and is keyed by its block position
/// and a generation token shared by the whole tree.
pub fn render_blocks(blocks: &[Block], options: &DisplayOptions) -> RenderTree {
    let _scope = crate::perf::scope("render.blocks");
    let mut tree = RenderTree::empty(*options);
    let token = tree.token;

    for (index, block) in blocks.iter().enumerate() {
        match block {
            Block::Diagram { source } => {
                if !options.show_diagrams {
                    continue;
                }
                tree.nodes.push(RenderNode::Diagram(DiagramMount {
                    key: DiagramKey { index, token },
                    source: source.clone(),
                    state: DiagramState::Pending,
                }));
            }
            Block::Heading { level, runs, .. } => tree.nodes.push(RenderNode::Heading {
                tier: HeadingTier::from_level(*level),
                runs: present(runs),
            }),
            Block::Paragraph { runs } => tree.nodes.push(RenderNode::Paragraph(present(runs))),
            Block::Bullet { runs } => {
                if let Some(RenderNode::List(items)) = tree.nodes.last_mut() {
                    items.push(present(runs));
                } else {
                    tree.nodes.push(RenderNode::List(vec![present(runs)]));
                }
            }
            Block::Formula { text } => tree.nodes.push(RenderNode::Formula(text.clone())),
            Block::Rule => tree.nodes.push(RenderNode::Divider),
        }
    }

    tree
}
