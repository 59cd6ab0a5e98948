//! Mermaid diagram rendering.
//!
//! Diagram drawing is a capability behind the [`DiagramEngine`] trait so the
//! renderer can treat it as a black box that either yields an artifact or
//! fails with a syntax error. [`MermaidEngine`] is the built-in engine: it
//! detects the diagram kind, checks delimiter balance and produces a text
//! artifact the terminal front end can frame.
//!
//! Engine-wide settings live in a process-wide [`DiagramConfig`] that is set
//! at most once, before the first render.

use std::borrow::Cow;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use thiserror::Error;

/// External editor offered next to a failed diagram.
pub const EDITOR_URL: &str = "https://mermaid.live/edit";

/// Errors produced while validating or rendering a diagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagramError {
    #[error("diagram source is empty")]
    Empty,
    #[error("unknown diagram type `{found}`")]
    UnknownDiagramType { found: String },
    #[error("unbalanced `{delimiter}` on line {line}")]
    Unbalanced { line: usize, delimiter: char },
    #[error("diagram failed validation")]
    Rejected,
    #[error("diagram renderer crashed")]
    Panicked,
    #[error("diagram configuration was already initialized")]
    ConfigAlreadySet,
}

/// The diagramming capability.
pub trait DiagramEngine: Send + Sync {
    /// Cheap syntax check.
    fn validate(&self, source: &str) -> bool {
        self.render(source).is_ok()
    }

    /// Render diagram source to an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not a valid diagram.
    fn render(&self, source: &str) -> Result<DiagramArtifact, DiagramError>;
}

/// Diagram families recognized from the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
    EntityRelationship,
    Gantt,
    Pie,
    Mindmap,
    Journey,
    GitGraph,
    Timeline,
}

impl DiagramKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "graph" | "flowchart" => Self::Flowchart,
            "sequenceDiagram" => Self::Sequence,
            "classDiagram" => Self::Class,
            "stateDiagram" | "stateDiagram-v2" => Self::State,
            "erDiagram" => Self::EntityRelationship,
            "gantt" => Self::Gantt,
            "pie" => Self::Pie,
            "mindmap" => Self::Mindmap,
            "journey" => Self::Journey,
            "gitGraph" => Self::GitGraph,
            "timeline" => Self::Timeline,
            _ => return None,
        })
    }

    /// Whether statements use bracketed node shapes that must balance.
    /// The other families hold free text.
    const fn has_shapes(self) -> bool {
        matches!(
            self,
            Self::Flowchart
                | Self::Sequence
                | Self::Class
                | Self::State
                | Self::EntityRelationship
                | Self::Mindmap
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequence",
            Self::Class => "class",
            Self::State => "state",
            Self::EntityRelationship => "entity relationship",
            Self::Gantt => "gantt",
            Self::Pie => "pie",
            Self::Mindmap => "mindmap",
            Self::Journey => "journey",
            Self::GitGraph => "git graph",
            Self::Timeline => "timeline",
        }
    }
}

/// A rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramArtifact {
    pub kind: DiagramKind,
    /// Header options after the keyword, e.g. `TD` or `LR`.
    pub direction: Option<String>,
    /// Normalized statements, one per entry.
    pub statements: Vec<String>,
    pub theme: DiagramTheme,
}

/// Whether interactive directives are allowed in diagrams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecurityLevel {
    #[default]
    Strict,
    Loose,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiagramTheme {
    #[default]
    Default,
    Dark,
    Forest,
    Neutral,
}

/// Process-wide diagram settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagramConfig {
    pub security_level: SecurityLevel,
    pub theme: DiagramTheme,
}

static CONFIG: OnceCell<DiagramConfig> = OnceCell::new();

/// Set the diagram configuration. Must happen before the first render.
///
/// # Errors
///
/// Returns [`DiagramError::ConfigAlreadySet`] if the configuration was
/// already set or already read.
pub fn init_config(config: DiagramConfig) -> Result<(), DiagramError> {
    CONFIG
        .set(config)
        .map_err(|_| DiagramError::ConfigAlreadySet)
}

/// Current diagram configuration. Freezes the defaults on first use.
pub fn config() -> &'static DiagramConfig {
    CONFIG.get_or_init(DiagramConfig::default)
}

/// Built-in structural mermaid engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct MermaidEngine;

impl DiagramEngine for MermaidEngine {
    fn validate(&self, source: &str) -> bool {
        header(source).is_ok_and(|(_, kind, _)| check_balance(source, kind).is_ok())
    }

    fn render(&self, source: &str) -> Result<DiagramArtifact, DiagramError> {
        let (header_idx, kind, direction) = header(source)?;
        check_balance(source, kind)?;
        let config = config();

        let statements = source
            .lines()
            .skip(header_idx + 1)
            .flat_map(|line| line.split(';'))
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.starts_with("%%"))
            .filter(|s| config.security_level == SecurityLevel::Loose || !s.starts_with("click "))
            .map(ToString::to_string)
            .collect();

        Ok(DiagramArtifact {
            kind,
            direction,
            statements,
            theme: config.theme,
        })
    }
}

/// Find the header line: the first line that is neither blank nor a `%%`
/// comment.
fn header(source: &str) -> Result<(usize, DiagramKind, Option<String>), DiagramError> {
    let Some((idx, line)) = source
        .lines()
        .enumerate()
        .map(|(i, l)| (i, l.trim()))
        .find(|(_, l)| !l.is_empty() && !l.starts_with("%%"))
    else {
        return Err(DiagramError::Empty);
    };

    let line = line.trim_end_matches(';');
    let mut words = line.split_whitespace();
    let keyword = words.next().unwrap_or_default();
    let kind = DiagramKind::from_keyword(keyword).ok_or_else(|| DiagramError::UnknownDiagramType {
        found: keyword.to_string(),
    })?;
    let rest: Vec<&str> = words.collect();
    let direction = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };
    Ok((idx, kind, direction))
}

/// ER crow's foot cardinalities such as `||--o{` or `}|..|{`.
static ER_RELATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[|}][o|]\s*(?:--|\.\.)\s*[o|][|{]").expect("relation pattern is valid")
});

/// Flowchart edge labels: `-->|text|`.
static EDGE_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|[^|]*\|").expect("edge label pattern is valid"));

/// Asymmetric flowchart node `id>text]`. The `>` of an arrow follows `-`,
/// `=` or `.`, never a word character.
static ASYMMETRIC_NODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)>([^\[\]>]*\])").expect("asymmetric node pattern is valid"));

/// Async sequence arrows `-)` and `--)`.
static ASYNC_ARROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--?\)").expect("async arrow pattern is valid"));

/// Drop the tokens of `kind` that use bracket characters without opening
/// a shape.
fn strip_connectors(line: &str, kind: DiagramKind) -> Cow<'_, str> {
    match kind {
        DiagramKind::EntityRelationship => ER_RELATION_RE.replace_all(line, " "),
        DiagramKind::Flowchart => {
            let line = EDGE_LABEL_RE.replace_all(line, " ");
            Cow::Owned(ASYMMETRIC_NODE_RE.replace_all(&line, "${1}[${2}").into_owned())
        }
        DiagramKind::Sequence => ASYNC_ARROW_RE.replace_all(line, " "),
        _ => Cow::Borrowed(line),
    }
}

/// Check `()[]{}` nesting and `"` pairing in node shapes.
///
/// Delimiters inside quotes are ignored. Text after a `:` outside any shape
/// is a message or label and is not checked. Free-text diagram families
/// only need their quotes to pair.
fn check_balance(source: &str, kind: DiagramKind) -> Result<(), DiagramError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut quote_open: Option<usize> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        if raw.trim_start().starts_with("%%") {
            continue;
        }
        let line = strip_connectors(raw, kind);
        for ch in line.chars() {
            if ch == '"' {
                quote_open = if quote_open.is_some() {
                    None
                } else {
                    Some(line_no)
                };
                continue;
            }
            if quote_open.is_some() {
                continue;
            }
            if ch == ':' && stack.is_empty() {
                break;
            }
            if !kind.has_shapes() {
                continue;
            }
            match ch {
                '(' | '[' | '{' => stack.push((ch, line_no)),
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => {
                            return Err(DiagramError::Unbalanced {
                                line: line_no,
                                delimiter: ch,
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(line) = quote_open {
        return Err(DiagramError::Unbalanced {
            line,
            delimiter: '"',
        });
    }
    if let Some((open, line)) = stack.pop() {
        return Err(DiagramError::Unbalanced {
            line,
            delimiter: open,
        });
    }
    Ok(())
}
