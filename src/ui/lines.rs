//! Flattening a render tree into terminal lines.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::mermaid::DiagramArtifact;
use crate::render::{
    DiagramFailure, DiagramMount, DiagramState, PresentedRun, RenderNode, RenderTree,
};

use super::style;

const BULLET: &str = "  • ";
const BULLET_INDENT: &str = "    ";
const DIAGRAM_GUTTER: &str = "  │ ";
/// Skeleton bar lengths as a share of the width, in percent.
const SKELETON_WIDTHS: [usize; 4] = [100, 85, 70, 55];

/// Lay out `tree` as lines no wider than `width` columns.
pub fn tree_lines(tree: &RenderTree, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width.max(8));
    let body = style::body_style(&tree.options);
    let mut out = Vec::new();

    for node in &tree.nodes {
        if !out.is_empty() {
            out.push(Line::default());
        }
        match node {
            RenderNode::Heading { tier, runs } => {
                let base = style::heading_style(*tier, body);
                out.extend(wrap(&styled_runs(runs, base), width, Span::raw(""), ""));
            }
            RenderNode::Paragraph(runs) => {
                out.extend(wrap(&styled_runs(runs, body), width, Span::raw(""), ""));
            }
            RenderNode::List(items) => {
                for item in items {
                    out.extend(wrap(
                        &styled_runs(item, body),
                        width,
                        Span::styled(BULLET, style::bullet_style()),
                        BULLET_INDENT,
                    ));
                }
            }
            RenderNode::Formula(text) => formula_lines(&mut out, text, width),
            RenderNode::Divider => {
                out.push(Line::styled("─".repeat(width), style::divider_style()));
            }
            RenderNode::Diagram(mount) => diagram_lines(&mut out, mount, width),
            RenderNode::Skeleton { rows } => {
                for row in 0..*rows {
                    let pct = SKELETON_WIDTHS[row % SKELETON_WIDTHS.len()];
                    let len = (width * pct / 100).max(1);
                    out.push(Line::styled("░".repeat(len), style::skeleton_style()));
                }
            }
        }
    }
    out
}

/// Text content of `lines`, one line per row.
pub fn lines_to_text(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn styled_runs(runs: &[PresentedRun], base: Style) -> Vec<(String, Style)> {
    runs.iter()
        .map(|run| (run.text.clone(), style::run_style(run, base)))
        .collect()
}

fn formula_lines(out: &mut Vec<Line<'static>>, text: &str, width: usize) {
    let formula = style::formula_style();
    let inner = width.saturating_sub(4).max(1);
    let rows = wrap(&[(text.to_string(), formula)], inner, Span::raw(""), "");
    out.push(Line::styled(
        format!("┌{}┐", "─".repeat(inner + 2)),
        style::divider_style(),
    ));
    for row in rows {
        let used = row.width();
        let mut spans = vec![Span::styled("│ ", style::divider_style())];
        spans.extend(row.spans);
        spans.push(Span::styled(" ".repeat(inner.saturating_sub(used)), formula));
        spans.push(Span::styled(" │", style::divider_style()));
        out.push(Line::from(spans));
    }
    out.push(Line::styled(
        format!("└{}┘", "─".repeat(inner + 2)),
        style::divider_style(),
    ));
}

fn diagram_lines(out: &mut Vec<Line<'static>>, mount: &DiagramMount, width: usize) {
    match &mount.state {
        DiagramState::Pending => {
            out.push(Line::styled(
                "◌ Rendering diagram...",
                style::diagram_pending_style(),
            ));
        }
        DiagramState::Ready(artifact) => ready_lines(out, artifact, width),
        DiagramState::Failed(failure) => failure_lines(out, failure, width),
    }
}

fn ready_lines(out: &mut Vec<Line<'static>>, artifact: &DiagramArtifact, width: usize) {
    let frame = style::diagram_frame_style();
    let title = artifact.direction.as_deref().map_or_else(
        || format!("◆ {}", artifact.kind.label()),
        |dir| format!("◆ {} ({dir})", artifact.kind.label()),
    );
    out.push(Line::styled(title, frame));
    for statement in &artifact.statements {
        out.extend(wrap(
            &[(statement.clone(), Style::default())],
            width,
            Span::raw(DIAGRAM_GUTTER),
            DIAGRAM_GUTTER,
        ));
    }
}

fn failure_lines(out: &mut Vec<Line<'static>>, failure: &DiagramFailure, width: usize) {
    let error = style::diagram_error_style();
    out.extend(wrap(
        &[(format!("✗ Diagram error: {}", failure.message), error)],
        width,
        Span::raw(""),
        "  ",
    ));
    for source_line in failure.source.lines() {
        out.push(Line::from(vec![
            Span::styled(DIAGRAM_GUTTER, error),
            Span::raw(source_line.to_string()),
        ]));
    }
    out.push(Line::from(vec![
        Span::raw("Open in editor: "),
        Span::styled(failure.editor_url.clone(), style::link_style()),
        Span::styled("  (y copies the source)", style::diagram_pending_style()),
    ]));
}

/// Word-wrap styled pieces. `first` prefixes the first row, `rest` the
/// others. Words wider than a row are split.
fn wrap(
    pieces: &[(String, Style)],
    width: usize,
    first: Span<'static>,
    rest: &str,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut used = first.width();
    let mut current: Vec<Span<'static>> = vec![first];
    let mut row_start = true;

    for (text, style) in pieces {
        for word in split_keep_spaces(text) {
            let word_width = word.width();
            let is_space = word.trim().is_empty();
            if is_space && row_start {
                continue;
            }
            if used + word_width > width && !row_start {
                lines.push(Line::from(std::mem::take(&mut current)));
                current.push(Span::raw(rest.to_string()));
                used = rest.width();
                row_start = true;
                if is_space {
                    continue;
                }
            }
            if used + word_width <= width {
                current.push(Span::styled(word.to_string(), *style));
                used += word_width;
                row_start = false;
                continue;
            }
            for ch in word.chars() {
                let ch_width = ch.to_string().width();
                if used + ch_width > width && !row_start {
                    lines.push(Line::from(std::mem::take(&mut current)));
                    current.push(Span::raw(rest.to_string()));
                    used = rest.width();
                }
                current.push(Span::styled(ch.to_string(), *style));
                used += ch_width;
                row_start = false;
            }
        }
    }
    if !row_start || lines.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

/// Split into alternating runs of non-space and space characters.
fn split_keep_spaces(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (idx, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        if in_space.is_some_and(|s| s != space) {
            out.push(&text[start..idx]);
            start = idx;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DisplayOptions, parse};
    use crate::mermaid::{DiagramEngine, MermaidEngine};
    use crate::render::render_blocks;

    fn text_of(content: &str, width: u16) -> String {
        let tree = render_blocks(&parse(content), &DisplayOptions::default());
        lines_to_text(&tree_lines(&tree, width))
    }

    #[test]
    fn test_split_keep_spaces() {
        assert_eq!(split_keep_spaces("a  bc d"), vec!["a", "  ", "bc", " ", "d"]);
        assert!(split_keep_spaces("").is_empty());
    }

    #[test]
    fn test_paragraph_wraps_at_width() {
        let text = text_of("alpha beta gamma delta", 12);
        assert_eq!(text, "alpha beta\ngamma delta");
    }

    #[test]
    fn test_long_word_is_split() {
        let text = text_of("abcdefghijkl", 8);
        assert_eq!(text, "abcdefgh\nijkl");
    }

    #[test]
    fn test_list_items_get_bullets_and_hanging_indent() {
        let text = text_of("* first item here\n* second", 14);
        assert_eq!(text, "  • first item\n    here\n  • second");
    }

    #[test]
    fn test_bullet_glyph_is_highlighted() {
        let tree = render_blocks(&parse("* item"), &DisplayOptions::default());
        let lines = tree_lines(&tree, 40);
        let glyph = &lines[0].spans[0];
        assert_eq!(glyph.content, BULLET);
        assert_eq!(glyph.style, style::bullet_style());
        assert_ne!(lines[0].spans[1].style, style::bullet_style());
    }

    #[test]
    fn test_blocks_are_separated_by_blank_lines() {
        let text = text_of("## One\nBody\n---", 20);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "One");
        assert_eq!(rows[1], "");
        assert_eq!(rows[2], "Body");
        assert_eq!(rows[3], "");
        assert!(rows[4].starts_with('─'));
    }

    #[test]
    fn test_formula_is_boxed() {
        let text = text_of("[FORMULA: E = mc^2]", 20);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with('┌'));
        assert!(rows[1].contains("E = mc^2"));
        assert!(rows[2].starts_with('└'));
    }

    #[test]
    fn test_pending_and_ready_diagram() {
        let mut tree = render_blocks(
            &parse("<mermaid>graph TD\nA-->B</mermaid>"),
            &DisplayOptions::default(),
        );
        assert!(lines_to_text(&tree_lines(&tree, 40)).contains("Rendering diagram"));

        let key = tree.mounts().next().unwrap().key;
        let artifact = MermaidEngine.render("graph TD\nA-->B").unwrap();
        tree.mount_mut(key).unwrap().state = DiagramState::Ready(artifact);
        let text = lines_to_text(&tree_lines(&tree, 40));
        assert!(text.contains("◆ flowchart (TD)"));
        assert!(text.contains("│ A-->B"));
    }

    #[test]
    fn test_failed_diagram_shows_source_and_editor_link() {
        let mut tree = render_blocks(
            &parse("<mermaid>nonsense here</mermaid>"),
            &DisplayOptions::default(),
        );
        let key = tree.mounts().next().unwrap().key;
        tree.mount_mut(key).unwrap().state = DiagramState::Failed(DiagramFailure {
            message: "unknown diagram type".to_string(),
            source: "nonsense here".to_string(),
            editor_url: crate::mermaid::EDITOR_URL.to_string(),
        });
        let text = lines_to_text(&tree_lines(&tree, 60));
        assert!(text.contains("Diagram error: unknown diagram type"));
        assert!(text.contains("│ nonsense here"));
        assert!(text.contains("https://mermaid.live/edit"));
    }

    #[test]
    fn test_skeleton_rows() {
        let tree = RenderTree::skeleton(&parse("Body"), DisplayOptions::default());
        let lines = tree_lines(&tree, 20);
        assert_eq!(lines.len(), crate::render::SKELETON_ROWS);
        assert_eq!(lines[0].width(), 20);
        assert!(lines[3].width() < 20);
    }

    #[test]
    fn test_empty_tree_has_no_lines() {
        let tree = RenderTree::empty(DisplayOptions::default());
        assert!(tree_lines(&tree, 40).is_empty());
    }
}
