//! Terminal styling for rendered notes.
//!
//! Typography and paper choices have no direct terminal equivalent, so
//! they map onto text modifiers: handwritten fonts read as italic, lined
//! paper underlines body text and grid paper dims the background.

use ratatui::style::{Color, Modifier, Style};

use crate::document::{DisplayOptions, FontStyle, PaperStyle, Rgb};
use crate::render::{HeadingTier, PresentedRun};

const GRID_BACKGROUND: Color = Color::Indexed(236);

pub const fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Base style for body text under the given display options.
pub fn body_style(options: &DisplayOptions) -> Style {
    let mut style = Style::default();
    if options.font_style != FontStyle::System {
        style = style.add_modifier(Modifier::ITALIC);
    }
    match options.paper_style {
        PaperStyle::Plain => style,
        PaperStyle::Lined => style.add_modifier(Modifier::UNDERLINED),
        PaperStyle::Grid => style.bg(GRID_BACKGROUND),
    }
}

pub fn heading_style(tier: HeadingTier, base: Style) -> Style {
    match tier {
        HeadingTier::Title => base
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingTier::Section => base.fg(Color::Green).add_modifier(Modifier::BOLD),
        HeadingTier::Subsection => base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

pub fn run_style(run: &PresentedRun, base: Style) -> Style {
    let mut style = base;
    if run.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if let Some(color) = run.color {
        style = style.fg(rgb(color));
    }
    style
}

pub fn bullet_style() -> Style {
    Style::default().fg(Color::Cyan)
}

// Formulas stay upright whatever the font.
pub fn formula_style() -> Style {
    Style::default().fg(Color::White).bg(Color::Indexed(237))
}

pub fn divider_style() -> Style {
    Style::default()
        .fg(Color::Indexed(245))
        .add_modifier(Modifier::DIM)
}

pub fn diagram_frame_style() -> Style {
    Style::default().fg(Color::Magenta)
}

pub fn diagram_pending_style() -> Style {
    Style::default()
        .fg(Color::Indexed(245))
        .add_modifier(Modifier::ITALIC)
}

pub fn diagram_error_style() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

pub fn link_style() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED)
}

pub fn skeleton_style() -> Style {
    Style::default()
        .fg(Color::Indexed(240))
        .add_modifier(Modifier::DIM)
}
