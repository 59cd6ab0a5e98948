use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};
use crate::render::RenderContext;

pub fn status_text(model: &Model) -> String {
    let options = model.view.options();
    let percent = model.viewport.scroll_percent();
    let line_info = format!(
        "Line {}/{}",
        (model.viewport.offset() + 1).min(model.viewport.total_lines().max(1)),
        model.viewport.total_lines()
    );

    let diagrams = if !options.show_diagrams {
        " [diagrams off]".to_string()
    } else {
        match model.view.tree().pending_count() {
            0 => String::new(),
            n => format!(" [rendering {n}]"),
        }
    };
    let loading = if model.view.context() == RenderContext::Prerender {
        " [loading]"
    } else {
        ""
    };
    let watch = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };

    format!(
        " {}  [{}%]  {}  {}/{}{}{}{}  q:quit",
        model.title,
        percent,
        line_info,
        options.font_style.as_str(),
        options.paper_style.as_str(),
        diagrams,
        loading,
        watch,
    )
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let status_bar = Paragraph::new(status_text(model))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
