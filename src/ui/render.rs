use ratatui::prelude::*;
use ratatui::widgets::{Block, Padding, Paragraph};

use crate::app::Model;

use super::{DOCUMENT_LEFT_PADDING, status};

/// Columns available to note text in a terminal `total_width` wide.
pub const fn note_content_width(total_width: u16) -> u16 {
    let width = total_width.saturating_sub(DOCUMENT_LEFT_PADDING);
    if width == 0 { 1 } else { width }
}

/// Rows available to note text, after the footer bars.
pub fn note_area_height(total_height: u16, toast_active: bool) -> u16 {
    total_height.saturating_sub(1 + u16::from(toast_active))
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let toast_active = model.active_toast().is_some();

    let note_area = Rect {
        height: note_area_height(area.height, toast_active),
        ..area
    };
    let toast_area = Rect {
        y: area.y + area.height.saturating_sub(2),
        height: 1,
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1,
        ..area
    };

    let range = model.viewport.visible_range();
    let content: Vec<Line> = model
        .lines()
        .get(range)
        .map(<[Line<'static>]>::to_vec)
        .unwrap_or_default();

    let note = Paragraph::new(content)
        .block(Block::default().padding(Padding::left(DOCUMENT_LEFT_PADDING)));
    frame.render_widget(note, note_area);

    if toast_active {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, status_area);
}
