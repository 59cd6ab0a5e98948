use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Message, Model};

impl App {
    pub(super) fn handle_event(event: &Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Resize(width, height) => {
                crate::perf::log_event("event.resize", format!("width={width} height={height}"));
                Some(Message::Resize(*width, *height))
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Some(Message::Quit),
            KeyCode::Char('d') if ctrl => Some(Message::HalfPageDown),
            KeyCode::Char('u') if ctrl => Some(Message::HalfPageUp),
            KeyCode::Char('l') if ctrl => Some(Message::Redraw),

            KeyCode::Char('q') | KeyCode::Esc => Some(Message::Quit),

            // Navigation
            KeyCode::Char('j') | KeyCode::Down => model
                .viewport
                .can_scroll_down()
                .then_some(Message::ScrollDown(1)),
            KeyCode::Char('k') | KeyCode::Up => {
                (model.viewport.offset() > 0).then_some(Message::ScrollUp(1))
            }
            KeyCode::PageDown | KeyCode::Char(' ') => Some(Message::PageDown),
            KeyCode::PageUp | KeyCode::Char('b') => Some(Message::PageUp),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::GoToTop),
            KeyCode::End | KeyCode::Char('G') => Some(Message::GoToBottom),

            // Display
            KeyCode::Char('d') => Some(Message::ToggleDiagrams),
            KeyCode::Char('f') => Some(Message::CycleFont),
            KeyCode::Char('p') => Some(Message::CyclePaper),

            KeyCode::Char('y') => Some(Message::CopyFailedDiagram),
            KeyCode::Char('r') => Some(Message::ForceReload),
            _ => None,
        }
    }
}
