use crate::app::{Model, ToastLevel};
use crate::document::DisplayOptions;

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Scroll up by n lines
    ScrollUp(usize),
    /// Scroll down by n lines
    ScrollDown(usize),
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    GoToTop,
    GoToBottom,

    // Display options
    /// Show or hide diagram blocks
    ToggleDiagrams,
    /// Switch to the next font style
    CycleFont,
    /// Switch to the next paper style
    CyclePaper,

    // Diagrams
    /// Diagram results were applied to the tree
    DiagramsUpdated,
    /// Copy the source of the first failed diagram
    CopyFailedDiagram,

    // File watching
    /// Note changed on disk, reload
    FileChanged,
    /// Force reload
    ForceReload,

    // Window
    /// Terminal resized
    Resize(u16, u16),
    /// Redraw screen
    Redraw,

    // Application
    Quit,
}

/// Apply `msg` to the model.
///
/// Anything that touches the outside world (disk, clipboard) happens in
/// the side-effect handler instead.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::ScrollUp(n) => model.viewport.scroll_up(n),
        Message::ScrollDown(n) => model.viewport.scroll_down(n),
        Message::PageUp => model.viewport.page_up(),
        Message::PageDown => model.viewport.page_down(),
        Message::HalfPageUp => model.viewport.half_page_up(),
        Message::HalfPageDown => model.viewport.half_page_down(),
        Message::GoToTop => model.viewport.go_to_top(),
        Message::GoToBottom => model.viewport.go_to_bottom(),

        Message::ToggleDiagrams => {
            let options = model.view.options();
            let show_diagrams = !options.show_diagrams;
            model.set_options(DisplayOptions {
                show_diagrams,
                ..options
            });
            let label = if show_diagrams {
                "Diagrams shown"
            } else {
                "Diagrams hidden"
            };
            model.show_toast(ToastLevel::Info, label);
        }
        Message::CycleFont => {
            let options = model.view.options();
            let font_style = options.font_style.next();
            model.set_options(DisplayOptions {
                font_style,
                ..options
            });
            model.show_toast(ToastLevel::Info, format!("Font: {}", font_style.as_str()));
        }
        Message::CyclePaper => {
            let options = model.view.options();
            let paper_style = options.paper_style.next();
            model.set_options(DisplayOptions {
                paper_style,
                ..options
            });
            model.show_toast(
                ToastLevel::Info,
                format!("Paper: {}", paper_style.as_str()),
            );
        }

        Message::DiagramsUpdated => model.relayout(),

        Message::Resize(width, height) => {
            model
                .viewport
                .resize(width, crate::ui::note_area_height(height, false));
            model.relayout();
        }

        Message::Quit => model.should_quit = true,

        // FileChanged/ForceReload/CopyFailedDiagram: handled in effects
        // Redraw: no state change needed
        Message::FileChanged
        | Message::ForceReload
        | Message::CopyFailedDiagram
        | Message::Redraw => {}
    }
    model
}
