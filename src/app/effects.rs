use std::io::{Write, stdout};
use std::time::Duration;

use base64::Engine;

use crate::app::{App, Message, Model, ToastLevel};
use crate::watcher::NoteWatcher;

/// Quiet period before a burst of file events triggers a reload.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

impl App {
    pub(super) fn make_watcher(model: &Model) -> notify::Result<NoteWatcher> {
        NoteWatcher::new(model.source.watch_path(), WATCH_DEBOUNCE)
    }

    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        match msg {
            Message::ForceReload | Message::FileChanged => {
                if let Err(err) = model.reload_from_source() {
                    model.show_toast(ToastLevel::Error, format!("Reload failed: {err:#}"));
                    crate::perf::log_event(
                        "reload.error",
                        format!("path={} err={err}", model.source.watch_path().display()),
                    );
                } else if matches!(msg, Message::ForceReload) {
                    model.show_toast(ToastLevel::Info, "Reloaded");
                }
            }
            Message::CopyFailedDiagram => Self::copy_failed_diagram(model),
            _ => {}
        }
    }

    fn copy_failed_diagram(model: &mut Model) {
        let Some(source) = model
            .view
            .tree()
            .first_failure()
            .map(|failure| failure.source.clone())
        else {
            model.show_toast(ToastLevel::Info, "No failed diagram to copy");
            return;
        };
        match copy_to_clipboard_osc52(&source) {
            Ok(()) => model.show_toast(ToastLevel::Info, "Copied diagram source"),
            Err(err) => model.show_toast(ToastLevel::Warning, format!("Copy failed: {err}")),
        }
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let mut out = stdout();
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
