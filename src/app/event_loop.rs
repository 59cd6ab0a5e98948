use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::render::{NoteView, RenderContext};
use crate::watcher::NoteWatcher;

/// Poll interval while diagrams are still rendering.
const DIAGRAM_POLL: Duration = Duration::from_millis(30);
const IDLE_POLL: Duration = Duration::from_millis(250);

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the note cannot be loaded, the terminal cannot
    /// be initialized, or drawing fails.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let loaded = self.source.load()?;

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal. snapnote view requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        // Nothing below waits on diagrams until the first frame is up.
        let view = NoteView::open(
            loaded.content.as_deref(),
            self.options,
            RenderContext::Prerender,
            Arc::clone(&self.engine),
        );
        let mut model = Model::new(
            self.source.clone(),
            loaded.title,
            view,
            (size.width, size.height),
        );
        model.watch_enabled = self.watch_enabled;

        let result = Self::event_loop(&mut terminal, &mut model);
        ratatui::restore();
        result
    }

    fn event_loop(terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let mut watcher = if model.watch_enabled {
            match Self::make_watcher(model) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    model.watch_enabled = false;
                    model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                    crate::perf::log_event("watcher.error", format!("failed err={err}"));
                    None
                }
            }
        } else {
            None
        };
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let summary = model.view.poll();
            if summary.applied + summary.discarded > 0 {
                crate::perf::log_event(
                    "diagram.poll",
                    format!(
                        "frame={frame_idx} applied={} discarded={}",
                        summary.applied, summary.discarded
                    ),
                );
            }
            if summary.changed() {
                *model = update(std::mem::take(model), Message::DiagramsUpdated);
                needs_render = true;
            }

            if model.watch_enabled
                && watcher
                    .as_mut()
                    .is_some_and(NoteWatcher::take_change_ready)
            {
                Self::dispatch(model, Message::FileChanged, frame_idx);
                needs_render = true;
            }

            let poll = if needs_render {
                Duration::ZERO
            } else if model.view.is_settled() {
                IDLE_POLL
            } else {
                DIAGRAM_POLL
            };
            if event::poll(poll)? {
                if let Some(msg) = Self::handle_event(&event::read()?, model) {
                    Self::dispatch(model, msg, frame_idx);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::ZERO)? {
                    if let Some(msg) = Self::handle_event(&event::read()?, model) {
                        drained += 1;
                        Self::dispatch(model, msg, frame_idx);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                needs_render = false;

                // The skeleton is on screen; diagrams may start now.
                if model.view.context() == RenderContext::Prerender {
                    model.confirm_interactive();
                    needs_render = true;
                }
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn dispatch(model: &mut Model, msg: Message, frame_idx: u64) {
        crate::perf::log_event("event.message", format!("frame={frame_idx} msg={msg:?}"));
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        Self::handle_message_side_effects(model, &side_msg);
    }
}
