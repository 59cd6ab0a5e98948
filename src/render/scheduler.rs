//! Background diagram rendering.
//!
//! Each submitted diagram runs on its own worker thread so a slow or
//! crashing diagram never holds up its siblings. Results come back over a
//! channel tagged with the [`DiagramKey`] they were submitted under; the
//! owner decides whether the key still names a live mount.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::mermaid::{DiagramArtifact, DiagramEngine, DiagramError};

/// Identity of one diagram render: block position plus generation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagramKey {
    pub index: usize,
    pub token: u64,
}

#[derive(Debug)]
pub struct DiagramOutcome {
    pub key: DiagramKey,
    pub result: Result<DiagramArtifact, DiagramError>,
}

pub struct DiagramScheduler {
    engine: Arc<dyn DiagramEngine>,
    tx: Sender<DiagramOutcome>,
    rx: Receiver<DiagramOutcome>,
}

impl DiagramScheduler {
    pub fn new(engine: Arc<dyn DiagramEngine>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { engine, tx, rx }
    }

    /// Start rendering `source` in the background.
    pub fn submit(&self, key: DiagramKey, source: String) {
        crate::perf::log_event(
            "diagram.submit",
            format!("index={} token={} bytes={}", key.index, key.token, source.len()),
        );
        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("diagram-{}", key.index))
            .spawn(move || {
                let result = run_engine(engine.as_ref(), &source);
                // The receiver is gone once the view is dropped.
                let _ = tx.send(DiagramOutcome { key, result });
            });

        if let Err(err) = spawned {
            tracing::warn!("failed to spawn diagram worker: {err}");
            let result = Err(DiagramError::Panicked);
            let _ = self.tx.send(DiagramOutcome { key, result });
        }
    }

    /// Next finished outcome, if any, without blocking.
    pub fn try_next(&self) -> Option<DiagramOutcome> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next finished outcome.
    pub fn next_timeout(&self, timeout: Duration) -> Option<DiagramOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl std::fmt::Debug for DiagramScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramScheduler").finish_non_exhaustive()
    }
}

/// Validate, then render. A rejected source is rendered anyway only to
/// recover the engine's own error message.
fn run_engine(engine: &dyn DiagramEngine, source: &str) -> Result<DiagramArtifact, DiagramError> {
    catch_unwind(AssertUnwindSafe(|| {
        if engine.validate(source) {
            engine.render(source)
        } else {
            Err(engine.render(source).err().unwrap_or(DiagramError::Rejected))
        }
    }))
    .unwrap_or(Err(DiagramError::Panicked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mermaid::MermaidEngine;

    struct PanickingEngine;

    impl DiagramEngine for PanickingEngine {
        fn render(&self, _source: &str) -> Result<DiagramArtifact, DiagramError> {
            panic!("engine exploded");
        }
    }

    /// Renders anything but validates nothing.
    struct RejectingEngine;

    impl DiagramEngine for RejectingEngine {
        fn validate(&self, _source: &str) -> bool {
            false
        }

        fn render(&self, source: &str) -> Result<DiagramArtifact, DiagramError> {
            MermaidEngine.render(source)
        }
    }

    fn run_one(engine: impl DiagramEngine + 'static, source: &str) -> DiagramOutcome {
        let scheduler = DiagramScheduler::new(Arc::new(engine));
        scheduler.submit(DiagramKey { index: 0, token: 1 }, source.to_string());
        scheduler
            .next_timeout(Duration::from_secs(5))
            .expect("outcome")
    }

    #[test]
    fn test_validation_gates_render() {
        let outcome = run_one(RejectingEngine, "graph TD\nA-->B");
        assert_eq!(outcome.result, Err(DiagramError::Rejected));
    }

    #[test]
    fn test_rejected_source_keeps_engine_error() {
        let outcome = run_one(RejectingEngine, "graf TD\nA-->B");
        assert_eq!(
            outcome.result,
            Err(DiagramError::UnknownDiagramType {
                found: "graf".to_string()
            })
        );
    }

    #[test]
    fn test_outcome_carries_submitted_key() {
        let scheduler = DiagramScheduler::new(Arc::new(MermaidEngine));
        let key = DiagramKey { index: 3, token: 42 };
        scheduler.submit(key, "graph TD\nA-->B".to_string());
        let outcome = scheduler
            .next_timeout(Duration::from_secs(5))
            .expect("outcome");
        assert_eq!(outcome.key, key);
        assert!(outcome.result.is_ok());
    }

    #[test]
    fn test_panicking_engine_is_contained() {
        let scheduler = DiagramScheduler::new(Arc::new(PanickingEngine));
        let key = DiagramKey { index: 0, token: 1 };
        scheduler.submit(key, "graph TD".to_string());
        let outcome = scheduler
            .next_timeout(Duration::from_secs(5))
            .expect("outcome");
        assert_eq!(outcome.result, Err(DiagramError::Panicked));
    }

    #[test]
    fn test_try_next_is_empty_without_work() {
        let scheduler = DiagramScheduler::new(Arc::new(MermaidEngine));
        assert!(scheduler.try_next().is_none());
    }
}
