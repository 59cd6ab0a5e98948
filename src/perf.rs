//! Lightweight performance instrumentation and the render debug log.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Environment variable naming a render debug log file.
pub const DEBUG_LOG_ENV: &str = "SNAPNOTE_RENDER_DEBUG_LOG";

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOGGER: LazyLock<Mutex<DebugLogger>> =
    LazyLock::new(|| Mutex::new(DebugLogger::new()));

/// Timing guard. Reports on drop when timing is enabled.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        if is_enabled() {
            eprintln!("[perf] {}: {:.2} ms", self.name, elapsed_ms);
        }
        log_event(self.name, format!("{elapsed_ms:.3} ms"));
    }
}

#[derive(Debug)]
struct DebugLogger {
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLogger {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            writer: None,
        }
    }
}

// Diagram workers log from their own threads; a panic there must not
// silence the log for everyone else.
fn logger() -> MutexGuard<'static, DebugLogger> {
    DEBUG_LOGGER.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// The debug log path from `flag`, else from [`DEBUG_LOG_ENV`].
pub fn debug_log_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(DEBUG_LOG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Start writing the debug log to `path`, or stop when `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut logger = logger();
    let Some(path) = path else {
        if let Some(writer) = logger.writer.as_mut() {
            writer.flush()?;
        }
        logger.writer = None;
        return Ok(());
    };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "snapnote render debug log start")?;
    writer.flush()?;
    logger.start = Instant::now();
    logger.writer = Some(writer);
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    logger().writer.is_some()
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut logger = logger();
    let elapsed_ms = logger.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = logger.writer.as_mut() {
        let _ = writeln!(
            writer,
            "[{elapsed_ms:>10.3} ms] {name}: {}",
            detail.as_ref()
        );
        let _ = writer.flush();
    }
}
