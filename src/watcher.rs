//! File watcher for continuous re-runs.
//!
//! Implements `--watch` with:
//! - A fixed watched-path set computed once at startup
//! - Debouncing (300ms, measured from the last accepted trigger)
//! - A short settle delay before re-reading a changed file
//! - Strictly serialized runs (one completes before the next starts)
//! - Graceful Ctrl+C shutdown

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::JexRunResult;
use crate::output::{self, Format};
use crate::pipeline;

/// Debounce window in milliseconds
const DEBOUNCE_MS: u64 = 300;

/// Delay before re-reading a changed file, so a save in progress has
/// finished by the time the pipeline reads it
const SETTLE_MS: u64 = 100;

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Script to run
    pub script: PathBuf,
    /// Input document, resolved once before the loop starts
    pub input: Option<PathBuf>,
    /// Metadata document, resolved once before the loop starts
    pub meta: Option<PathBuf>,
    /// Output file, if any
    pub output: Option<PathBuf>,
    /// Output format for each run
    pub format: Format,
}

/// Watch events surfaced to the caller; all printing happens there.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Started { script: String },
    Changed { path: String },
    RunStarted,
    RunComplete { success: bool, elapsed_ms: u64 },
    Error { message: String },
    Shutdown,
}

/// Scheduler state: the watched-path set and the debounce clock.
struct WatcherState {
    watched: HashSet<PathBuf>,
    last_accepted: Option<Instant>,
    debounce: Duration,
}

impl WatcherState {
    fn new(watched: HashSet<PathBuf>, debounce: Duration) -> Self {
        Self {
            watched,
            last_accepted: None,
            debounce,
        }
    }

    /// Whether an event path is one of the watched files.
    fn qualifies(&self, path: &Path) -> bool {
        self.watched.contains(&normalize(path))
    }

    /// Debounce check against the last accepted trigger. Accepting stamps
    /// the clock at acceptance, not at run completion.
    fn accept(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.debounce {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

/// Notify reports canonical paths on some platforms; compare in canonical
/// form when the file still exists.
fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Start watching for changes. Runs once immediately, then re-runs on each
/// accepted change event until `running` is cleared.
pub fn watch(
    options: WatchOptions,
    running: Arc<AtomicBool>,
    event_callback: impl Fn(WatchEvent),
) -> JexRunResult<()> {
    let mut watched = HashSet::new();
    watched.insert(normalize(&options.script));
    if let Some(input) = options.input.as_deref().filter(|p| p.is_file()) {
        watched.insert(normalize(input));
    }
    if let Some(meta) = options.meta.as_deref().filter(|p| p.is_file()) {
        watched.insert(normalize(meta));
    }

    event_callback(WatchEvent::Started {
        script: options.script.display().to_string(),
    });

    // Baseline run before any change event.
    run_once(&options, &event_callback);

    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        },
        Config::default(),
    )?;

    let watch_dir = match options.script.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

    let mut state = WatcherState::new(watched, Duration::from_millis(DEBOUNCE_MS));

    while running.load(Ordering::SeqCst) {
        // Check for change events (non-blocking with timeout)
        if let Ok(path) = rx.recv_timeout(Duration::from_millis(50)) {
            if !state.qualifies(&path) {
                continue;
            }
            if !state.accept() {
                continue;
            }
            event_callback(WatchEvent::Changed {
                path: path.display().to_string(),
            });
            std::thread::sleep(Duration::from_millis(SETTLE_MS));
            run_once(&options, &event_callback);
        }
    }

    event_callback(WatchEvent::Shutdown);
    Ok(())
}

/// One pipeline+emit cycle. A failure to emit (e.g. the output file is
/// momentarily unwritable) is reported through the callback and the loop
/// keeps going; only external interruption ends a watch session.
fn run_once(options: &WatchOptions, callback: &impl Fn(WatchEvent)) {
    callback(WatchEvent::RunStarted);

    let result = pipeline::run(
        &options.script,
        options.input.as_deref(),
        options.meta.as_deref(),
    );
    if let Err(err) = output::emit(&result, options.format, options.output.as_deref()) {
        callback(WatchEvent::Error {
            message: err.to_string(),
        });
        return;
    }

    callback(WatchEvent::RunComplete {
        success: result.success,
        elapsed_ms: result.execution_time_ms,
    });
}
