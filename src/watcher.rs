//! File watcher for continuous rebuilds
//!
//! Registers one notify watcher over every watch-task path, coalesces change
//! bursts with a short debounce, and re-runs the mapped build task when
//! matching files change. The loop runs until SIGINT or SIGTERM.

use crate::error::Result;
use crate::models::WatchConfig;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Debounce duration in milliseconds
const DEBOUNCE_MS: u64 = 100;

/// Poll interval for the debounce check
const POLL_MS: u64 = 50;

/// A registered watch: filesystem filter plus the build task it re-triggers
#[derive(Debug, Clone)]
pub struct WatchSpec {
    /// Name of the watch task (for logging)
    pub task_name: String,
    /// Build task re-run when a matching file changes
    pub run: String,
    /// Watched directories, resolved against the project root
    pub paths: Vec<PathBuf>,
    /// File extensions that trigger a rebuild; empty matches everything
    pub extensions: Vec<String>,
}

impl WatchSpec {
    pub fn from_config(task_name: &str, config: &WatchConfig, project_root: &Path) -> Self {
        Self {
            task_name: task_name.to_string(),
            run: config.run.clone(),
            paths: config
                .paths
                .iter()
                .map(|p| project_root.join(p))
                .collect(),
            extensions: config.extensions.clone(),
        }
    }

    /// Whether a changed path falls inside this spec's scope and filter
    fn matches(&self, path: &Path) -> bool {
        if !self.paths.iter().any(|root| path.starts_with(root)) {
            return false;
        }

        if self.extensions.is_empty() {
            return true;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|want| want == ext))
            .unwrap_or(false)
    }
}

/// Pending-change set with debouncing
struct DebounceState {
    pending: HashSet<PathBuf>,
    last_change: Option<Instant>,
}

impl DebounceState {
    fn new() -> Self {
        Self {
            pending: HashSet::new(),
            last_change: None,
        }
    }

    fn add(&mut self, path: PathBuf) {
        self.pending.insert(path);
        self.last_change = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        match self.last_change {
            Some(last) => {
                !self.pending.is_empty() && last.elapsed() >= Duration::from_millis(DEBOUNCE_MS)
            }
            None => false,
        }
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_change = None;
        self.pending.drain().collect()
    }
}

/// Run the watch loop until a shutdown signal arrives.
///
/// `rebuild` is invoked with the names of the build tasks whose watch specs
/// matched at least one changed path; rebuild failures must be handled by
/// the callback so the loop keeps running.
pub async fn watch_loop<F, Fut>(specs: &[WatchSpec], mut rebuild: F) -> Result<()>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        },
        Config::default(),
    )?;

    // Register each watched root once, even when specs overlap
    let mut registered: HashSet<&PathBuf> = HashSet::new();
    for spec in specs {
        for path in &spec.paths {
            if registered.insert(path) {
                watcher.watch(path, RecursiveMode::Recursive)?;
                info!("Watching {} for '{}'", path.display(), spec.task_name);
            }
        }
    }

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let mut state = DebounceState::new();

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, stopping watch");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, stopping watch");
                break;
            }
            maybe_path = rx.recv() => {
                match maybe_path {
                    Some(path) => {
                        if specs.iter().any(|spec| spec.matches(&path)) {
                            debug!("Change detected: {}", path.display());
                            state.add(path);
                        }
                    }
                    None => {
                        warn!("Watch channel closed");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(Duration::from_millis(POLL_MS)) => {}
        }

        if state.ready() {
            let changes = state.take();
            let mut to_run = Vec::new();
            for spec in specs {
                if changes.iter().any(|path| spec.matches(path)) && !to_run.contains(&spec.run) {
                    to_run.push(spec.run.clone());
                }
            }

            if !to_run.is_empty() {
                info!("Rebuilding after {} changed file(s)", changes.len());
                rebuild(to_run).await;
            }
        }
    }

    Ok(())
}
