use crate::error::{Error, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::core::{AppIndex, RebuildStats};
use super::roots::RootSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildRequest {
    Startup,
    Changed(Vec<PathBuf>),
    Manual,
    Shutdown,
}

/// Called on the worker thread after every published rebuild.
pub type RebuildListener = Box<dyn Fn(&RebuildStats) + Send + 'static>;

/// Which roots ended up with a live change subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchStatus {
    pub watched: Vec<PathBuf>,
    /// Still scanned on every rebuild, but changes under them go unnoticed.
    pub unwatched: Vec<PathBuf>,
}

/// Single rebuild worker fed by filesystem notifications and manual requests.
pub struct BackgroundWatcher {
    requests: Sender<RebuildRequest>,
    debouncer: Option<Debouncer<RecommendedWatcher>>,
    status: WatchStatus,
    is_scanning: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for BackgroundWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundWatcher")
            .field("status", &self.status)
            .field("is_scanning", &self.is_scanning())
            .finish_non_exhaustive()
    }
}

impl BackgroundWatcher {
    /// Starts the rebuild worker, queues the startup rebuild and, when `watch`
    /// is set, subscribes to changes under every root.
    pub fn spawn(
        index: Arc<AppIndex>,
        debounce: Duration,
        watch: bool,
        listener: Option<RebuildListener>,
    ) -> Result<Self> {
        let (requests, receiver) = mpsc::channel();
        let is_scanning = Arc::new(AtomicBool::new(false));

        let handle = thread::Builder::new()
            .name("applist-rebuild".to_string())
            .spawn({
                let index = Arc::clone(&index);
                let is_scanning = Arc::clone(&is_scanning);
                move || run_rebuild_worker(&index, receiver, &is_scanning, listener)
            })
            .map_err(Error::WorkerSpawn)?;

        // The receiver is alive until the worker sees Shutdown, so this cannot fail yet
        let _ = requests.send(RebuildRequest::Startup);

        let (debouncer, status) = if watch {
            subscribe_roots(index.roots(), debounce, requests.clone())
        } else {
            info!("WATCH_DISABLED: Index will only be rebuilt on request");
            let status = WatchStatus {
                watched: Vec::new(),
                unwatched: index.roots().paths(),
            };
            (None, status)
        };

        Ok(Self {
            requests,
            debouncer,
            status,
            is_scanning,
            handle: Some(handle),
        })
    }

    /// Queues a full rebuild. Returns false once the worker has stopped.
    pub fn request_rebuild(&self) -> bool {
        self.requests.send(RebuildRequest::Manual).is_ok()
    }

    pub fn status(&self) -> &WatchStatus {
        &self.status
    }

    #[inline]
    pub fn is_scanning(&self) -> bool {
        self.is_scanning.load(Ordering::Relaxed)
    }

    /// Stops notifications, lets the worker finish its current rebuild and
    /// waits for it to exit.
    pub fn shutdown(&mut self) {
        self.debouncer.take();

        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.requests.send(RebuildRequest::Shutdown);
        if handle.join().is_err() {
            error!("Rebuild worker panicked");
        }
        info!("WATCH_STOPPED: Rebuild worker exited");
    }
}

impl Drop for BackgroundWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn subscribe_roots(
    roots: &RootSet,
    debounce: Duration,
    requests: Sender<RebuildRequest>,
) -> (Option<Debouncer<RecommendedWatcher>>, WatchStatus) {
    let mut status = WatchStatus::default();

    let mut debouncer = match new_debouncer(debounce, move |result: DebounceEventResult| {
        match result {
            Ok(events) => {
                let paths: Vec<PathBuf> = events.into_iter().map(|event| event.path).collect();
                debug!(?paths, "File watcher event");
                let _ = requests.send(RebuildRequest::Changed(paths));
            }
            Err(e) => {
                // Events may have been dropped, so rebuild anyway
                error!("File watcher error: {:?}", e);
                let _ = requests.send(RebuildRequest::Changed(Vec::new()));
            }
        }
    }) {
        Ok(debouncer) => debouncer,
        Err(e) => {
            error!("Failed to create debouncer, roots will not be watched: {:?}", e);
            status.unwatched = roots.paths();
            return (None, status);
        }
    };

    for root in roots.iter() {
        let mode = if root.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        match debouncer.watcher().watch(&root.path, mode) {
            Ok(()) => {
                debug!("Started watching: {}", root.path.display());
                status.watched.push(root.path.clone());
            }
            Err(source) => {
                let error = Error::WatchSubscription {
                    path: root.path.clone(),
                    source,
                };
                warn!("{}; changes under it will not trigger rebuilds", error);
                status.unwatched.push(root.path.clone());
            }
        }
    }

    info!(
        "WATCH_START: Watching {} roots ({} unwatched)",
        status.watched.len(),
        status.unwatched.len()
    );

    (Some(debouncer), status)
}

/// Rebuilds once per batch of pending requests until Shutdown arrives or every
/// sender is gone. A request received here is always followed by a rebuild
/// that starts after it.
fn run_rebuild_worker(
    index: &AppIndex,
    receiver: Receiver<RebuildRequest>,
    is_scanning: &AtomicBool,
    listener: Option<RebuildListener>,
) {
    while let Ok(request) = receiver.recv() {
        if request == RebuildRequest::Shutdown {
            break;
        }

        let mut coalesced = 0usize;
        let mut shutdown = false;
        for pending in receiver.try_iter() {
            if pending == RebuildRequest::Shutdown {
                shutdown = true;
                break;
            }
            coalesced += 1;
        }
        if shutdown {
            break;
        }

        debug!(?request, coalesced, "REBUILD_REQUEST: Handling rebuild request");

        is_scanning.store(true, Ordering::Relaxed);
        let stats = index.rebuild();
        is_scanning.store(false, Ordering::Relaxed);

        if let Some(listener) = &listener {
            listener(&stats);
        }
    }

    debug!("Rebuild worker loop finished");
}
