use crate::types::Entry;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use super::roots::RootSet;
use super::scanner::{scan_root, ScanOutcome};

/// One complete rebuild result. Never mutated after it is published.
#[derive(Debug)]
pub struct IndexSnapshot {
    pub entries: Vec<Entry>,
    pub generation: u64,
    pub built_at: SystemTime,
    /// Directories that could not be read while building this snapshot.
    pub unreadable: usize,
}

impl IndexSnapshot {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            generation: 0,
            built_at: SystemTime::UNIX_EPOCH,
            unreadable: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildStats {
    pub generation: u64,
    pub entries: usize,
    pub duplicates: usize,
    pub unreadable: usize,
    pub duration: Duration,
}

/// Owns the published snapshot of launchable entries.
///
/// Rebuilds scan outside of any lock and only take the write lock to swap the
/// `Arc`, so readers never wait on a scan in progress.
#[derive(Debug)]
pub struct AppIndex {
    roots: RootSet,
    bundle_suffix: String,
    published: RwLock<Arc<IndexSnapshot>>,
    rebuild_lock: Mutex<u64>,
}

impl AppIndex {
    pub fn new(roots: RootSet, bundle_suffix: impl Into<String>) -> Self {
        Self {
            roots,
            bundle_suffix: bundle_suffix.into(),
            published: RwLock::new(Arc::new(IndexSnapshot::empty())),
            rebuild_lock: Mutex::new(0),
        }
    }

    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    pub fn bundle_suffix(&self) -> &str {
        &self.bundle_suffix
    }

    /// Scans every root and publishes the result as the next snapshot.
    ///
    /// Concurrent calls run one after another. Unreadable directories only
    /// shrink the result, they never stop it from being published.
    pub fn rebuild(&self) -> RebuildStats {
        let mut generation = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let rebuild_start = std::time::Instant::now();
        info!("REBUILD_START: Scanning {} roots", self.roots.len());

        let outcomes: Vec<ScanOutcome> = self
            .roots
            .as_slice()
            .par_iter()
            .map(|root| scan_root(root, &self.bundle_suffix))
            .collect();

        let unreadable = outcomes.iter().map(|outcome| outcome.errors.len()).sum();
        let (entries, duplicates) = merge_outcomes(outcomes);

        *generation = generation.wrapping_add(1);
        let snapshot = IndexSnapshot {
            entries,
            generation: *generation,
            built_at: SystemTime::now(),
            unreadable,
        };
        let stats = RebuildStats {
            generation: snapshot.generation,
            entries: snapshot.entries.len(),
            duplicates,
            unreadable,
            duration: rebuild_start.elapsed(),
        };

        self.publish(snapshot);

        info!(
            "REBUILD_COMPLETE: generation {} with {} entries ({} duplicates dropped, {} unreadable) in {:?}",
            stats.generation, stats.entries, stats.duplicates, stats.unreadable, stats.duration
        );
        stats
    }

    fn publish(&self, snapshot: IndexSnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut published = self
            .published
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *published = snapshot;
    }

    /// Latest published snapshot. The write side only ever holds the lock for
    /// a pointer swap.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        let published = self
            .published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&published)
    }

    pub fn current_entries(&self) -> Vec<Entry> {
        self.snapshot().entries.clone()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }
}

/// Concatenates per-root results in root order, keeping the first entry seen
/// for each location.
fn merge_outcomes(outcomes: Vec<ScanOutcome>) -> (Vec<Entry>, usize) {
    let capacity = outcomes.iter().map(|outcome| outcome.entries.len()).sum();
    let mut seen = HashSet::with_capacity(capacity);
    let mut merged = Vec::with_capacity(capacity);
    let mut duplicates = 0;

    for entry in outcomes.into_iter().flat_map(|outcome| outcome.entries) {
        if seen.insert(entry.location.clone()) {
            merged.push(entry);
        } else {
            debug!("Dropping duplicate entry {}", entry.location.display());
            duplicates += 1;
        }
    }

    (merged, duplicates)
}
