use crate::error::Error;
use crate::types::Entry;
use ignore::{WalkBuilder, WalkState};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::roots::RootConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    Launchable,
    Ignorable,
    RecurseCandidate,
}

/// Decides what a single directory child is.
///
/// Bundles are launchable even though they are directories, and they are
/// never descended into. Anything without an extension that is not a
/// directory is taken to be a bare executable, except dot-entries such as
/// `.DS_Store`: those are always ignored (and hidden directories are not
/// descended into), even though they have no extension.
pub fn classify(path: &Path, is_dir: bool, bundle_suffix: &str) -> EntryClass {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return EntryClass::Ignorable;
    };

    if name.starts_with('.') {
        return EntryClass::Ignorable;
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(bundle_suffix) => EntryClass::Launchable,
        None if !is_dir => EntryClass::Launchable,
        _ if is_dir => EntryClass::RecurseCandidate,
        _ => EntryClass::Ignorable,
    }
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub entries: Vec<Entry>,
    pub errors: Vec<Error>,
}

/// Walks one root and collects its launchable entries.
///
/// Unreadable directories are logged and contribute nothing; the walk carries
/// on with their siblings. A missing root gives an empty outcome with a single
/// error.
pub fn scan_root(root: &RootConfig, bundle_suffix: &str) -> ScanOutcome {
    let scan_start = std::time::Instant::now();
    debug!(
        "SCAN_ROOT: Scanning {} (recursive: {})",
        root.path.display(),
        root.recursive
    );

    let walk_root = match resolve_walk_root(&root.path) {
        Ok(walk_root) => walk_root,
        Err(error) => {
            warn!("{}", error);
            return ScanOutcome {
                entries: Vec::new(),
                errors: vec![error],
            };
        }
    };

    // Nested directories always recurse, only the first level honours the flag
    let max_depth = if root.recursive { None } else { Some(1) };

    let walker = WalkBuilder::new(&walk_root)
        .standard_filters(false)
        .follow_links(false)
        .max_depth(max_depth)
        .build_parallel();

    let entries = Arc::new(Mutex::new(Vec::with_capacity(64)));
    let errors = Arc::new(Mutex::new(Vec::new()));

    walker.run(|| {
        let entries = Arc::clone(&entries);
        let errors = Arc::clone(&errors);
        let walk_root = walk_root.as_path();

        Box::new(move |result| {
            let entry = match result {
                Ok(entry) => entry,
                Err(source) => {
                    let path = error_path(&source)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| walk_root.to_path_buf());
                    warn!("Skipping unreadable directory {}: {}", path.display(), source);
                    if let Ok(mut errors) = errors.lock() {
                        errors.push(Error::DirectoryUnreadable { path, source });
                    }
                    return WalkState::Continue;
                }
            };

            if entry.depth() == 0 {
                return WalkState::Continue;
            }

            let path = entry.path();
            let is_dir = match entry.file_type() {
                Some(file_type) if file_type.is_symlink() => path.is_dir(),
                Some(file_type) => file_type.is_dir(),
                None => false,
            };

            match classify(path, is_dir, bundle_suffix) {
                EntryClass::Launchable => {
                    let location = relocate(path, walk_root, &root.path);
                    if let Ok(mut entries) = entries.lock() {
                        entries.push(Entry::new(location));
                    }
                    if is_dir {
                        WalkState::Skip
                    } else {
                        WalkState::Continue
                    }
                }
                EntryClass::RecurseCandidate => WalkState::Continue,
                EntryClass::Ignorable if is_dir => WalkState::Skip,
                EntryClass::Ignorable => WalkState::Continue,
            }
        })
    });

    let entries = take_collected(entries);
    let errors = take_collected(errors);

    info!(
        "SCAN_ROOT: {} yielded {} entries ({} unreadable) in {:?}",
        root.path.display(),
        entries.len(),
        errors.len(),
        scan_start.elapsed()
    );

    ScanOutcome { entries, errors }
}

/// The walker does not follow a symlinked root, so walk its target instead
/// and map the results back under the configured path.
fn resolve_walk_root(path: &Path) -> Result<PathBuf, Error> {
    let unreadable = |source: std::io::Error| Error::DirectoryUnreadable {
        path: path.to_path_buf(),
        source: ignore::Error::from(source),
    };

    let metadata = fs::symlink_metadata(path).map_err(unreadable)?;
    let walk_root = if metadata.file_type().is_symlink() {
        fs::canonicalize(path).map_err(unreadable)?
    } else {
        path.to_path_buf()
    };

    if !walk_root.is_dir() {
        return Err(unreadable(std::io::Error::other("root is not a directory")));
    }

    Ok(walk_root)
}

fn relocate(path: &Path, walk_root: &Path, configured_root: &Path) -> PathBuf {
    if walk_root == configured_root {
        return path.to_path_buf();
    }
    match path.strip_prefix(walk_root) {
        Ok(relative) => configured_root.join(relative),
        Err(_) => path.to_path_buf(),
    }
}

fn error_path(error: &ignore::Error) -> Option<&Path> {
    match error {
        ignore::Error::WithPath { path, .. } => Some(path),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

fn take_collected<T>(collected: Arc<Mutex<Vec<T>>>) -> Vec<T> {
    match Arc::try_unwrap(collected) {
        Ok(mutex) => mutex
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner()),
        Err(shared) => match shared.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        },
    }
}
