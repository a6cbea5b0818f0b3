// Launchable entry index: roots, scanning, snapshots and change watching

pub mod core;
pub mod roots;
pub mod scanner;
pub mod watcher;

pub use self::core::{AppIndex, IndexSnapshot, RebuildStats};
pub use roots::{RootConfig, RootSet};
pub use scanner::{classify, scan_root, EntryClass, ScanOutcome};
pub use watcher::{BackgroundWatcher, RebuildListener, RebuildRequest, WatchStatus};
