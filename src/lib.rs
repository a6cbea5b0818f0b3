//! applist - index of launchable applications
//!
//! Scans a fixed set of root directories for application bundles and bare
//! executables, republishes the list whenever something under a root changes,
//! and hands it to a search/launch front end through [`ListProvider`].

pub mod app_index;
mod app_list_provider;
pub mod config;
mod error;
pub mod launcher;
pub mod log;
pub mod types;

pub use app_index::{AppIndex, IndexSnapshot, RebuildStats, RootConfig, RootSet, WatchStatus};
pub use app_list_provider::{AppListProvider, ListProvider};
pub use config::IndexConfig;
pub use error::{Error, Result};
pub use launcher::{Launcher, SystemLauncher};
pub use types::{Entry, ListItem};
