use crate::app_index::{RootConfig, RootSet};
use std::time::Duration;

#[cfg(target_os = "macos")]
pub const DEFAULT_BUNDLE_SUFFIX: &str = "app";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_BUNDLE_SUFFIX: &str = "desktop";

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// How the provider finds and refreshes its entries.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub roots: RootSet,
    /// Extension that marks a launchable bundle, without the dot.
    pub bundle_suffix: String,
    /// Window over which change notifications are coalesced.
    pub debounce: Duration,
    pub watch: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            roots: RootSet::platform_default(),
            bundle_suffix: DEFAULT_BUNDLE_SUFFIX.to_string(),
            debounce: DEFAULT_DEBOUNCE,
            watch: true,
        }
    }
}

impl IndexConfig {
    pub fn with_roots(roots: impl IntoIterator<Item = RootConfig>) -> Self {
        Self {
            roots: RootSet::new(roots),
            ..Self::default()
        }
    }

    pub fn bundle_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.bundle_suffix = suffix.into().trim_start_matches('.').to_string();
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Index once at startup and afterwards only on explicit rescans.
    pub fn without_watching(mut self) -> Self {
        self.watch = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_builder_overrides() {
        let config = IndexConfig::with_roots([RootConfig::top_level_only("/Apps")])
            .bundle_suffix(".app")
            .debounce(Duration::from_millis(10))
            .without_watching();

        assert_eq!(config.bundle_suffix, "app");
        assert_eq!(config.debounce, Duration::from_millis(10));
        assert!(!config.watch);
        assert_eq!(config.roots.is_recursive(Path::new("/Apps")), Some(false));
    }

    #[test]
    fn test_default_watches_platform_roots() {
        let config = IndexConfig::default();

        assert!(config.watch);
        assert_eq!(config.roots, RootSet::platform_default());
        assert_eq!(config.bundle_suffix, DEFAULT_BUNDLE_SUFFIX);
    }
}
