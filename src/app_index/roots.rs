use std::path::{Path, PathBuf};

/// A directory scanned for launchable entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    pub path: PathBuf,
    /// Only gates the first level below `path`; nested directories always recurse.
    pub recursive: bool,
}

impl RootConfig {
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }

    pub fn recursive(path: impl Into<PathBuf>) -> Self {
        Self::new(path, true)
    }

    pub fn top_level_only(path: impl Into<PathBuf>) -> Self {
        Self::new(path, false)
    }
}

/// Fixed set of roots, established once and iterated in full by every rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSet {
    roots: Vec<RootConfig>,
}

impl RootSet {
    /// Builds the set, keeping the first configuration seen for each path.
    pub fn new(roots: impl IntoIterator<Item = RootConfig>) -> Self {
        let mut unique: Vec<RootConfig> = Vec::new();
        for root in roots {
            if unique.iter().any(|existing| existing.path == root.path) {
                tracing::debug!("Skipping duplicate root {}", root.path.display());
                continue;
            }
            unique.push(root);
        }

        Self { roots: unique }
    }

    #[cfg(target_os = "macos")]
    pub fn platform_default() -> Self {
        Self::new([
            RootConfig::recursive("/Applications"),
            // Catalina moved the bundled applications here
            RootConfig::recursive("/System/Applications"),
            RootConfig::recursive("/usr/local/bin"),
            RootConfig::top_level_only("/System/Library/CoreServices"),
        ])
    }

    #[cfg(not(target_os = "macos"))]
    pub fn platform_default() -> Self {
        let mut roots = vec![RootConfig::recursive("/usr/share/applications")];
        if let Some(home) = std::env::var_os("HOME") {
            roots.push(RootConfig::recursive(
                Path::new(&home).join(".local/share/applications"),
            ));
        }
        roots.push(RootConfig::recursive("/usr/local/bin"));
        roots.push(RootConfig::top_level_only("/usr/bin"));

        Self::new(roots)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RootConfig> {
        self.roots.iter()
    }

    pub fn as_slice(&self) -> &[RootConfig] {
        &self.roots
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.roots.iter().map(|root| root.path.clone()).collect()
    }

    pub fn is_recursive(&self, path: &Path) -> Option<bool> {
        self.roots
            .iter()
            .find(|root| root.path == path)
            .map(|root| root.recursive)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl FromIterator<RootConfig> for RootSet {
    fn from_iter<I: IntoIterator<Item = RootConfig>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_roots_keep_first_configuration() {
        let roots = RootSet::new([
            RootConfig::recursive("/Apps"),
            RootConfig::top_level_only("/usr/local/bin"),
            RootConfig::top_level_only("/Apps"),
        ]);

        assert_eq!(roots.len(), 2);
        assert_eq!(roots.is_recursive(Path::new("/Apps")), Some(true));
        assert_eq!(roots.is_recursive(Path::new("/usr/local/bin")), Some(false));
        assert_eq!(roots.is_recursive(Path::new("/nowhere")), None);
    }

    #[test]
    fn test_platform_default_has_exactly_one_top_level_only_root() {
        let roots = RootSet::platform_default();

        assert!(roots.is_recursive(Path::new("/usr/local/bin")).unwrap_or(false));
        assert_eq!(roots.iter().filter(|root| !root.recursive).count(), 1);
    }
}
