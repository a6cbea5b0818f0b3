use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// A launchable unit found under one of the configured roots.
///
/// Two entries are equal when they point at the same location, whatever
/// their display names say.
#[derive(Debug, Clone, Eq)]
pub struct Entry {
    pub display_name: String,
    pub location: PathBuf,
}

impl Entry {
    #[inline]
    pub fn new(location: PathBuf) -> Self {
        let display_name = location
            .file_stem()
            .unwrap_or_else(|| location.as_os_str())
            .to_string_lossy()
            .into_owned();

        Self {
            display_name,
            location,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        self.location.extension().and_then(|ext| ext.to_str())
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.hash(state);
    }
}

/// What the search/UI layer gets to render and hand back on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub name: String,
    pub payload: Option<PathBuf>,
}

impl ListItem {
    pub fn new(name: impl Into<String>, payload: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Absolute location carried by this item, if there is a usable one.
    pub fn location(&self) -> Option<&Path> {
        self.payload
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty() && path.is_absolute())
    }
}

impl From<&Entry> for ListItem {
    fn from(entry: &Entry) -> Self {
        ListItem {
            name: entry.display_name.clone(),
            payload: Some(entry.location.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display_name_strips_bundle_suffix() {
        let entry = Entry::new(PathBuf::from("/Applications/Safari.app"));
        assert_eq!(entry.display_name, "Safari");
        assert_eq!(entry.extension(), Some("app"));

        let entry = Entry::new(PathBuf::from("/usr/local/bin/rg"));
        assert_eq!(entry.display_name, "rg");
        assert_eq!(entry.extension(), None);

        // Only the last suffix goes away
        let entry = Entry::new(PathBuf::from("/Applications/Foo.Bar.app"));
        assert_eq!(entry.display_name, "Foo.Bar");
    }

    #[test]
    fn test_entry_equality_is_by_location() {
        let a = Entry::new(PathBuf::from("/Apps/Foo.app"));
        let mut b = a.clone();
        b.display_name = "Something else".to_string();
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_list_item_location_rejects_unusable_payloads() {
        assert!(ListItem::new("none", None).location().is_none());
        assert!(ListItem::new("empty", Some(PathBuf::new())).location().is_none());
        assert!(ListItem::new("relative", Some(PathBuf::from("Foo.app")))
            .location()
            .is_none());

        let item = ListItem::new("Foo", Some(PathBuf::from("/Apps/Foo.app")));
        assert_eq!(item.location(), Some(Path::new("/Apps/Foo.app")));
    }
}
