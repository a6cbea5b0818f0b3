use crate::app_index::{
    AppIndex, BackgroundWatcher, IndexSnapshot, RebuildListener, WatchStatus,
};
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::launcher::{Launcher, SystemLauncher};
use crate::types::ListItem;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// What the search/UI layer consumes.
pub trait ListProvider {
    fn get(&self) -> Vec<ListItem>;

    fn do_action(&self, item: &ListItem) -> Result<()>;
}

/// Launchable applications found under the configured roots, kept fresh by a
/// background watcher.
pub struct AppListProvider {
    index: Arc<AppIndex>,
    watcher: BackgroundWatcher,
    launcher: Arc<dyn Launcher>,
}

impl std::fmt::Debug for AppListProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppListProvider")
            .field("roots", self.index.roots())
            .field("watcher", &self.watcher)
            .finish_non_exhaustive()
    }
}

impl AppListProvider {
    pub fn new(config: IndexConfig) -> Result<Self> {
        Self::with_launcher(config, Arc::new(SystemLauncher), None)
    }

    /// The first snapshot is built on the background worker; until it lands
    /// `get()` returns an empty list.
    pub fn with_launcher(
        config: IndexConfig,
        launcher: Arc<dyn Launcher>,
        listener: Option<RebuildListener>,
    ) -> Result<Self> {
        info!(
            "Initializing AppListProvider with {} roots (bundle suffix: {:?})",
            config.roots.len(),
            config.bundle_suffix
        );

        let index = Arc::new(AppIndex::new(config.roots, config.bundle_suffix));
        let watcher =
            BackgroundWatcher::spawn(Arc::clone(&index), config.debounce, config.watch, listener)?;

        Ok(Self {
            index,
            watcher,
            launcher,
        })
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.index.generation()
    }

    /// Queues a full rebuild on the background worker.
    pub fn trigger_rescan(&self) -> bool {
        let queued = self.watcher.request_rebuild();
        if queued {
            info!("Manual rescan queued");
        }
        queued
    }

    #[inline]
    pub fn is_scan_active(&self) -> bool {
        self.watcher.is_scanning()
    }

    pub fn watch_status(&self) -> &WatchStatus {
        self.watcher.status()
    }

    pub fn stop_background_monitor(&mut self) {
        self.watcher.shutdown();
    }

    fn launch(&self, name: &str, location: &Path) -> Result<()> {
        let has_extension = location
            .extension()
            .is_some_and(|extension| !extension.is_empty());

        if !has_extension {
            debug!("Opening {} as file", location.display());
            return self.launcher.open_file(location).map_err(|source| {
                let error = Error::Launch {
                    path: location.to_path_buf(),
                    source,
                };
                error!("{}", error);
                error
            });
        }

        debug!("Launching {} as application", location.display());
        let launcher = Arc::clone(&self.launcher);
        let path = location.to_path_buf();
        let name = name.to_string();
        thread::Builder::new()
            .name("applist-launch".to_string())
            .spawn(move || {
                if let Err(source) = launcher.launch_application(&path) {
                    error!("{} ({})", Error::Launch { path, source }, name);
                }
            })?;

        Ok(())
    }
}

impl ListProvider for AppListProvider {
    fn get(&self) -> Vec<ListItem> {
        self.index.snapshot().entries.iter().map(ListItem::from).collect()
    }

    fn do_action(&self, item: &ListItem) -> Result<()> {
        let Some(location) = item.location() else {
            let error = Error::InvalidActionPayload {
                name: item.name.clone(),
            };
            error!("{}", error);
            return Err(error);
        };

        self.launch(&item.name, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_index::RootConfig;
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Sender};
    use std::sync::Mutex;
    use std::thread::ThreadId;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        OpenFile(PathBuf),
        LaunchApplication(PathBuf),
    }

    struct RecordingLauncher {
        calls: Mutex<Sender<(Call, ThreadId)>>,
    }

    impl Launcher for RecordingLauncher {
        fn open_file(&self, path: &Path) -> std::io::Result<()> {
            let call = (Call::OpenFile(path.to_path_buf()), thread::current().id());
            let _ = self.calls.lock().unwrap().send(call);
            Ok(())
        }

        fn launch_application(&self, path: &Path) -> std::io::Result<()> {
            let call = (
                Call::LaunchApplication(path.to_path_buf()),
                thread::current().id(),
            );
            let _ = self.calls.lock().unwrap().send(call);
            Ok(())
        }
    }

    struct FailingLauncher;

    impl Launcher for FailingLauncher {
        fn open_file(&self, _path: &Path) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no handler"))
        }

        fn launch_application(&self, _path: &Path) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no handler"))
        }
    }

    fn recording_provider(
        roots: Vec<RootConfig>,
    ) -> (AppListProvider, mpsc::Receiver<(Call, ThreadId)>) {
        let (tx, rx) = mpsc::channel();
        let launcher = Arc::new(RecordingLauncher {
            calls: Mutex::new(tx),
        });
        let config = IndexConfig::with_roots(roots)
            .bundle_suffix("app")
            .without_watching();
        let provider = AppListProvider::with_launcher(config, launcher, None).unwrap();
        (provider, rx)
    }

    fn wait_for_generation(provider: &AppListProvider, generation: u64) {
        let start = Instant::now();
        while provider.generation() < generation {
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "timed out waiting for generation {}",
                generation
            );
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_get_maps_top_level_entries() {
        let dir = TempDir::new().unwrap();
        let apps = dir.path().join("Apps");
        std::fs::create_dir_all(apps.join("Foo.app")).unwrap();
        std::fs::create_dir_all(apps.join("Sub/Bar.app")).unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("mytool"), b"").unwrap();

        let (provider, _calls) = recording_provider(vec![
            RootConfig::top_level_only(&apps),
            RootConfig::top_level_only(&bin),
        ]);
        wait_for_generation(&provider, 1);

        let mut items = provider.get();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            items,
            vec![
                ListItem::new("Foo", Some(apps.join("Foo.app"))),
                ListItem::new("mytool", Some(bin.join("mytool"))),
            ]
        );
    }

    #[test]
    fn test_do_action_without_extension_opens_file_on_caller_thread() {
        let (provider, calls) = recording_provider(Vec::new());
        let item = ListItem::new("mytool", Some(PathBuf::from("/usr/local/bin/mytool")));

        provider.do_action(&item).unwrap();

        let (call, thread_id) = calls.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(call, Call::OpenFile(PathBuf::from("/usr/local/bin/mytool")));
        assert_eq!(thread_id, thread::current().id());
    }

    #[test]
    fn test_do_action_with_extension_launches_off_caller_thread() {
        let (provider, calls) = recording_provider(Vec::new());
        let item = ListItem::new("Foo", Some(PathBuf::from("/Apps/Foo.app")));

        provider.do_action(&item).unwrap();

        let (call, thread_id) = calls.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(call, Call::LaunchApplication(PathBuf::from("/Apps/Foo.app")));
        assert_ne!(thread_id, thread::current().id());
    }

    #[test]
    fn test_do_action_rejects_bad_payload() {
        let (provider, calls) = recording_provider(Vec::new());

        for item in [
            ListItem::new("Nothing", None),
            ListItem::new("Relative", Some(PathBuf::from("Foo.app"))),
        ] {
            let result = provider.do_action(&item);
            assert!(matches!(
                result,
                Err(Error::InvalidActionPayload { ref name }) if name == &item.name
            ));
        }
        assert!(calls.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_do_action_reports_failed_open() {
        let config = IndexConfig::with_roots(Vec::new()).without_watching();
        let provider =
            AppListProvider::with_launcher(config, Arc::new(FailingLauncher), None).unwrap();
        let item = ListItem::new("mytool", Some(PathBuf::from("/usr/local/bin/mytool")));

        let result = provider.do_action(&item);

        match result {
            Err(Error::Launch { path, source }) => {
                assert_eq!(path, PathBuf::from("/usr/local/bin/mytool"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected a launch error, got {:?}", other),
        }
    }

    #[test]
    fn test_trigger_rescan_picks_up_new_entries() {
        let dir = TempDir::new().unwrap();
        let (provider, _calls) = recording_provider(vec![RootConfig::recursive(dir.path())]);
        wait_for_generation(&provider, 1);
        assert!(provider.get().is_empty());

        std::fs::create_dir_all(dir.path().join("Group/New.app")).unwrap();
        assert!(provider.trigger_rescan());
        wait_for_generation(&provider, 2);

        assert_eq!(
            provider.get(),
            vec![ListItem::new("New", Some(dir.path().join("Group/New.app")))]
        );
    }
}
