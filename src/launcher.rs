use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, warn};

/// Platform side of activating an entry. The provider only decides which of
/// the two calls to make.
pub trait Launcher: Send + Sync + 'static {
    /// Opens a plain path with whatever handles it (bare executables included).
    fn open_file(&self, path: &Path) -> io::Result<()>;

    fn launch_application(&self, path: &Path) -> io::Result<()>;
}

/// Spawns the platform opener and returns without waiting for it. Exited
/// children are reaped in the background.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    #[cfg(target_os = "macos")]
    fn open_file(&self, path: &Path) -> io::Result<()> {
        spawn_detached(Command::new("open").arg(path))
    }

    #[cfg(not(target_os = "macos"))]
    fn open_file(&self, path: &Path) -> io::Result<()> {
        if is_executable(path) {
            spawn_detached(&mut Command::new(path))
        } else {
            spawn_detached(Command::new("xdg-open").arg(path))
        }
    }

    #[cfg(target_os = "macos")]
    fn launch_application(&self, path: &Path) -> io::Result<()> {
        spawn_detached(Command::new("open").arg("-a").arg(path))
    }

    #[cfg(not(target_os = "macos"))]
    fn launch_application(&self, path: &Path) -> io::Result<()> {
        let is_desktop_entry = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("desktop"));

        if is_desktop_entry {
            spawn_detached(Command::new("gio").arg("launch").arg(path))
        } else {
            spawn_detached(Command::new("xdg-open").arg(path))
        }
    }
}

fn spawn_detached(command: &mut Command) -> io::Result<()> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let pid = child.id();
    debug!("Spawned {:?} as pid {}", command.get_program(), pid);

    thread::Builder::new()
        .name("applist-reap".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => debug!("pid {} exited with {}", pid, status),
            Err(e) => warn!("Failed to wait for pid {}: {}", pid, e),
        })?;
    Ok(())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
