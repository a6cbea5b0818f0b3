use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Directory {} could not be read: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("Cannot do action on item {name}")]
    InvalidActionPayload { name: String },

    #[error("Failed to watch {}: {source}", path.display())]
    WatchSubscription {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Failed to launch {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to spawn rebuild worker: {0}")]
    WorkerSpawn(std::io::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
