use applist::app_index::RebuildListener;
use applist::{AppListProvider, IndexConfig, ListProvider, RebuildStats, SystemLauncher};
use mimalloc::MiMalloc;
use std::sync::{mpsc, Arc};
use std::time::Duration;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() {
    if let Err(e) = applist::log::init_stderr_tracing("info") {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config = IndexConfig::default();
    println!("Watching {} roots:", config.roots.len());
    for root in config.roots.iter() {
        println!(
            "  {} ({})",
            root.path.display(),
            if root.recursive { "recursive" } else { "top level" }
        );
    }

    let (rebuilt_tx, rebuilt_rx) = mpsc::channel::<RebuildStats>();
    let listener: RebuildListener = Box::new(move |stats: &RebuildStats| {
        let _ = rebuilt_tx.send(*stats);
    });

    let mut provider = match AppListProvider::with_launcher(
        config,
        Arc::new(SystemLauncher),
        Some(listener),
    ) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    for path in &provider.watch_status().unwatched {
        println!("Not watching {} (changes there need a restart)", path.display());
    }

    let (stop_tx, stop_rx) = mpsc::channel();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    }) {
        eprintln!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut first = true;
    loop {
        if stop_rx.try_recv().is_ok() {
            break;
        }

        match rebuilt_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(stats) => {
                println!(
                    "generation {}: {} entries ({} unreadable) in {:?}",
                    stats.generation, stats.entries, stats.unreadable, stats.duration
                );
                if first {
                    for item in provider.get() {
                        let payload = item
                            .payload
                            .as_ref()
                            .map(|path| path.display().to_string())
                            .unwrap_or_default();
                        println!("  {:<40} {}", item.name, payload);
                    }
                    first = false;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    println!("Shutting down");
    provider.stop_background_monitor();
}
