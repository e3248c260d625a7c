use crate::config::Config;
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Watches `config_path` and swaps `shared` whenever the file is modified.
///
/// The watch is registered before this returns. `lookup` supplies the
/// environment overrides re-applied on every reload; a file that fails to
/// load leaves the previous config in place.
pub fn spawn_config_watcher<F>(
    config_path: String,
    shared: Arc<RwLock<Config>>,
    lookup: F,
) -> anyhow::Result<JoinHandle<()>>
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    let (tx, mut rx) = mpsc::channel(100);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            if let Err(e) = tx.blocking_send(event) {
                eprintln!("Failed to send event: {}", e);
            }
        }
    })?;
    watcher.watch(Path::new(&config_path), RecursiveMode::NonRecursive)?;

    Ok(tokio::spawn(async move {
        // Dropping the watcher ends the event stream
        let _watcher = watcher;
        while let Some(event) = rx.recv().await {
            if let EventKind::Modify(_) = event.kind {
                info!("Config file modified, attempting to reload");
                match Config::load_with(Some(config_path.as_str()), &lookup) {
                    Ok(new_config) => {
                        *shared.write().await = new_config;
                        info!("Configuration reloaded successfully");
                    }
                    Err(e) => {
                        error!("Failed to reload configuration, keeping previous: {}", e);
                    }
                }
            }
        }
    }))
}
