//! Filesystem watcher for the plugin directory
//!
//! Manifest create/modify/delete events are debounced and turned into
//! registry reloads.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer, notify::RecursiveMode, DebounceEventResult, Debouncer, RecommendedCache,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::registry::PluginRegistry;
use crate::application::errors::PluginError;

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches the plugin directory; must be kept alive for events to flow
pub struct PluginWatcher {
    _debouncer: Debouncer<notify_debouncer_full::notify::RecommendedWatcher, RecommendedCache>,
}

impl PluginWatcher {
    /// Start watching `dir`. Returns the watcher and a receiver that yields
    /// one unit per debounced batch containing manifest changes.
    pub fn start(dir: &Path) -> Result<(Self, mpsc::UnboundedReceiver<()>), PluginError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(DEBOUNCE, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    use notify_debouncer_full::notify::EventKind;

                    let changed = events.iter().any(|event| {
                        matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        ) && event.paths.iter().any(|p| is_manifest_path(p))
                    });
                    if changed {
                        debug!("plugin watcher: manifest change detected");
                        let _ = tx.send(());
                    }
                }
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "plugin watcher error");
                    }
                }
            }
        })
        .map_err(|e| PluginError::Watch(e.to_string()))?;

        debouncer
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|e| PluginError::Watch(e.to_string()))?;
        info!(dir = %dir.display(), "plugin watcher: watching directory");

        Ok((Self { _debouncer: debouncer }, rx))
    }
}

/// Reload the registry for every change notification until the channel closes
pub async fn reload_on_change(registry: Arc<PluginRegistry>, mut changes: mpsc::UnboundedReceiver<()>) {
    while changes.recv().await.is_some() {
        // coalesce bursts that arrived while the previous reload ran
        while changes.try_recv().is_ok() {}

        let registry = Arc::clone(&registry);
        match tokio::task::spawn_blocking(move || registry.reload()).await {
            Ok(Ok(report)) => info!(
                loaded = report.loaded,
                failed = report.failed,
                "plugins reloaded after change"
            ),
            Ok(Err(e)) => warn!(error = %e, "plugin reload after change failed"),
            Err(e) => warn!(error = %e, "plugin reload task panicked"),
        }
    }
}

fn is_manifest_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_path_filter() {
        assert!(is_manifest_path(Path::new("plugins/group/kick.yaml")));
        assert!(is_manifest_path(Path::new("plugins/group/kick.yml")));
        assert!(!is_manifest_path(Path::new("plugins/group/kick.yaml.swp")));
        assert!(!is_manifest_path(Path::new("plugins/group")));
    }

    #[tokio::test]
    async fn test_reload_on_change_stops_when_channel_closes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("system")).unwrap();
        let registry = Arc::new(PluginRegistry::new(
            dir.path(),
            Arc::new(crate::plugins::HandlerCatalog::new()),
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        drop(tx);

        reload_on_change(Arc::clone(&registry), rx).await;
        assert_eq!(registry.report().attempted, 0);
        assert!(registry.is_empty());
    }
}
