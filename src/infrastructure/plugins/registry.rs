//! Plugin registry - Publishes the command table built by the loader
//!
//! The table lives behind an `Arc` that is swapped as a whole on reload.
//! Readers clone the `Arc` and never see a half-built table.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use super::loader::{LoadReport, PluginLoader, PluginTable};
use crate::application::errors::PluginError;
use crate::domain::entities::{PluginDescriptor, DEFAULT_COOLDOWN_SECS};
use crate::plugins::HandlerCatalog;

/// Registry for command plugins
pub struct PluginRegistry {
    root: PathBuf,
    default_cooldown: u64,
    catalog: Arc<HandlerCatalog>,
    table: RwLock<Arc<PluginTable>>,
}

impl PluginRegistry {
    /// Empty registry; call `load` to populate it
    pub fn new(root: impl Into<PathBuf>, catalog: Arc<HandlerCatalog>) -> Self {
        Self {
            root: root.into(),
            default_cooldown: DEFAULT_COOLDOWN_SECS,
            catalog,
            table: RwLock::new(Arc::new(PluginTable::default())),
        }
    }

    pub fn with_default_cooldown(mut self, seconds: u64) -> Self {
        self.default_cooldown = seconds;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &HandlerCatalog {
        &self.catalog
    }

    /// Build a fresh table from disk and publish it
    ///
    /// On error the previously published table stays active.
    pub fn load(&self) -> Result<LoadReport, PluginError> {
        let table = PluginLoader::new(&self.root)
            .with_default_cooldown(self.default_cooldown)
            .load(&self.catalog)?;

        let report = table.report.clone();
        self.publish(table)?;
        Ok(report)
    }

    /// Same as `load`, logged as a reload
    pub fn reload(&self) -> Result<LoadReport, PluginError> {
        info!("Reloading plugins from {}", self.root.display());
        let report = self.load().inspect_err(|e| warn!("Plugin reload failed: {}", e))?;
        info!("Plugin reload complete: {} commands", report.commands);
        Ok(report)
    }

    fn publish(&self, table: PluginTable) -> Result<(), PluginError> {
        let table = Arc::new(table);
        let mut current = self
            .table
            .write()
            .map_err(|_| PluginError::Internal("Lock poisoned".to_string()))?;
        *current = table;
        Ok(())
    }

    /// The currently published table
    pub fn snapshot(&self) -> Arc<PluginTable> {
        match self.table.read() {
            Ok(table) => Arc::clone(&table),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Resolve a command name (case-insensitive)
    pub fn lookup(&self, name: &str) -> Option<Arc<PluginDescriptor>> {
        self.snapshot().commands.get(&name.to_lowercase()).cloned()
    }

    /// Descriptors whose names or description contain `query`, each at most once
    pub fn search(&self, query: &str) -> Vec<Arc<PluginDescriptor>> {
        self.descriptors()
            .into_iter()
            .filter(|d| d.matches_query(query))
            .collect()
    }

    /// Every distinct active descriptor, ordered by primary name
    pub fn descriptors(&self) -> Vec<Arc<PluginDescriptor>> {
        let table = self.snapshot();
        let mut unique: Vec<Arc<PluginDescriptor>> = Vec::new();
        for descriptor in table.commands.values() {
            if !unique.iter().any(|d| Arc::ptr_eq(d, descriptor)) {
                unique.push(Arc::clone(descriptor));
            }
        }
        unique.sort_by(|a, b| a.primary_name().cmp(b.primary_name()));
        unique
    }

    pub fn report(&self) -> LoadReport {
        self.snapshot().report.clone()
    }

    /// Number of command names (including aliases)
    pub fn len(&self) -> usize {
        self.snapshot().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::CommandError;
    use crate::application::messaging::Context;
    use crate::plugins::CommandHandler;
    use async_trait::async_trait;
    use std::fs;

    struct Named(&'static str);

    #[async_trait]
    impl CommandHandler for Named {
        fn id(&self) -> &str {
            self.0
        }

        async fn run(&self, _ctx: Context) -> Result<(), CommandError> {
            Ok(())
        }
    }

    fn registry(root: &Path) -> PluginRegistry {
        let mut catalog = HandlerCatalog::new();
        catalog.register(Named("ping")).unwrap();
        catalog.register(Named("menu")).unwrap();
        PluginRegistry::new(root, Arc::new(catalog))
    }

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "system/ping.yaml", "command: ping\nhandler: ping\n");
        let registry = registry(dir.path());

        assert!(registry.lookup("ping").is_none());
        registry.load().unwrap();
        assert_eq!(registry.lookup("PING").unwrap().handler_id, "ping");
        assert!(registry.lookup("pong").is_none());
    }

    #[test]
    fn test_search_matches_names_and_description_once() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "system/menu.yaml",
            "command: [menu, help, list]\nhandler: menu\ndescription: Show the bot MENU\n",
        );
        write(dir.path(), "system/ping.yaml", "command: ping\nhandler: ping\ndescription: Latency\n");
        let registry = registry(dir.path());
        registry.load().unwrap();

        let hits = registry.search("Menu");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].primary_name(), "menu");

        assert_eq!(registry.search("latency").len(), 1);
        assert_eq!(registry.search("").len(), 2);
        assert!(registry.search("weather").is_empty());
    }

    #[test]
    fn test_reload_swaps_table_and_keeps_old_snapshot_intact() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "system/ping.yaml", "command: ping\nhandler: ping\ncooldown: 3\n");
        let registry = registry(dir.path());
        registry.load().unwrap();

        let before = registry.lookup("ping").unwrap();
        write(dir.path(), "system/ping.yaml", "command: ping\nhandler: ping\ncooldown: 9\n");
        registry.reload().unwrap();

        assert_eq!(before.cooldown_seconds, 3);
        assert_eq!(registry.lookup("ping").unwrap().cooldown_seconds, 9);
    }

    #[test]
    fn test_failed_reload_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("plugins");
        write(&root, "system/ping.yaml", "command: ping\nhandler: ping\n");
        let registry = registry(&root);
        registry.load().unwrap();

        fs::remove_dir_all(&root).unwrap();
        assert!(registry.reload().is_err());
        assert!(registry.lookup("ping").is_some());
        assert_eq!(registry.report().loaded, 1);
    }
}
