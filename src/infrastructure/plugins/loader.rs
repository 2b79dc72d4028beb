//! Plugin loader - Builds descriptors from a directory tree of manifests
//!
//! Layout: `<root>/<category>/<plugin>.yaml`. Entries are processed in sorted
//! order so "last one wins" on duplicate command names is deterministic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::manifest::PluginManifest;
use crate::application::errors::PluginError;
use crate::domain::entities::{PluginDescriptor, DEFAULT_COOLDOWN_SECS};
use crate::plugins::HandlerCatalog;

/// Counts collected during one load
///
/// `attempted` is the number of manifests opened; each of them ends up in
/// `loaded`, `failed`, or (when disabled) `skipped`. `skipped` also counts
/// entries that are not manifests at all.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub attempted: usize,
    pub loaded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Distinct command names registered
    pub commands: usize,
    pub failures: Vec<LoadFailure>,
}

/// A manifest that could not be turned into a descriptor
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a load: the command table plus its report
#[derive(Debug, Default)]
pub struct PluginTable {
    pub commands: HashMap<String, Arc<PluginDescriptor>>,
    pub report: LoadReport,
}

/// Plugin loader
pub struct PluginLoader {
    plugin_dir: PathBuf,
    default_cooldown: u64,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            default_cooldown: DEFAULT_COOLDOWN_SECS,
        }
    }

    pub fn with_default_cooldown(mut self, seconds: u64) -> Self {
        self.default_cooldown = seconds;
        self
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Load every manifest under the plugin directory
    ///
    /// Only a missing or unreadable root is an error; problems with single
    /// manifests are recorded in the report.
    pub fn load(&self, catalog: &HandlerCatalog) -> Result<PluginTable, PluginError> {
        if !self.plugin_dir.is_dir() {
            return Err(PluginError::MissingDirectory(self.plugin_dir.display().to_string()));
        }

        let mut table = PluginTable::default();

        for category_path in sorted_entries(&self.plugin_dir)? {
            if is_hidden(&category_path) {
                continue;
            }
            if !category_path.is_dir() {
                table.report.skipped += 1;
                continue;
            }

            let category = file_name(&category_path).to_string();
            let files = match sorted_entries(&category_path) {
                Ok(files) => files,
                Err(e) => {
                    error!("Error reading category {}: {}", category, e);
                    continue;
                }
            };

            for path in files {
                if is_hidden(&path) {
                    continue;
                }
                if !path.is_file() || !is_manifest(&path) {
                    table.report.skipped += 1;
                    continue;
                }

                table.report.attempted += 1;

                match self.build_descriptor(&path, &category, catalog) {
                    Ok(Some(descriptor)) => {
                        register(&mut table.commands, Arc::new(descriptor));
                        table.report.loaded += 1;
                    }
                    Ok(None) => {
                        debug!("Plugin disabled: {}", path.display());
                        table.report.skipped += 1;
                    }
                    Err(e) => {
                        error!("Failed to load {}: {}", path.display(), e);
                        table.report.failed += 1;
                        table.report.failures.push(LoadFailure {
                            path: path.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        table.report.commands = table.commands.len();
        info!(
            "Loaded {} plugins ({} failed, {} skipped), {} commands",
            table.report.loaded, table.report.failed, table.report.skipped, table.report.commands
        );

        Ok(table)
    }

    /// Parse and validate one manifest; `Ok(None)` for disabled plugins
    fn build_descriptor(
        &self,
        path: &Path,
        category: &str,
        catalog: &HandlerCatalog,
    ) -> Result<Option<PluginDescriptor>, PluginError> {
        let manifest = PluginManifest::from_file(path)?;

        let invalid = |reason: &str| PluginError::Invalid {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };

        let names = manifest.command_names();
        if names.is_empty() {
            return Err(invalid("no command names declared"));
        }

        let handler_id = manifest
            .handler
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid("no handler declared"))?;

        let handler = catalog
            .get(handler_id)
            .ok_or_else(|| PluginError::UnknownHandler(handler_id.to_string()))?;

        if !manifest.enabled {
            return Ok(None);
        }

        let mut descriptor = PluginDescriptor::new(names, handler)
            .with_flags(manifest.flags())
            .with_cooldown(manifest.cooldown.unwrap_or(self.default_cooldown));

        if let Some(description) = manifest.description.filter(|d| !d.trim().is_empty()) {
            descriptor = descriptor.with_description(description);
        }
        if let Some(usage) = manifest.usage {
            descriptor = descriptor.with_usage(usage);
        }
        descriptor.category = manifest.category.unwrap_or_else(|| category.to_string());
        descriptor.file_path = path.to_path_buf();

        debug!("Loaded plugin: {}", descriptor.command_names.join(", "));
        Ok(Some(descriptor))
    }
}

fn register(commands: &mut HashMap<String, Arc<PluginDescriptor>>, descriptor: Arc<PluginDescriptor>) {
    for name in &descriptor.command_names {
        if let Some(previous) = commands.insert(name.clone(), Arc::clone(&descriptor)) {
            warn!(
                "Duplicate command '{}' found in {}, overriding {}",
                name,
                descriptor.file_path.display(),
                previous.file_path.display()
            );
        }
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, PluginError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| PluginError::Load(format!("Failed to read {}: {}", dir.display(), e)))?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => warn!("Failed to read directory entry: {}", e),
        }
    }
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    file_name(path).starts_with('.')
}

fn is_manifest(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
