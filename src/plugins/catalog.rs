//! Handler catalog - compiled-in handlers that manifests can bind to

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::application::errors::PluginError;
use crate::plugins::trait_def::CommandHandler;

/// Registered handlers, keyed by handler id
#[derive(Default)]
pub struct HandlerCatalog {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; ids must be unique
    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) -> Result<(), PluginError> {
        self.register_arc(Arc::new(handler))
    }

    pub fn register_arc(&mut self, handler: Arc<dyn CommandHandler>) -> Result<(), PluginError> {
        let id = handler.id().to_string();

        if self.handlers.contains_key(&id) {
            return Err(PluginError::Load(format!("Handler '{}' already registered", id)));
        }

        debug!("Registering handler: {}", id);
        self.handlers.insert(id, handler);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// Sorted handler ids
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.handlers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
