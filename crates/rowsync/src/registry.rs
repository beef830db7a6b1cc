//! Routing of section names to their persistence services.

use rowsync_core::PersistenceService;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps each section to the service that creates, updates and deletes its
/// rows. A save looks up one service per section.
#[derive(Clone, Default)]
pub struct PersistenceRegistry {
    services: HashMap<String, Arc<dyn PersistenceService>>,
}

impl PersistenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service` for `section`, replacing any earlier registration.
    pub fn register(&mut self, section: impl Into<String>, service: Arc<dyn PersistenceService>) {
        self.services.insert(section.into(), service);
    }

    pub fn with(mut self, section: impl Into<String>, service: Arc<dyn PersistenceService>) -> Self {
        self.register(section, service);
        self
    }

    pub fn get(&self, section: &str) -> Option<Arc<dyn PersistenceService>> {
        self.services.get(section).cloned()
    }

    pub fn has_service(&self, section: &str) -> bool {
        self.services.contains_key(section)
    }

    pub fn registered_sections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for PersistenceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceRegistry")
            .field("sections", &self.registered_sections())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPersistence;

    #[test]
    fn test_routes_by_section_name() {
        let shared = Arc::new(MemoryPersistence::new());
        let registry = PersistenceRegistry::new()
            .with("time_sync", shared.clone())
            .with("server_health", shared);

        assert!(registry.has_service("time_sync"));
        assert!(registry.get("asa_firewall").is_none());
        assert_eq!(registry.registered_sections(), vec!["server_health", "time_sync"]);
        assert_eq!(registry.len(), 2);
    }
}
