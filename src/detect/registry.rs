use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::backend::LandmarkerBackend;

/// Thread-safe registry of landmarker backends.
///
/// Backends are wrapped in `Mutex` because `LandmarkerBackend::detect` takes
/// `&mut self`.
pub struct LandmarkerRegistry {
    backends: HashMap<String, Arc<Mutex<dyn LandmarkerBackend>>>,
    default_name: Option<String>,
}

impl LandmarkerRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: LandmarkerBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("landmarker backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<dyn LandmarkerBackend>>> {
        self.backends.get(name).cloned()
    }

    /// Get the default backend.
    pub fn default_backend(&self) -> Option<Arc<Mutex<dyn LandmarkerBackend>>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// List registered backend names.
    pub fn list(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Resolve a backend by name, falling back to the default.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<Mutex<dyn LandmarkerBackend>>> {
        match name {
            Some(name) => self
                .get(name)
                .ok_or_else(|| anyhow!("landmarker backend '{}' not registered", name)),
            None => self
                .default_backend()
                .ok_or_else(|| anyhow!("no landmarker backend registered")),
        }
    }
}

impl Default for LandmarkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::StubLandmarker;

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = LandmarkerRegistry::new();
        registry.register(StubLandmarker::empty());
        let backend = registry.resolve(None).unwrap();
        assert_eq!(backend.lock().unwrap().name(), "stub");
    }

    #[test]
    fn resolve_unknown_name_fails() {
        let mut registry = LandmarkerRegistry::new();
        registry.register(StubLandmarker::empty());
        assert!(registry.resolve(Some("tract")).is_err());
        assert!(registry.set_default("tract").is_err());
    }
}
