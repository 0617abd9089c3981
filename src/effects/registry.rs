//! Effect registry
//!
//! Maps effect ids to factories. Populated during startup wiring, then
//! shared read-only with every render task.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::RegistryError;

use super::traits::{EffectFactory, PixelEffect};

static GLOBAL_REGISTRY: OnceCell<Arc<EffectRegistry>> = OnceCell::new();

/// Registry of available effects
#[derive(Default)]
pub struct EffectRegistry {
    factories: HashMap<String, Box<dyn EffectFactory>>,
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.effect_ids())
            .finish()
    }
}

impl EffectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `effect_id`
    pub fn register(
        &mut self,
        effect_id: impl Into<String>,
        factory: impl EffectFactory + 'static,
    ) -> Result<(), RegistryError> {
        let effect_id = effect_id.into();
        if self.factories.contains_key(&effect_id) {
            return Err(RegistryError::DuplicateEffectId(effect_id));
        }
        tracing::info!(effect = %effect_id, "Registered pixel effect");
        self.factories.insert(effect_id, Box::new(factory));
        Ok(())
    }

    /// Create an instance of the effect registered as `effect_id`
    pub fn resolve(&self, effect_id: &str) -> Result<Box<dyn PixelEffect>, RegistryError> {
        self.factories
            .get(effect_id)
            .map(|factory| factory.create())
            .ok_or_else(|| RegistryError::UnknownEffectId(effect_id.to_string()))
    }

    /// Check if an effect id is registered
    pub fn contains(&self, effect_id: &str) -> bool {
        self.factories.contains_key(effect_id)
    }

    /// Registered ids, sorted
    pub fn effect_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Install the process-wide registry.
///
/// Call once after startup wiring, before serving tiles.
pub fn install_registry(registry: EffectRegistry) -> Result<Arc<EffectRegistry>, RegistryError> {
    let registry = Arc::new(registry);
    GLOBAL_REGISTRY
        .set(Arc::clone(&registry))
        .map_err(|_| RegistryError::AlreadyInstalled)?;
    tracing::info!(effects = registry.len(), "Installed global effect registry");
    Ok(registry)
}

/// The process-wide registry, if installed
pub fn global_registry() -> Option<Arc<EffectRegistry>> {
    GLOBAL_REGISTRY.get().cloned()
}
