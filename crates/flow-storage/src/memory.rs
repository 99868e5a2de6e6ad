use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::store::PreferenceStore;

/// In-memory preference store, used by tests and ephemeral hosts
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<(String, String), String>>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .lock()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put_string(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        self.lock()
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        Ok(self
            .lock()
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    fn entries(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .lock()
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect())
    }
}
