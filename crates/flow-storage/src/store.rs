//! Key-value preference store abstraction.
//!
//! Values are plain strings grouped by namespace. String sets are layered on
//! top as JSON arrays so every backend only has to store text.

use anyhow::Result;
use std::collections::BTreeSet;

/// Errors raised when a stored value cannot be decoded
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("value at {namespace}/{key} is not a string set: {source}")]
    CorruptSet {
        namespace: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Namespaced string storage.
///
/// Writes are durable once the call returns. Implementations serialize access
/// internally so a shared handle can be used from any callback.
pub trait PreferenceStore: Send + Sync {
    /// Read a string value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails
    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Write (or overwrite) a string value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails
    fn put_string(&self, namespace: &str, key: &str, value: &str) -> Result<()>;

    /// Remove a value, returning whether anything was removed
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails
    fn remove(&self, namespace: &str, key: &str) -> Result<bool>;

    /// All `(key, value)` pairs in a namespace, ordered by key
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails
    fn entries(&self, namespace: &str) -> Result<Vec<(String, String)>>;

    /// Read a string set. A missing key reads as the empty set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or the stored value is not a JSON array
    fn get_string_set(&self, namespace: &str, key: &str) -> Result<BTreeSet<String>> {
        let Some(raw) = self.get_string(namespace, key)? else {
            return Ok(BTreeSet::new());
        };
        serde_json::from_str(&raw).map_err(|source| {
            StoreError::CorruptSet {
                namespace: namespace.to_string(),
                key: key.to_string(),
                source,
            }
            .into()
        })
    }

    /// Replace a string set as a whole
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails
    fn put_string_set(&self, namespace: &str, key: &str, values: &BTreeSet<String>) -> Result<()> {
        let encoded = serde_json::to_string(values)?;
        self.put_string(namespace, key, &encoded)
    }
}
