//! SQLite-backed preference storage.
//!
//! The connection is guarded by a mutex so one `Database` can be shared by the
//! daemon's callbacks, which matches the single-writer model of the store.

mod preferences;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::migrations;
use crate::store::PreferenceStore;

/// Preference database shared by every component of one process
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the preference database, defaulting to `<data_local_dir>/flow/flow.db`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, the file, or the schema cannot be set up
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = db_path.unwrap_or_else(Self::default_db_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        migrations::init_schema(&conn)?;

        log::info!("Database initialized at: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn default_db_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("flow");
        path.push("flow.db");
        path
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Database mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl PreferenceStore for Database {
    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        preferences::get_value(&self.connection(), namespace, key)
    }

    fn put_string(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        preferences::put_value(&self.connection(), namespace, key, value)
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        preferences::delete_value(&self.connection(), namespace, key)
    }

    fn entries(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        preferences::list_values(&self.connection(), namespace)
    }
}
