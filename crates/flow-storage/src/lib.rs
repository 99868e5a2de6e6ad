pub mod db;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod store;

pub use db::Database;
pub use memory::MemoryPreferences;
pub use models::{
    PendingNotification, APP_BLOCKING_PREFS, BLOCKED_APPS_KEY, NOTIFICATION_KEY_PREFIX,
    SESSION_NOTIFICATIONS_PREFS,
};
pub use store::{PreferenceStore, StoreError};
