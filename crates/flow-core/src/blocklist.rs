use anyhow::Result;
use flow_storage::{PreferenceStore, APP_BLOCKING_PREFS, BLOCKED_APPS_KEY};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
}

/// Published after every block-list write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockListChange {
    pub package: String,
    pub kind: ChangeKind,
    pub blocked_count: usize,
}

/// Receives block-list changes as they are written
pub trait BlockListObserver: Send + Sync {
    fn block_list_changed(&self, change: &BlockListChange);
}

/// Persisted set of blocked package identifiers.
///
/// Every write reads the whole set, modifies a copy and writes the copy back.
pub struct BlockList {
    store: Arc<dyn PreferenceStore>,
    observers: Mutex<Vec<Arc<dyn BlockListObserver>>>,
}

impl BlockList {
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer for subsequent writes
    pub fn subscribe(&self, observer: Arc<dyn BlockListObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(observer);
    }

    /// Snapshot of the blocked packages
    ///
    /// # Errors
    ///
    /// Returns an error if the stored set cannot be read
    pub fn blocked(&self) -> Result<BTreeSet<String>> {
        self.store.get_string_set(APP_BLOCKING_PREFS, BLOCKED_APPS_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the stored set cannot be read
    pub fn is_blocked(&self, package: &str) -> Result<bool> {
        Ok(self.blocked()?.contains(package))
    }

    /// # Errors
    ///
    /// Returns an error if the stored set cannot be read
    pub fn count(&self) -> Result<usize> {
        Ok(self.blocked()?.len())
    }

    /// Add a package to the block list
    ///
    /// # Errors
    ///
    /// Returns an error if the stored set cannot be read or written
    pub fn add(&self, package: &str) -> Result<BlockListChange> {
        let mut blocked = self.blocked()?;
        blocked.insert(package.to_string());
        self.write(package, ChangeKind::Added, &blocked)
    }

    /// Remove a package from the block list
    ///
    /// # Errors
    ///
    /// Returns an error if the stored set cannot be read or written
    pub fn remove(&self, package: &str) -> Result<BlockListChange> {
        let mut blocked = self.blocked()?;
        blocked.remove(package);
        self.write(package, ChangeKind::Removed, &blocked)
    }

    fn write(
        &self,
        package: &str,
        kind: ChangeKind,
        blocked: &BTreeSet<String>,
    ) -> Result<BlockListChange> {
        self.store
            .put_string_set(APP_BLOCKING_PREFS, BLOCKED_APPS_KEY, blocked)?;

        let change = BlockListChange {
            package: package.to_string(),
            kind,
            blocked_count: blocked.len(),
        };
        log::info!(
            "{} app: {package}. Total blocked: {}",
            match kind {
                ChangeKind::Added => "Blocked",
                ChangeKind::Removed => "Unblocked",
            },
            change.blocked_count
        );

        let observers = self
            .observers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.block_list_changed(&change);
        }

        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_storage::MemoryPreferences;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<BlockListChange>>);

    impl BlockListObserver for Recorder {
        fn block_list_changed(&self, change: &BlockListChange) {
            self.0.lock().unwrap().push(change.clone());
        }
    }

    fn block_list() -> (BlockList, Arc<MemoryPreferences>) {
        let store = Arc::new(MemoryPreferences::new());
        (BlockList::new(store.clone()), store)
    }

    #[test]
    fn test_block_then_unblock() {
        let (list, _store) = block_list();

        list.add("com.instagram.android").unwrap();
        assert!(list.is_blocked("com.instagram.android").unwrap());

        list.remove("com.instagram.android").unwrap();
        assert!(!list.is_blocked("com.instagram.android").unwrap());
    }

    #[test]
    fn test_writes_replace_the_whole_persisted_set() {
        let (list, store) = block_list();
        list.add("b.app").unwrap();
        list.add("a.app").unwrap();

        let raw = store
            .get_string(APP_BLOCKING_PREFS, BLOCKED_APPS_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(raw, r#"["a.app","b.app"]"#);
    }

    #[test]
    fn test_adding_twice_keeps_one_entry() {
        let (list, _store) = block_list();
        list.add("a.app").unwrap();
        let change = list.add("a.app").unwrap();

        assert_eq!(change.blocked_count, 1);
        assert_eq!(list.count().unwrap(), 1);
    }

    #[test]
    fn test_removing_unknown_package_is_a_noop() {
        let (list, _store) = block_list();
        list.add("a.app").unwrap();

        let change = list.remove("missing.app").unwrap();
        assert_eq!(change.blocked_count, 1);
        assert!(list.is_blocked("a.app").unwrap());
    }

    #[test]
    fn test_observers_receive_each_change() {
        let (list, _store) = block_list();
        let recorder = Arc::new(Recorder::default());
        list.subscribe(recorder.clone());

        list.add("a.app").unwrap();
        list.remove("a.app").unwrap();

        let changes = recorder.0.lock().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::Added);
        assert_eq!(changes[0].blocked_count, 1);
        assert_eq!(changes[1].kind, ChangeKind::Removed);
        assert_eq!(changes[1].blocked_count, 0);
    }
}
