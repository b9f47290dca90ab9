//! InMemoryPropertyBag - BTreeMap-backed host bag for tests and embedding.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
#[cfg(feature = "emitter")]
use tracing::warn;

#[cfg(feature = "emitter")]
use super::{ChangeNotifier, PropertyChange};
use super::{BagError, HostOptions, PropertyBag};

/// In-memory property bag backed by a BTreeMap.
///
/// Clone-friendly via Arc: clones share the same storage.
#[derive(Clone)]
pub struct InMemoryPropertyBag {
    storage: Arc<RwLock<BTreeMap<String, Value>>>,
    #[cfg(feature = "emitter")]
    notifier: ChangeNotifier,
}

impl Default for InMemoryPropertyBag {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPropertyBag {
    /// Create a new empty bag.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(BTreeMap::new())),
            #[cfg(feature = "emitter")]
            notifier: ChangeNotifier::new(),
        }
    }

    /// Create a bag pre-populated with raw entries, e.g. data written by an
    /// older release.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let storage = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        Self {
            storage: Arc::new(RwLock::new(storage)),
            #[cfg(feature = "emitter")]
            notifier: ChangeNotifier::new(),
        }
    }

    /// Number of keys. Reads through a poisoned lock: every write is a single
    /// map insert or remove, so the map is never left half-updated.
    pub fn len(&self) -> usize {
        self.storage
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a key is present. Reads through a poisoned lock, like `len`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.storage
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Register a change listener. Writes made with
    /// [`HostOptions::suppress_notification`] are not reported.
    #[cfg(feature = "emitter")]
    pub fn on_change<F>(&self, listener: F) -> Result<String, BagError>
    where
        F: Fn(PropertyChange) + Send + Sync + 'static,
    {
        self.notifier.on_change(listener)
    }

    #[cfg(feature = "emitter")]
    pub fn remove_listener(&self, id: &str) -> Result<bool, BagError> {
        self.notifier.remove_listener(id)
    }

    /// Runs after a write has landed, so a notifier failure is logged
    /// instead of failing the write.
    #[cfg(feature = "emitter")]
    fn notify(&self, key: &str, removed: bool, options: &HostOptions) {
        if let Err(error) = self.notifier.notify(key, removed, options) {
            warn!(key = %key, error = %error, "change notification failed");
        }
    }

    #[cfg(not(feature = "emitter"))]
    fn notify(&self, _key: &str, _removed: bool, _options: &HostOptions) {}
}

impl PropertyBag for InMemoryPropertyBag {
    fn get_property(&self, key: &str) -> Result<Option<Value>, BagError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| BagError::LockPoisoned("get_property"))?;
        Ok(storage.get(key).cloned())
    }

    fn set_property(
        &self,
        key: &str,
        value: Value,
        options: &HostOptions,
    ) -> Result<(), BagError> {
        {
            let mut storage = self
                .storage
                .write()
                .map_err(|_| BagError::LockPoisoned("set_property"))?;
            storage.insert(key.to_string(), value);
        }
        self.notify(key, false, options);
        Ok(())
    }

    fn remove_property(&self, key: &str, options: &HostOptions) -> Result<bool, BagError> {
        let existed = {
            let mut storage = self
                .storage
                .write()
                .map_err(|_| BagError::LockPoisoned("remove_property"))?;
            storage.remove(key).is_some()
        };
        if existed {
            self.notify(key, true, options);
        }
        Ok(existed)
    }

    fn get_properties(&self) -> Result<BTreeMap<String, Value>, BagError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| BagError::LockPoisoned("get_properties"))?;
        Ok(storage.clone())
    }
}
