//! Change notifications for the in-memory bag, backed by `event-emitter-rs`.

use std::sync::{Arc, Mutex};

use event_emitter_rs::EventEmitter;
use serde::{Deserialize, Serialize};

use super::{BagError, HostOptions};

const CHANGE_EVENT: &str = "change";

/// A single write observed on the bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub key: String,
    pub removed: bool,
}

/// Fans bag writes out to registered listeners.
///
/// Listeners run on threads spawned by the emitter, so delivery happens
/// shortly after the write returns rather than inside it.
#[derive(Clone)]
pub struct ChangeNotifier {
    pub(super) emitter: Arc<Mutex<EventEmitter>>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    /// Register a listener. Returns the emitter's listener id.
    pub fn on_change<F>(&self, listener: F) -> Result<String, BagError>
    where
        F: Fn(PropertyChange) + Send + Sync + 'static,
    {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| BagError::LockPoisoned("on_change"))?;
        Ok(emitter.on(CHANGE_EVENT, listener))
    }

    /// Remove a listener by the id returned from `on_change`.
    pub fn remove_listener(&self, id: &str) -> Result<bool, BagError> {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| BagError::LockPoisoned("remove_listener"))?;
        Ok(emitter.remove_listener(id).is_some())
    }

    /// Notify listeners of a write unless the caller asked for silence.
    pub(crate) fn notify(
        &self,
        key: &str,
        removed: bool,
        options: &HostOptions,
    ) -> Result<(), BagError> {
        if options.flag(HostOptions::SUPPRESS_NOTIFICATION) {
            return Ok(());
        }

        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| BagError::LockPoisoned("notify"))?;
        emitter.emit(
            CHANGE_EVENT,
            PropertyChange {
                key: key.to_string(),
                removed,
            },
        );
        Ok(())
    }
}
