//! A host bag spy: delegates to an in-memory bag and records every call.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use object_props::{BagError, HostOptions, InMemoryPropertyBag, PropertyBag};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Set(String, HostOptions),
    Remove(String, HostOptions),
    GetAll,
}

#[derive(Clone, Default)]
pub struct RecordingBag {
    inner: InMemoryPropertyBag,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_writes: Arc<AtomicBool>,
}

impl RecordingBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap(inner: InMemoryPropertyBag) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &InMemoryPropertyBag {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn reads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Get(_) | Call::GetAll))
            .count()
    }

    pub fn writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Set(..) | Call::Remove(..)))
            .count()
    }

    /// Make every subsequent write fail like a host over its quota.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_writable(&self) -> Result<(), BagError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BagError::Storage("quota exceeded".into()));
        }
        Ok(())
    }
}

impl PropertyBag for RecordingBag {
    fn get_property(&self, key: &str) -> Result<Option<Value>, BagError> {
        self.record(Call::Get(key.to_string()));
        self.inner.get_property(key)
    }

    fn set_property(
        &self,
        key: &str,
        value: Value,
        options: &HostOptions,
    ) -> Result<(), BagError> {
        self.record(Call::Set(key.to_string(), options.clone()));
        self.check_writable()?;
        self.inner.set_property(key, value, options)
    }

    fn remove_property(&self, key: &str, options: &HostOptions) -> Result<bool, BagError> {
        self.record(Call::Remove(key.to_string(), options.clone()));
        self.check_writable()?;
        self.inner.remove_property(key, options)
    }

    fn get_properties(&self) -> Result<BTreeMap<String, Value>, BagError> {
        self.record(Call::GetAll);
        self.inner.get_properties()
    }
}
