//! Host property bag - the flat, global key/value store the object
//! namespaces are layered on.
//!
//! The bag is an external collaborator: it only has to provide the four
//! operations of [`PropertyBag`]. Everything else in this crate is built on
//! top of that contract.
//!
//! ## Example
//!
//! ```ignore
//! use object_props::{HostOptions, InMemoryPropertyBag, PropertyBag};
//! use serde_json::json;
//!
//! let bag = InMemoryPropertyBag::new();
//! bag.set_property("theme", json!("dark"), &HostOptions::default())?;
//! assert_eq!(bag.get_property("theme")?, Some(json!("dark")));
//! ```

mod in_memory;
#[cfg(feature = "emitter")]
mod notifier;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// Abstract flat key/value storage supplied by the host object model.
///
/// Implementations use interior mutability so a single handle can be shared
/// between readers and the writer. The contract assumes a single logical
/// writer; nothing here coordinates concurrent writers.
pub trait PropertyBag: Send + Sync {
    /// Read one key. Returns None if the key is not present.
    fn get_property(&self, key: &str) -> Result<Option<Value>, BagError>;

    /// Write one key, replacing any previous value.
    fn set_property(&self, key: &str, value: Value, options: &HostOptions)
        -> Result<(), BagError>;

    /// Remove one key. Returns true if it existed.
    fn remove_property(&self, key: &str, options: &HostOptions) -> Result<bool, BagError>;

    /// Full snapshot of every key in the bag.
    fn get_properties(&self) -> Result<BTreeMap<String, Value>, BagError>;
}

impl<B: PropertyBag + ?Sized> PropertyBag for &B {
    fn get_property(&self, key: &str) -> Result<Option<Value>, BagError> {
        (**self).get_property(key)
    }

    fn set_property(
        &self,
        key: &str,
        value: Value,
        options: &HostOptions,
    ) -> Result<(), BagError> {
        (**self).set_property(key, value, options)
    }

    fn remove_property(&self, key: &str, options: &HostOptions) -> Result<bool, BagError> {
        (**self).remove_property(key, options)
    }

    fn get_properties(&self) -> Result<BTreeMap<String, Value>, BagError> {
        (**self).get_properties()
    }
}

/// Opaque write hints forwarded verbatim to the host on every write.
///
/// The accessor and the migration engine never look inside; only the host
/// bag decides what a hint means.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostOptions(Map<String, Value>);

impl HostOptions {
    /// Hint understood by [`InMemoryPropertyBag`]: skip change listeners.
    pub const SUPPRESS_NOTIFICATION: &'static str = "suppressNotification";

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hint, returning the updated options.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Shorthand for `with(SUPPRESS_NOTIFICATION, true)`.
    pub fn suppress_notification() -> Self {
        Self::new().with(Self::SUPPRESS_NOTIFICATION, true)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// True when the hint is present and set to boolean true.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(Value::Bool(true)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for HostOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Error type for host bag operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BagError {
    /// The bag's internal lock was poisoned during the named operation.
    LockPoisoned(&'static str),
    /// Host-level storage failure (quota, transport, ...).
    Storage(String),
}

impl fmt::Display for BagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BagError::LockPoisoned(operation) => {
                write!(f, "property bag lock poisoned during {}", operation)
            }
            BagError::Storage(msg) => write!(f, "property bag storage error: {}", msg),
        }
    }
}

impl std::error::Error for BagError {}

pub use in_memory::InMemoryPropertyBag;
#[cfg(feature = "emitter")]
pub use notifier::{ChangeNotifier, PropertyChange};
