//! Object properties - per-object named properties on top of a flat bag.
//!
//! ## Example
//!
//! ```ignore
//! use object_props::{HostOptions, InMemoryPropertyBag, ObjectPropertiesExt};
//! use serde_json::json;
//!
//! let bag = InMemoryPropertyBag::new();
//! let props = bag.object_properties();
//! props.set("chart-1", "color", json!("red"), &HostOptions::default())?;
//! assert_eq!(props.get_property("chart-1", "color")?, Some(json!("red")));
//! ```

mod config;

use serde_json::Value;
use tracing::debug;

use crate::bag::{HostOptions, PropertyBag};
use crate::codec::{decode_or_empty, encode, is_current, key_for, object_id_for, PropertySet};
use crate::error::PropsError;
use crate::migration::{migrate, MigrationOptions, MigrationReport};

pub use config::PropertiesConfig;

/// Accessor for per-object properties stored in a host bag.
///
/// Each call reads the object's namespace key once and, when it mutates,
/// writes it once. Writes are read-modify-write over the whole set and are
/// not atomic across callers: two writers touching the same object can
/// lose an update. Keep a single logical writer per object, or serialize
/// writes outside this type.
#[derive(Debug, Clone)]
pub struct ObjectProperties<B> {
    bag: B,
}

impl<B: PropertyBag> ObjectProperties<B> {
    /// Wrap a bag. Existing legacy data is left alone until [`migrate`](Self::migrate).
    pub fn new(bag: B) -> Self {
        Self { bag }
    }

    /// Wrap a bag, migrating legacy data first when the config asks for it.
    pub fn open(bag: B, config: &PropertiesConfig) -> Result<Self, PropsError> {
        let props = Self::new(bag);
        if config.migrate_on_open {
            props.migrate_with(&config.migration)?;
        }
        Ok(props)
    }

    pub fn bag(&self) -> &B {
        &self.bag
    }

    pub fn into_inner(self) -> B {
        self.bag
    }

    /// All properties of an object. Empty when nothing was ever written or
    /// the stored value cannot be decoded.
    pub fn get(&self, object_id: &str) -> Result<PropertySet, PropsError> {
        let key = key_for(object_id);
        Ok(self
            .bag
            .get_property(&key)?
            .map(|value| decode_or_empty(&key, &value))
            .unwrap_or_default())
    }

    /// One property of an object.
    pub fn get_property(&self, object_id: &str, name: &str) -> Result<Option<Value>, PropsError> {
        Ok(self.get(object_id)?.remove(name))
    }

    /// Set one property, keeping the object's other properties.
    pub fn set(
        &self,
        object_id: &str,
        name: impl Into<String>,
        value: Value,
        options: &HostOptions,
    ) -> Result<(), PropsError> {
        let mut properties = self.get(object_id)?;
        properties.insert(name.into(), value);
        self.write(object_id, &properties, options)
    }

    /// Remove one property. Returns true if it existed. Removing the last
    /// property removes the object's namespace key.
    pub fn delete_property(
        &self,
        object_id: &str,
        name: &str,
        options: &HostOptions,
    ) -> Result<bool, PropsError> {
        let mut properties = self.get(object_id)?;
        if properties.remove(name).is_none() {
            return Ok(false);
        }

        if properties.is_empty() {
            self.bag.remove_property(&key_for(object_id), options)?;
        } else {
            self.write(object_id, &properties, options)?;
        }
        Ok(true)
    }

    /// Remove every property of an object. Returns true if anything was stored.
    pub fn delete_all(&self, object_id: &str, options: &HostOptions) -> Result<bool, PropsError> {
        Ok(self.bag.remove_property(&key_for(object_id), options)?)
    }

    /// Ids of every object with current-encoded properties, sorted.
    pub fn object_ids(&self) -> Result<Vec<String>, PropsError> {
        let snapshot = self.bag.get_properties()?;
        Ok(snapshot
            .iter()
            .filter(|(_, value)| is_current(value))
            .filter_map(|(key, _)| object_id_for(key))
            .map(str::to_string)
            .collect())
    }

    /// Consolidate legacy data with default options.
    pub fn migrate(&self) -> Result<MigrationReport, PropsError> {
        self.migrate_with(&MigrationOptions::default())
    }

    pub fn migrate_with(&self, options: &MigrationOptions) -> Result<MigrationReport, PropsError> {
        migrate(&self.bag, options)
    }

    fn write(
        &self,
        object_id: &str,
        properties: &PropertySet,
        options: &HostOptions,
    ) -> Result<(), PropsError> {
        let key = key_for(object_id);
        debug!(key = %key, properties = properties.len(), "writing object properties");
        self.bag.set_property(&key, encode(properties)?, options)?;
        Ok(())
    }
}

/// Extension trait for object property access on any PropertyBag.
pub trait ObjectPropertiesExt: PropertyBag + Sized {
    /// Borrow the bag as an object property accessor.
    fn object_properties(&self) -> ObjectProperties<&Self> {
        ObjectProperties::new(self)
    }
}

impl<B: PropertyBag> ObjectPropertiesExt for B {}
