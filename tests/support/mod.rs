//! Shared helpers for the integration suites.

#![allow(dead_code)]

pub mod recording_bag;

use object_props::{codec, PropertyBag, PropertySet};
use serde_json::Value;

/// Build a property set from a JSON object literal.
pub fn props(value: Value) -> PropertySet {
    serde_json::from_value(value).expect("property set literal")
}

/// Decode whatever is stored at an object's namespace key.
pub fn stored_set<B: PropertyBag>(bag: &B, object_id: &str) -> Option<PropertySet> {
    bag.get_property(&codec::key_for(object_id))
        .expect("bag read")
        .map(|value| codec::decode(&value).expect("current encoding"))
}
