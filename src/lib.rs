//! Namespaced per-object custom properties over a flat host property bag.
//!
//! The host exposes a single global key/value bag. This crate gives every
//! logical object (an opaque id chosen by the caller) its own property set,
//! stored under one bag key per object, and upgrades data written by older
//! encodings in place.
//!
//! * [`bag`]: the host contract and an in-memory implementation.
//! * [`codec`]: namespace key derivation, the current encoding and the
//!   recognized legacy layouts.
//! * [`ObjectProperties`]: get/set/delete properties per object.
//! * [`migration`]: consolidates legacy data into the current encoding.

pub mod bag;
pub mod codec;
mod error;
pub mod migration;
mod properties;

pub use bag::{BagError, HostOptions, InMemoryPropertyBag, PropertyBag};
#[cfg(feature = "emitter")]
pub use bag::{ChangeNotifier, PropertyChange};
pub use codec::{decode, encode, key_for, CodecError, PropertySet, NAMESPACE_PREFIX};
pub use error::PropsError;
pub use migration::{migrate, MigrationOptions, MigrationReport};
pub use properties::{ObjectProperties, ObjectPropertiesExt, PropertiesConfig};
