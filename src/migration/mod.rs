//! Migration - consolidates legacy-encoded object properties into the
//! current namespace encoding.
//!
//! Safe to run on every start: once the bag holds no legacy keys a run
//! reads the snapshot and writes nothing.
//!
//! ## Ordering
//!
//! The bag snapshot is walked in lexicographic key order. When two legacy
//! keys carry the same property for the same object, the later key wins.
//! Properties already present in the current encoding always win over
//! legacy ones.
//!
//! All writes happen before any removal, so an interrupted run leaves the
//! legacy keys in place and the next run picks them up again.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::bag::{HostOptions, PropertyBag};
use crate::codec::legacy::{classify, Classification, LegacyRecord};
use crate::codec::{decode, encode, key_for, PropertySet};
use crate::error::PropsError;

/// Options for a migration run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationOptions {
    /// Forwarded to every host write and removal the migration makes.
    pub host_options: HostOptions,
}

impl MigrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host_options(mut self, host_options: HostOptions) -> Self {
        self.host_options = host_options;
        self
    }
}

/// What a migration run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Objects whose namespace key was (re)written.
    pub objects_migrated: usize,
    /// Legacy keys whose data was consolidated.
    pub legacy_keys: usize,
    /// Legacy keys removed from the bag afterwards.
    pub keys_removed: usize,
    /// Legacy keys left in place because their data could not be read.
    pub skipped: Vec<String>,
}

impl MigrationReport {
    /// True when the run changed nothing in the bag.
    pub fn is_noop(&self) -> bool {
        self.objects_migrated == 0 && self.keys_removed == 0
    }
}

#[derive(Default)]
struct Staged {
    properties: PropertySet,
    keys: Vec<String>,
}

/// Run one migration pass over the whole bag.
///
/// Must not overlap with itself or with writes to the same objects.
pub fn migrate<B>(bag: &B, options: &MigrationOptions) -> Result<MigrationReport, PropsError>
where
    B: PropertyBag + ?Sized,
{
    let snapshot = bag.get_properties()?;
    let mut report = MigrationReport::default();
    let mut staged: BTreeMap<String, Staged> = BTreeMap::new();
    let mut blocked: BTreeSet<String> = BTreeSet::new();

    for (key, value) in &snapshot {
        match classify(key, value) {
            Classification::NotLegacy => {}
            Classification::Legacy { kind, record } => {
                debug!(key = %key, layout = %kind, object_id = record.object_id(), "found legacy object properties");
                let entry = staged.entry(record.object_id().to_string()).or_default();
                match record {
                    LegacyRecord::Property { name, value, .. } => {
                        entry.properties.insert(name, value);
                    }
                    LegacyRecord::Set { properties, .. } => entry.properties.extend(properties),
                }
                entry.keys.push(key.clone());
            }
            Classification::Unreadable {
                kind,
                object_id,
                error,
            } => {
                warn!(key = %key, layout = %kind, error = %error, "skipping unreadable legacy object properties");
                report.skipped.push(key.clone());
                if let Some(object_id) = object_id {
                    blocked.insert(object_id);
                }
            }
        }
    }

    let mut obsolete = Vec::new();
    for (object_id, legacy) in staged {
        if blocked.contains(&object_id) {
            // Writing would overwrite the unreadable value at the namespace key.
            warn!(object_id = %object_id, keys = legacy.keys.len(), "namespace key unreadable, leaving legacy object properties in place");
            report.skipped.extend(legacy.keys);
            continue;
        }

        let namespace_key = key_for(&object_id);
        let mut merged = match snapshot.get(&namespace_key) {
            Some(value) if !value.is_null() && !legacy.keys.contains(&namespace_key) => {
                match decode(value) {
                    Ok(current) => current,
                    Err(error) => {
                        // Writing would replace data no layout recognizes.
                        warn!(key = %namespace_key, error = %error, keys = legacy.keys.len(), "namespace key holds unrecognized data, leaving legacy object properties in place");
                        report.skipped.extend(legacy.keys);
                        continue;
                    }
                }
            }
            _ => PropertySet::new(),
        };
        for (name, value) in legacy.properties {
            merged.entry(name).or_insert(value);
        }

        bag.set_property(&namespace_key, encode(&merged)?, &options.host_options)?;
        report.objects_migrated += 1;
        report.legacy_keys += legacy.keys.len();
        obsolete.extend(legacy.keys.into_iter().filter(|key| *key != namespace_key));
    }

    for key in &obsolete {
        if bag.remove_property(key, &options.host_options)? {
            report.keys_removed += 1;
        }
    }

    report.skipped.sort();
    if !report.is_noop() {
        info!(
            objects = report.objects_migrated,
            legacy_keys = report.legacy_keys,
            removed = report.keys_removed,
            skipped = report.skipped.len(),
            "migrated legacy object properties"
        );
    }
    Ok(report)
}
