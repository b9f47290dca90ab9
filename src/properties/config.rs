use crate::migration::MigrationOptions;

/// Settings for [`ObjectProperties::open`](super::ObjectProperties::open).
#[derive(Debug, Clone, PartialEq)]
pub struct PropertiesConfig {
    /// Run a migration pass before handing out the accessor.
    pub migrate_on_open: bool,
    pub migration: MigrationOptions,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            migrate_on_open: true,
            migration: MigrationOptions::default(),
        }
    }
}

impl PropertiesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_migrate_on_open(mut self, migrate_on_open: bool) -> Self {
        self.migrate_on_open = migrate_on_open;
        self
    }

    pub fn with_migration(mut self, migration: MigrationOptions) -> Self {
        self.migration = migration;
        self
    }
}
