//! Store configuration.

use crate::import::ImportPolicy;
use crate::index::EditPolicy;
use std::path::PathBuf;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create an empty store file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to fsync the file after every append (safer but slower).
    pub sync_on_append: bool,

    /// Directory that [`Database::backup`](crate::Database::backup) writes
    /// snapshots into.
    pub backup_dir: PathBuf,

    /// How bulk imports react to a failed add.
    pub import_policy: ImportPolicy,

    /// How edits reach the file.
    pub edit_policy: EditPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_append: false,
            backup_dir: PathBuf::from("backups"),
            import_policy: ImportPolicy::Continue,
            edit_policy: EditPolicy::Reappend,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync after every append.
    #[must_use]
    pub const fn sync_on_append(mut self, value: bool) -> Self {
        self.sync_on_append = value;
        self
    }

    /// Sets the default snapshot directory.
    #[must_use]
    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    /// Sets the import failure policy.
    #[must_use]
    pub const fn import_policy(mut self, policy: ImportPolicy) -> Self {
        self.import_policy = policy;
        self
    }

    /// Sets the edit policy.
    #[must_use]
    pub const fn edit_policy(mut self, policy: EditPolicy) -> Self {
        self.edit_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(!config.sync_on_append);
        assert_eq!(config.backup_dir, PathBuf::from("backups"));
        assert_eq!(config.import_policy, ImportPolicy::Continue);
        assert_eq!(config.edit_policy, EditPolicy::Reappend);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .sync_on_append(true)
            .backup_dir("/tmp/snapshots")
            .import_policy(ImportPolicy::FailFast)
            .edit_policy(EditPolicy::IndexOnly);

        assert!(!config.create_if_missing);
        assert!(config.sync_on_append);
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/snapshots"));
        assert_eq!(config.import_policy, ImportPolicy::FailFast);
        assert_eq!(config.edit_policy, EditPolicy::IndexOnly);
    }
}
