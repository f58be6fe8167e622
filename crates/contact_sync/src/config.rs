//! Runtime configuration for the contacts fetcher.

use platform_host::{load_setting_with, ContactFieldSelection, SettingsStore};
use serde::{Deserialize, Serialize};

use crate::{debounce::DebouncePolicy, error::SyncError};

/// Settings key holding the serialized [`ContactSyncConfig`].
pub const CONTACT_SYNC_CONFIG_KEY: &str = "contact_sync.config";
/// Default period after which an unchanged contact set is delivered again (12 hours).
pub const DEFAULT_RENOTIFY_INTERVAL_MS: u64 = 12 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Fetcher configuration. Missing fields take their defaults.
pub struct ContactSyncConfig {
    /// Time after the last notification before an unchanged set is re-delivered.
    pub renotify_interval_ms: u64,
    /// Fields the store adapter loads during enumeration.
    pub field_selection: ContactFieldSelection,
}

impl Default for ContactSyncConfig {
    fn default() -> Self {
        Self {
            renotify_interval_ms: DEFAULT_RENOTIFY_INTERVAL_MS,
            field_selection: ContactFieldSelection::default(),
        }
    }
}

impl ContactSyncConfig {
    /// Loads configuration from `store`, falling back to defaults when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] when the store fails or the stored JSON is malformed.
    pub async fn load_with<S: SettingsStore + ?Sized>(store: &S) -> Result<Self, SyncError> {
        let loaded = load_setting_with(store, CONTACT_SYNC_CONFIG_KEY)
            .await
            .map_err(SyncError::Config)?;
        Ok(loaded.unwrap_or_default())
    }

    /// Debounce policy derived from this configuration.
    pub fn debounce_policy(&self) -> DebouncePolicy {
        DebouncePolicy {
            renotify_interval_ms: self.renotify_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::{ContactField, MemorySettingsStore, NoopSettingsStore};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_key_yields_defaults() {
        let config = block_on(ContactSyncConfig::load_with(&NoopSettingsStore)).expect("load");
        assert_eq!(config, ContactSyncConfig::default());
        assert_eq!(config.debounce_policy().renotify_interval_ms, 43_200_000);
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let store = MemorySettingsStore::default();
        store.insert(CONTACT_SYNC_CONFIG_KEY, "{\"renotify_interval_ms\":60000}");
        let config = block_on(ContactSyncConfig::load_with(&store)).expect("load");
        assert_eq!(config.renotify_interval_ms, 60_000);
        assert_eq!(config.field_selection, ContactFieldSelection::default());
    }

    #[test]
    fn field_selection_round_trips_through_settings() {
        let config = ContactSyncConfig {
            renotify_interval_ms: 5,
            field_selection: ContactFieldSelection {
                version: 1,
                fields: vec![ContactField::Identifier, ContactField::PhoneNumbers],
            },
        };
        let store = MemorySettingsStore::default();
        store.insert(
            CONTACT_SYNC_CONFIG_KEY,
            &serde_json::to_string(&config).expect("serialize"),
        );
        assert_eq!(
            block_on(ContactSyncConfig::load_with(&store)).expect("load"),
            config
        );
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let store = MemorySettingsStore::default();
        store.insert(CONTACT_SYNC_CONFIG_KEY, "[1, 2");
        let err = block_on(ContactSyncConfig::load_with(&store)).expect_err("malformed");
        assert!(matches!(err, SyncError::Config(_)));
    }
}
