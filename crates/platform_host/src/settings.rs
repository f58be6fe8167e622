//! Read-only settings storage used by configuration loaders.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::de::DeserializeOwned;

/// Object-safe boxed future used by [`SettingsStore`].
pub type SettingsStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service exposing settings as JSON text per key.
pub trait SettingsStore {
    /// Loads the raw JSON stored under `key`.
    fn load_setting<'a>(
        &'a self,
        key: &'a str,
    ) -> SettingsStoreFuture<'a, Result<Option<String>, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Settings store with no entries.
pub struct NoopSettingsStore;

impl SettingsStore for NoopSettingsStore {
    fn load_setting<'a>(
        &'a self,
        _key: &'a str,
    ) -> SettingsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async { Ok(None) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory settings keyed by string.
pub struct MemorySettingsStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemorySettingsStore {
    /// Stores raw JSON under `key`.
    pub fn insert(&self, key: &str, raw_json: &str) {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw_json.to_string());
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load_setting<'a>(
        &'a self,
        key: &'a str,
    ) -> SettingsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(key).cloned()) })
    }
}

/// Loads and deserializes a typed setting through a [`SettingsStore`].
///
/// # Errors
///
/// Returns an error when the store or JSON deserialization fails.
pub async fn load_setting_with<S: SettingsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = store.load_setting(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("setting `{key}`: {e}"))
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Interval {
        minutes: u32,
    }

    #[test]
    fn typed_setting_loads_and_reports_bad_json() {
        let store = MemorySettingsStore::default();
        store.insert("interval", "{\"minutes\":5}");
        store.insert("broken", "{");

        let loaded: Option<Interval> =
            block_on(load_setting_with(&store, "interval")).expect("load");
        assert_eq!(loaded, Some(Interval { minutes: 5 }));

        let missing: Option<Interval> =
            block_on(load_setting_with(&store, "absent")).expect("load");
        assert_eq!(missing, None);

        let err = block_on(load_setting_with::<_, Interval>(&store, "broken"))
            .expect_err("bad json");
        assert!(err.starts_with("setting `broken`"));
    }

    #[test]
    fn noop_settings_store_is_empty() {
        let store: &dyn SettingsStore = &NoopSettingsStore;
        assert_eq!(block_on(store.load_setting("any")).expect("load"), None);
    }
}
