//! Contact synchronization core.
//!
//! [`ContactsFetcher`] requests contacts permission, enumerates the address book on a worker
//! context, fingerprints the result with [`content_hash`], and notifies a [`ContactsDelegate`]
//! when the [`DebouncePolicy`] allows it. Platform access goes through the service traits in
//! `platform_host`, injected as a [`platform_host::ContactHostServices`] bundle.

pub mod config;
pub mod debounce;
pub mod delegate;
pub mod error;
pub mod fetcher;
pub mod hash;
pub mod spawner;

pub use config::{ContactSyncConfig, CONTACT_SYNC_CONFIG_KEY, DEFAULT_RENOTIFY_INTERVAL_MS};
pub use debounce::{DebouncePolicy, NotificationRecord, NotifyDecision};
pub use delegate::ContactsDelegate;
pub use error::SyncError;
pub use fetcher::{ContactsFetcher, FetcherPhase};
pub use hash::{contact_hash, content_hash, CONTENT_HASH_SEED};
pub use spawner::LeptosTaskSpawner;
