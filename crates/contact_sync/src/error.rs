//! Error types for the contact synchronization core.

use platform_host::ContactStoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Recoverable failures surfaced through fetch completions.
///
/// Values are `Clone` because one in-flight fetch outcome is delivered to every coalesced caller.
pub enum SyncError {
    /// The OS failed or errored while handling the permission prompt.
    #[error("contacts permission request failed: {0}")]
    Permission(String),
    /// The platform store failed to enumerate contacts.
    #[error("contacts enumeration failed: {0}")]
    Enumeration(String),
    /// The worker context dropped the enumeration job without reporting a result.
    #[error("contacts worker dropped the fetch before completing")]
    WorkerDisconnected,
    /// The UI executor dropped a detached fetch cycle before it reported an outcome.
    #[error("contacts fetch cycle was dropped before completing")]
    CycleDropped,
    /// Stored configuration could not be read.
    #[error("invalid contact sync configuration: {0}")]
    Config(String),
}

impl From<ContactStoreError> for SyncError {
    fn from(err: ContactStoreError) -> Self {
        match err {
            ContactStoreError::Permission(reason) => Self::Permission(reason),
            ContactStoreError::Enumeration(reason) => Self::Enumeration(reason),
            other => Self::Enumeration(other.to_string()),
        }
    }
}

/// Reports an invariant violation by the caller.
///
/// Panics in debug builds; release builds log the message and let the caller continue with a
/// no-op.
macro_rules! programmer_error {
    ($($arg:tt)*) => {{
        if cfg!(debug_assertions) {
            panic!($($arg)*);
        } else {
            leptos::logging::error!($($arg)*);
        }
    }};
}

pub(crate) use programmer_error;
