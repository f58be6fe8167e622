//! Contacts-domain contracts and in-memory adapter.

mod store;
mod types;

pub use store::{
    ContactChangeHandler, ContactStore, ContactStoreError, ContactStoreFuture, MemoryContactStore,
};
pub use types::{
    AuthorizationStatus, Contact, ContactField, ContactFieldSelection, ContactSortOrder,
    LabeledValue, PostalAddress, CONTACT_FIELD_SELECTION_VERSION,
};
