//! Typed host contracts and in-memory adapters for contact synchronization.
//!
//! This crate is the API-first boundary between the synchronization core and the platform. It
//! exposes the contact model, the contacts store adapter contract, worker and background-task
//! services, a detached task spawner, lifecycle and clock sources, and settings storage.
//! Platform-specific adapters implement these traits outside the core.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod background_task;
pub mod contacts;
pub mod host;
pub mod lifecycle;
pub mod settings;
pub mod spawn;
pub mod time;
pub mod worker;

pub use background_task::{
    BackgroundTaskGuard, BackgroundTaskId, BackgroundTaskService, MemoryBackgroundTaskService,
    NoopBackgroundTaskService,
};
pub use contacts::{
    AuthorizationStatus, Contact, ContactChangeHandler, ContactField, ContactFieldSelection,
    ContactSortOrder, ContactStore, ContactStoreError, ContactStoreFuture, LabeledValue,
    MemoryContactStore, PostalAddress, CONTACT_FIELD_SELECTION_VERSION,
};
pub use host::ContactHostServices;
pub use lifecycle::{AppLifecycle, MemoryAppLifecycle};
pub use settings::{
    load_setting_with, MemorySettingsStore, NoopSettingsStore, SettingsStore, SettingsStoreFuture,
};
pub use spawn::{LocalPoolSpawner, LocalTask, TaskSpawner};
pub use time::{unix_time_ms_now, Clock, ManualClock, SystemClock};
pub use worker::{
    DeferredWorkerExecutor, InlineWorkerExecutor, ThreadWorkerExecutor, WorkerExecutor, WorkerJob,
};
