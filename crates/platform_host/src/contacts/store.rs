//! Contact store adapter contract and in-memory adapter.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::channel::oneshot;

use super::types::{AuthorizationStatus, Contact, ContactFieldSelection, ContactSortOrder};

/// Object-safe boxed future used by [`ContactStore`] async methods.
pub type ContactStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Callback fired when the platform reports that the contacts database changed.
pub type ContactChangeHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Failures reported by a [`ContactStore`] adapter.
pub enum ContactStoreError {
    /// The OS failed or refused while handling the access prompt.
    Permission(String),
    /// The platform store failed to enumerate contacts.
    Enumeration(String),
    /// A change handler is already registered.
    AlreadyObserving,
    /// The adapter does not understand this field-selection version.
    UnsupportedFieldSelection {
        /// Rejected selection version.
        version: u32,
    },
}

impl fmt::Display for ContactStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permission(reason) => write!(f, "contacts permission failed: {reason}"),
            Self::Enumeration(reason) => write!(f, "contacts enumeration failed: {reason}"),
            Self::AlreadyObserving => write!(f, "contact change handler already registered"),
            Self::UnsupportedFieldSelection { version } => {
                write!(f, "unsupported contact field selection version {version}")
            }
        }
    }
}

impl std::error::Error for ContactStoreError {}

/// Host adapter over the device contacts database.
///
/// Implementations must be shareable with a worker context because
/// [`ContactStore::fetch_contacts`] blocks and is never called on the UI context.
pub trait ContactStore: Send + Sync {
    /// Reads the current OS permission state. No side effects.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Shows the OS permission prompt and resolves with whether access was granted.
    ///
    /// Callers only invoke this while the status is [`AuthorizationStatus::NotDetermined`].
    fn request_access<'a>(&'a self) -> ContactStoreFuture<'a, Result<bool, ContactStoreError>>;

    /// Enumerates every contact using `selection`, sorted by the user's preferred name order.
    ///
    /// This is a blocking call.
    fn fetch_contacts(
        &self,
        selection: &ContactFieldSelection,
    ) -> Result<Vec<Contact>, ContactStoreError>;

    /// Registers the change handler. A second registration returns
    /// [`ContactStoreError::AlreadyObserving`].
    fn start_observing_changes(&self, handler: ContactChangeHandler)
        -> Result<(), ContactStoreError>;

    /// Consumes the "app became active" lifecycle signal.
    ///
    /// The OS does not report name-sort-order changes as database mutations, so adapters compare
    /// the current order with the last observed one and fire the handler on drift.
    fn app_did_become_active(&self);
}

#[derive(Default)]
struct MemoryContactState {
    status: Option<AuthorizationStatus>,
    grant_on_prompt: bool,
    prompt_failure: Option<String>,
    hold_prompts: bool,
    held_prompts: Vec<oneshot::Sender<()>>,
    enumeration_failure: Option<String>,
    contacts: Vec<Contact>,
    sort_order: ContactSortOrder,
    observed_sort_order: Option<ContactSortOrder>,
    handler: Option<ContactChangeHandler>,
    access_requests: usize,
    fetches: usize,
}

#[derive(Clone, Default)]
/// In-memory contact store with scripted permission and enumeration behavior.
///
/// Clones share state, so a test can keep one handle while the fetcher owns another.
pub struct MemoryContactStore {
    inner: Arc<Mutex<MemoryContactState>>,
}

impl fmt::Debug for MemoryContactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("MemoryContactStore")
            .field("status", &state.status)
            .field("contacts", &state.contacts.len())
            .field("sort_order", &state.sort_order)
            .field("observing", &state.handler.is_some())
            .finish()
    }
}

impl MemoryContactStore {
    /// Creates a store in the given permission state holding `contacts`.
    pub fn new(status: AuthorizationStatus, contacts: Vec<Contact>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state();
            state.status = Some(status);
            state.grant_on_prompt = true;
            state.contacts = contacts;
        }
        store
    }

    fn state(&self) -> MutexGuard<'_, MemoryContactState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the permission state directly, as if changed in system settings.
    pub fn set_authorization_status(&self, status: AuthorizationStatus) {
        self.state().status = Some(status);
    }

    /// Scripts the user's answer to the next permission prompt.
    pub fn set_grant_on_prompt(&self, grant: bool) {
        self.state().grant_on_prompt = grant;
    }

    /// Makes the next permission prompts fail with `reason`. `None` clears the failure.
    pub fn set_prompt_failure(&self, reason: Option<&str>) {
        self.state().prompt_failure = reason.map(str::to_string);
    }

    /// Makes enumeration fail with `reason`. `None` clears the failure.
    pub fn set_enumeration_failure(&self, reason: Option<&str>) {
        self.state().enumeration_failure = reason.map(str::to_string);
    }

    /// Keeps later permission prompts on screen until [`Self::release_held_prompts`].
    pub fn hold_prompts(&self) {
        self.state().hold_prompts = true;
    }

    /// Answers every held prompt and stops holding new ones.
    pub fn release_held_prompts(&self) {
        let held = {
            let mut state = self.state();
            state.hold_prompts = false;
            std::mem::take(&mut state.held_prompts)
        };
        for prompt in held {
            let _ = prompt.send(());
        }
    }

    /// Replaces the stored contacts without firing the change handler.
    pub fn replace_contacts(&self, contacts: Vec<Contact>) {
        self.state().contacts = contacts;
    }

    /// Inserts or replaces a contact by identifier and fires the change handler.
    pub fn upsert_contact(&self, contact: Contact) {
        {
            let mut state = self.state();
            match state
                .contacts
                .iter_mut()
                .find(|existing| existing.identifier == contact.identifier)
            {
                Some(existing) => *existing = contact,
                None => state.contacts.push(contact),
            }
        }
        self.notify_external_change();
    }

    /// Changes the user's name-sort preference. No change event fires until activation.
    pub fn set_sort_order(&self, order: ContactSortOrder) {
        self.state().sort_order = order;
    }

    /// Fires the registered change handler, if any, as the OS would on a database mutation.
    pub fn notify_external_change(&self) {
        let handler = self.state().handler.clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Number of permission prompts shown so far.
    pub fn access_request_count(&self) -> usize {
        self.state().access_requests
    }

    /// Number of enumeration attempts so far.
    pub fn fetch_count(&self) -> usize {
        self.state().fetches
    }

    /// Returns whether a change handler is registered.
    pub fn is_observing(&self) -> bool {
        self.state().handler.is_some()
    }
}

impl ContactStore for MemoryContactStore {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.state()
            .status
            .unwrap_or(AuthorizationStatus::NotDetermined)
    }

    fn request_access<'a>(&'a self) -> ContactStoreFuture<'a, Result<bool, ContactStoreError>> {
        Box::pin(async move {
            let held = {
                let mut state = self.state();
                state.access_requests += 1;
                if state.hold_prompts {
                    let (answer, held) = oneshot::channel();
                    state.held_prompts.push(answer);
                    Some(held)
                } else {
                    None
                }
            };
            if let Some(held) = held {
                let _ = held.await;
            }

            let mut state = self.state();
            if let Some(reason) = state.prompt_failure.clone() {
                return Err(ContactStoreError::Permission(reason));
            }
            let granted = state.grant_on_prompt;
            state.status = Some(if granted {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            });
            Ok(granted)
        })
    }

    fn fetch_contacts(
        &self,
        selection: &ContactFieldSelection,
    ) -> Result<Vec<Contact>, ContactStoreError> {
        let mut state = self.state();
        state.fetches += 1;
        if !selection.is_supported() {
            return Err(ContactStoreError::UnsupportedFieldSelection {
                version: selection.version,
            });
        }
        if let Some(reason) = state.enumeration_failure.clone() {
            return Err(ContactStoreError::Enumeration(reason));
        }
        if state.status != Some(AuthorizationStatus::Authorized) {
            return Err(ContactStoreError::Enumeration(
                "contacts access not authorized".to_string(),
            ));
        }

        let order = state.sort_order;
        let mut contacts: Vec<Contact> = state
            .contacts
            .iter()
            .map(|contact| contact.project(selection))
            .collect();
        contacts.sort_by_cached_key(|contact| contact.sort_key(order));
        Ok(contacts)
    }

    fn start_observing_changes(
        &self,
        handler: ContactChangeHandler,
    ) -> Result<(), ContactStoreError> {
        let mut state = self.state();
        if state.handler.is_some() {
            return Err(ContactStoreError::AlreadyObserving);
        }
        state.observed_sort_order = Some(state.sort_order);
        state.handler = Some(handler);
        Ok(())
    }

    fn app_did_become_active(&self) {
        let handler = {
            let mut state = self.state();
            let current = state.sort_order;
            match (&state.handler, state.observed_sort_order) {
                (Some(handler), Some(observed)) if observed != current => {
                    let handler = handler.clone();
                    state.observed_sort_order = Some(current);
                    Some(handler)
                }
                _ => None,
            }
        };
        if let Some(handler) = handler {
            handler();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::{executor::block_on, FutureExt};

    use super::*;

    fn counting_handler() -> (ContactChangeHandler, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let handler: ContactChangeHandler = Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (handler, count)
    }

    #[test]
    fn fetch_sorts_by_current_name_order() {
        let store = MemoryContactStore::new(
            AuthorizationStatus::Authorized,
            vec![
                Contact::new("1", "Zed", "Adams"),
                Contact::new("2", "Amy", "Young"),
            ],
        );
        let selection = ContactFieldSelection::default();

        let given_first = store.fetch_contacts(&selection).expect("fetch");
        assert_eq!(given_first[0].identifier, "2");

        store.set_sort_order(ContactSortOrder::FamilyNameFirst);
        let family_first = store.fetch_contacts(&selection).expect("fetch");
        assert_eq!(family_first[0].identifier, "1");
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn fetch_rejects_unknown_selection_version_and_scripted_failures() {
        let store = MemoryContactStore::new(AuthorizationStatus::Authorized, Vec::new());
        let selection = ContactFieldSelection {
            version: 99,
            fields: Vec::new(),
        };
        assert_eq!(
            store.fetch_contacts(&selection),
            Err(ContactStoreError::UnsupportedFieldSelection { version: 99 })
        );

        store.set_enumeration_failure(Some("database locked"));
        assert_eq!(
            store.fetch_contacts(&ContactFieldSelection::default()),
            Err(ContactStoreError::Enumeration("database locked".to_string()))
        );
    }

    #[test]
    fn request_access_records_prompt_outcome() {
        let store = MemoryContactStore::new(AuthorizationStatus::NotDetermined, Vec::new());
        store.set_grant_on_prompt(false);
        assert_eq!(block_on(store.request_access()), Ok(false));
        assert_eq!(store.authorization_status(), AuthorizationStatus::Denied);

        store.set_prompt_failure(Some("prompt unavailable"));
        assert!(matches!(
            block_on(store.request_access()),
            Err(ContactStoreError::Permission(_))
        ));
        assert_eq!(store.access_request_count(), 2);
    }

    #[test]
    fn held_prompt_answers_only_after_release() {
        let store = MemoryContactStore::new(AuthorizationStatus::NotDetermined, Vec::new());
        store.hold_prompts();

        let mut prompt = store.request_access();
        assert_eq!(prompt.as_mut().now_or_never(), None);
        assert_eq!(store.access_request_count(), 1);
        assert_eq!(store.authorization_status(), AuthorizationStatus::NotDetermined);

        store.release_held_prompts();
        assert_eq!(block_on(prompt), Ok(true));
        assert_eq!(store.authorization_status(), AuthorizationStatus::Authorized);
    }

    #[test]
    fn second_registration_is_rejected() {
        let store = MemoryContactStore::new(AuthorizationStatus::Authorized, Vec::new());
        let (first, _) = counting_handler();
        let (second, _) = counting_handler();
        store.start_observing_changes(first).expect("first");
        assert_eq!(
            store.start_observing_changes(second),
            Err(ContactStoreError::AlreadyObserving)
        );
    }

    #[test]
    fn activation_fires_only_after_sort_order_drift() {
        let store = MemoryContactStore::new(AuthorizationStatus::Authorized, Vec::new());
        let (handler, count) = counting_handler();
        store.start_observing_changes(handler).expect("observe");

        store.app_did_become_active();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        store.set_sort_order(ContactSortOrder::FamilyNameFirst);
        store.app_did_become_active();
        store.app_did_become_active();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        store.upsert_contact(Contact::new("1", "Ada", "Lovelace"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
