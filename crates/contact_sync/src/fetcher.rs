//! Contact synchronization fetcher.
//!
//! The fetcher owns the per-session fetch state, drives the permission prompt, runs enumeration on
//! the host worker context, fingerprints the result, and notifies the delegate when the debounce
//! policy allows it. Public entry points and every delegate callback run on the UI context; the
//! worker only hands back a snapshot through a oneshot channel.
//!
//! Prompts, fetch cycles and the change listener are spawned detached through the host
//! [`TaskSpawner`](platform_host::TaskSpawner), so they run to completion even when every caller
//! stops waiting. Callers await a shared handle to the outcome.
//!
//! At most one permission prompt and one fetch cycle are in flight. Requests arriving meanwhile
//! join them and resolve with their outcome; a joining user-requested refresh upgrades the cycle
//! to user-requested.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
    sync::Arc,
};

use futures::{
    channel::{mpsc, oneshot},
    future::{FutureExt, Shared},
    StreamExt,
};
use leptos::logging;
use platform_host::{
    AuthorizationStatus, BackgroundTaskGuard, Contact, ContactChangeHandler, ContactHostServices,
    SettingsStore,
};

use crate::{
    config::ContactSyncConfig,
    debounce::{DebouncePolicy, NotificationRecord},
    delegate::ContactsDelegate,
    error::{programmer_error, SyncError},
    hash::content_hash,
};

const FETCH_TASK_LABEL: &str = "contacts-fetch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where the fetcher currently is in a fetch cycle.
pub enum FetcherPhase {
    /// No prompt or fetch in progress.
    Idle,
    /// Waiting for the user to answer the OS permission prompt.
    AwaitingPermission,
    /// Enumeration is running on the worker context.
    Fetching,
    /// Deciding whether to notify, and notifying.
    Notifying,
}

/// Shared completion of a detached prompt or fetch cycle.
type Outcome = Shared<oneshot::Receiver<Result<(), SyncError>>>;

struct InFlightFetch {
    user_requested: Rc<Cell<bool>>,
    outcome: Outcome,
}

struct FetchState {
    has_requested_at_least_once: bool,
    observation_installed: bool,
    last_notification: Option<NotificationRecord>,
    phase: FetcherPhase,
}

struct FetcherInner {
    host: ContactHostServices,
    config: ContactSyncConfig,
    policy: DebouncePolicy,
    state: RefCell<FetchState>,
    delegate: RefCell<Option<Weak<dyn ContactsDelegate>>>,
    pending_prompt: RefCell<Option<Outcome>>,
    in_flight: RefCell<Option<InFlightFetch>>,
}

#[derive(Clone)]
/// Handle to the process-wide contacts fetcher.
///
/// Clones share state. The handle is `!Send`: it lives on the UI context that created it.
pub struct ContactsFetcher {
    inner: Rc<FetcherInner>,
}

impl ContactsFetcher {
    /// Creates a fetcher over `host` with `config`.
    pub fn new(host: ContactHostServices, config: ContactSyncConfig) -> Self {
        let policy = config.debounce_policy();
        Self {
            inner: Rc::new(FetcherInner {
                host,
                config,
                policy,
                state: RefCell::new(FetchState {
                    has_requested_at_least_once: false,
                    observation_installed: false,
                    last_notification: None,
                    phase: FetcherPhase::Idle,
                }),
                delegate: RefCell::new(None),
                pending_prompt: RefCell::new(None),
                in_flight: RefCell::new(None),
            }),
        }
    }

    /// Creates a fetcher whose configuration is read from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] when stored configuration cannot be read.
    pub async fn from_settings<S: SettingsStore + ?Sized>(
        host: ContactHostServices,
        settings: &S,
    ) -> Result<Self, SyncError> {
        let config = ContactSyncConfig::load_with(settings).await?;
        Ok(Self::new(host, config))
    }

    /// Registers the delegate. The fetcher keeps only a weak reference.
    pub fn set_delegate<D: ContactsDelegate + 'static>(&self, delegate: &Rc<D>) {
        let delegate: Rc<dyn ContactsDelegate> = delegate.clone();
        *self.inner.delegate.borrow_mut() = Some(Rc::downgrade(&delegate));
    }

    /// Current cycle phase.
    pub fn phase(&self) -> FetcherPhase {
        self.inner.state.borrow().phase
    }

    /// Whether a fetch has been attempted this session.
    pub fn has_requested_at_least_once(&self) -> bool {
        self.inner.state.borrow().has_requested_at_least_once
    }

    /// The last delivered notification, if any.
    pub fn last_notification(&self) -> Option<NotificationRecord> {
        self.inner.state.borrow().last_notification
    }

    /// Current OS permission state, read fresh on every call.
    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.inner.host.contacts.authorization_status()
    }

    /// Active configuration.
    pub fn config(&self) -> &ContactSyncConfig {
        &self.inner.config
    }

    /// Ensures contacts have been fetched once this session, prompting for access if needed.
    ///
    /// Resolves immediately once any fetch has been attempted. Denied, restricted, and
    /// backgrounded-without-decision states resolve with `Ok(())` and no fetch. Requests made
    /// while the prompt is on screen share it instead of prompting again.
    ///
    /// Dropping the returned future only stops waiting: the prompt and the fetch it leads to
    /// still complete.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Permission`] when the prompt itself fails, and the fetch cycle's error
    /// otherwise.
    pub async fn request_once(&self) -> Result<(), SyncError> {
        if self.has_requested_at_least_once() {
            return Ok(());
        }
        self.ensure_observer_installed();

        let outcome = match self.authorization_status() {
            AuthorizationStatus::NotDetermined => {
                if self.inner.host.lifecycle.is_backgrounded() {
                    logging::log!("contacts permission undetermined while backgrounded");
                    return Ok(());
                }
                self.prompt()
            }
            AuthorizationStatus::Authorized => self.fetch(false),
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => return Ok(()),
        };
        settle(outcome).await
    }

    /// Starts a fetch if access is already granted and nothing has been fetched yet.
    ///
    /// Never prompts and never waits. Failures are logged by the cycle.
    pub fn fetch_once_if_already_authorized(&self) {
        if !self.authorization_status().is_authorized() || self.has_requested_at_least_once() {
            return;
        }
        drop(self.fetch(false));
    }

    /// Re-fetches on explicit user request. The delegate is always notified on success.
    ///
    /// Calling this without authorization is a programmer error.
    ///
    /// # Errors
    ///
    /// Returns the fetch cycle's error.
    pub async fn user_requested_refresh(&self) -> Result<(), SyncError> {
        let status = self.authorization_status();
        if !status.is_authorized() {
            programmer_error!(
                "contacts refresh requested while authorization is {}",
                status.as_str()
            );
            return Ok(());
        }
        settle(self.fetch(true)).await
    }

    /// Forwards the "app became active" signal so the store can detect sort-order drift.
    pub fn app_did_become_active(&self) {
        self.inner.host.contacts.app_did_become_active();
    }

    async fn contacts_did_change(&self) {
        if !self.authorization_status().is_authorized() {
            return;
        }
        if let Err(err) = settle(self.fetch(false)).await {
            logging::warn!("contacts fetch after change failed: {err}");
        }
    }

    /// Registers the store change handler and spawns the listener that turns its events into
    /// re-fetches.
    fn ensure_observer_installed(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.observation_installed {
                return;
            }
            state.observation_installed = true;
        }

        let (sender, receiver) = mpsc::unbounded();
        let handler: ContactChangeHandler = Arc::new(move || {
            let _ = sender.unbounded_send(());
        });
        match self.inner.host.contacts.start_observing_changes(handler) {
            Ok(()) => {
                let fetcher = Rc::downgrade(&self.inner);
                self.inner
                    .host
                    .spawner
                    .spawn_local(Box::pin(listen_for_changes(fetcher, receiver)));
            }
            Err(err) => programmer_error!("contacts change observer registration failed: {err}"),
        }
    }

    /// Shows the permission prompt, or joins the one already on screen.
    fn prompt(&self) -> Outcome {
        let pending = self.inner.pending_prompt.borrow().clone();
        if let Some(pending) = pending {
            return pending;
        }

        let (sender, receiver) = oneshot::channel();
        let outcome = receiver.shared();
        *self.inner.pending_prompt.borrow_mut() = Some(outcome.clone());
        self.set_phase(FetcherPhase::AwaitingPermission);

        let fetcher = self.clone();
        self.inner.host.spawner.spawn_local(Box::pin(async move {
            let _ = sender.send(fetcher.run_permission_prompt().await);
        }));
        outcome
    }

    async fn run_permission_prompt(self) -> Result<(), SyncError> {
        let answer = self.inner.host.contacts.request_access().await;
        self.inner.pending_prompt.borrow_mut().take();
        self.leave_phase(FetcherPhase::AwaitingPermission);
        match answer {
            Ok(true) => settle(self.fetch(false)).await,
            Ok(false) => {
                logging::log!("contacts permission declined");
                Ok(())
            }
            Err(err) => {
                logging::warn!("contacts permission prompt failed: {err}");
                Err(err.into())
            }
        }
    }

    /// Starts a fetch cycle, or joins the one in flight.
    fn fetch(&self, user_requested: bool) -> Outcome {
        self.inner.state.borrow_mut().has_requested_at_least_once = true;
        self.ensure_observer_installed();

        if let Some(cycle) = self.inner.in_flight.borrow().as_ref() {
            if user_requested {
                cycle.user_requested.set(true);
            }
            return cycle.outcome.clone();
        }

        let (sender, receiver) = oneshot::channel();
        let outcome = receiver.shared();
        let flag = Rc::new(Cell::new(user_requested));
        *self.inner.in_flight.borrow_mut() = Some(InFlightFetch {
            user_requested: flag.clone(),
            outcome: outcome.clone(),
        });

        let fetcher = self.clone();
        self.inner.host.spawner.spawn_local(Box::pin(async move {
            let _ = sender.send(fetcher.run_fetch_cycle(flag).await);
        }));
        outcome
    }

    async fn run_fetch_cycle(self, user_requested: Rc<Cell<bool>>) -> Result<(), SyncError> {
        let task = BackgroundTaskGuard::begin(
            self.inner.host.background_tasks.clone(),
            FETCH_TASK_LABEL,
        );
        self.set_phase(FetcherPhase::Fetching);
        let fetched = self.enumerate_on_worker().await;

        // Later requests start a fresh cycle from here on; the upgrade flag is final.
        self.inner.in_flight.borrow_mut().take();

        let result = match fetched {
            Ok(contacts) => {
                self.deliver(contacts, user_requested.get());
                Ok(())
            }
            Err(err) => {
                logging::warn!("contacts fetch failed: {err}");
                Err(err)
            }
        };
        self.set_phase(FetcherPhase::Idle);

        if task.is_expired() {
            logging::warn!(
                "{} background task expired before the fetch completed",
                task.label()
            );
        }
        drop(task);
        result
    }
    async fn enumerate_on_worker(&self) -> Result<Vec<Contact>, SyncError> {
        let (sender, receiver) = oneshot::channel();
        let store = self.inner.host.contacts.clone();
        let selection = self.inner.config.field_selection.clone();
        self.inner.host.worker.execute(Box::new(move || {
            let _ = sender.send(store.fetch_contacts(&selection));
        }));
        match receiver.await {
            Ok(result) => result.map_err(SyncError::from),
            Err(oneshot::Canceled) => Err(SyncError::WorkerDisconnected),
        }
    }

    fn deliver(&self, contacts: Vec<Contact>, is_user_requested: bool) {
        self.set_phase(FetcherPhase::Notifying);
        let content_hash = content_hash(&contacts);
        let now_ms = self.inner.host.clock.now_ms();
        let last = self.inner.state.borrow().last_notification;

        let decision = self
            .inner
            .policy
            .decide(last, content_hash, is_user_requested, now_ms);
        if !decision.should_notify() {
            logging::log!("contacts unchanged since last notification; suppressing");
            return;
        }

        let delegate = self
            .inner
            .delegate
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade);
        let Some(delegate) = delegate else {
            programmer_error!("contacts fetched with no delegate registered");
            return;
        };

        self.inner.state.borrow_mut().last_notification = Some(NotificationRecord {
            content_hash,
            notified_at_ms: now_ms,
        });
        logging::log!(
            "notifying contacts delegate ({}, {} contacts)",
            decision.as_str(),
            contacts.len()
        );
        delegate.contacts_updated(self, &contacts, is_user_requested);
    }

    fn set_phase(&self, phase: FetcherPhase) {
        self.inner.state.borrow_mut().phase = phase;
    }

    fn leave_phase(&self, phase: FetcherPhase) {
        let mut state = self.inner.state.borrow_mut();
        if state.phase == phase {
            state.phase = FetcherPhase::Idle;
        }
    }
}

/// Waits for a detached prompt or cycle to report its outcome.
async fn settle(outcome: Outcome) -> Result<(), SyncError> {
    outcome.await.unwrap_or(Err(SyncError::CycleDropped))
}

/// Re-fetches once per burst of store change events until the fetcher or the store goes away.
async fn listen_for_changes(
    fetcher: Weak<FetcherInner>,
    mut changes: mpsc::UnboundedReceiver<()>,
) {
    while changes.next().await.is_some() {
        while let Some(Some(())) = changes.next().now_or_never() {}
        let Some(inner) = fetcher.upgrade() else {
            break;
        };
        ContactsFetcher { inner }.contacts_did_change().await;
    }
}
