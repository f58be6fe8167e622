//! Scoped background-execution tokens that defer process suspension.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeSet,
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifier of one background task registration.
pub struct BackgroundTaskId(pub u64);

/// Host service that keeps the process alive while work is in progress.
pub trait BackgroundTaskService {
    /// Starts a background task. The OS may expire it before [`Self::end_task`] is called.
    fn begin_task(&self, label: &'static str) -> BackgroundTaskId;

    /// Ends a background task. Ending an unknown or expired id is a no-op.
    fn end_task(&self, id: BackgroundTaskId);

    /// Returns whether the OS expired the task before it ended.
    fn is_expired(&self, id: BackgroundTaskId) -> bool;
}

/// RAII token for a background task.
///
/// Dropping the guard ends the task, so every exit path of the owning operation releases it.
pub struct BackgroundTaskGuard {
    service: Rc<dyn BackgroundTaskService>,
    id: BackgroundTaskId,
    label: &'static str,
}

impl BackgroundTaskGuard {
    /// Begins a task on `service`.
    pub fn begin(service: Rc<dyn BackgroundTaskService>, label: &'static str) -> Self {
        let id = service.begin_task(label);
        Self { service, id, label }
    }

    /// Registration id.
    pub fn id(&self) -> BackgroundTaskId {
        self.id
    }

    /// Label passed at registration.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns whether the OS has already expired this task.
    pub fn is_expired(&self) -> bool {
        self.service.is_expired(self.id)
    }
}

impl Drop for BackgroundTaskGuard {
    fn drop(&mut self) {
        self.service.end_task(self.id);
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Background task service for hosts without suspension semantics.
pub struct NoopBackgroundTaskService;

impl BackgroundTaskService for NoopBackgroundTaskService {
    fn begin_task(&self, _label: &'static str) -> BackgroundTaskId {
        BackgroundTaskId(0)
    }

    fn end_task(&self, _id: BackgroundTaskId) {}

    fn is_expired(&self, _id: BackgroundTaskId) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory background task service that tracks active registrations.
pub struct MemoryBackgroundTaskService {
    next_id: Rc<Cell<u64>>,
    active: Rc<RefCell<BTreeSet<BackgroundTaskId>>>,
    expired: Rc<RefCell<BTreeSet<BackgroundTaskId>>>,
    begun: Rc<Cell<usize>>,
}

impl MemoryBackgroundTaskService {
    /// Number of tasks begun and not yet ended or expired.
    pub fn active_count(&self) -> usize {
        self.active.borrow().len()
    }

    /// Total number of tasks begun.
    pub fn begun_count(&self) -> usize {
        self.begun.get()
    }

    /// Expires every active task, as the OS does when background time runs out.
    pub fn expire_all(&self) {
        let mut active = self.active.borrow_mut();
        self.expired.borrow_mut().extend(active.iter().copied());
        active.clear();
    }
}

impl BackgroundTaskService for MemoryBackgroundTaskService {
    fn begin_task(&self, _label: &'static str) -> BackgroundTaskId {
        let id = BackgroundTaskId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.begun.set(self.begun.get() + 1);
        self.active.borrow_mut().insert(id);
        id
    }

    fn end_task(&self, id: BackgroundTaskId) {
        self.active.borrow_mut().remove(&id);
    }

    fn is_expired(&self, id: BackgroundTaskId) -> bool {
        self.expired.borrow().contains(&id)
    }
}
