//! Host service bundle injected into the contact synchronization runtime.

use std::{rc::Rc, sync::Arc};

use crate::{
    AppLifecycle, BackgroundTaskService, Clock, ContactStore, InlineWorkerExecutor,
    MemoryAppLifecycle, MemoryBackgroundTaskService, NoopBackgroundTaskService, SystemClock,
    TaskSpawner, ThreadWorkerExecutor, WorkerExecutor,
};

#[derive(Clone)]
/// Platform services consumed by the contact synchronization core.
///
/// The composition layer builds one bundle per process and hands it to the fetcher; nothing in
/// the core reaches for platform globals.
pub struct ContactHostServices {
    /// Contacts database adapter.
    pub contacts: Arc<dyn ContactStore>,
    /// Worker context for blocking enumeration.
    pub worker: Rc<dyn WorkerExecutor>,
    /// UI-context spawner for work that must outlive its caller.
    pub spawner: Rc<dyn TaskSpawner>,
    /// Background-execution token provider.
    pub background_tasks: Rc<dyn BackgroundTaskService>,
    /// Foreground/background state.
    pub lifecycle: Rc<dyn AppLifecycle>,
    /// Wall clock for time-based policies.
    pub clock: Rc<dyn Clock>,
}

impl ContactHostServices {
    /// Production-shaped bundle: thread worker, system clock, no suspension semantics.
    pub fn new(
        contacts: Arc<dyn ContactStore>,
        spawner: Rc<dyn TaskSpawner>,
        lifecycle: Rc<dyn AppLifecycle>,
    ) -> Self {
        Self {
            contacts,
            worker: Rc::new(ThreadWorkerExecutor),
            spawner,
            background_tasks: Rc::new(NoopBackgroundTaskService),
            lifecycle,
            clock: Rc::new(SystemClock),
        }
    }

    /// Deterministic bundle: inline worker, in-memory background tasks and lifecycle.
    pub fn in_memory(contacts: Arc<dyn ContactStore>, spawner: Rc<dyn TaskSpawner>) -> Self {
        Self {
            contacts,
            worker: Rc::new(InlineWorkerExecutor),
            spawner,
            background_tasks: Rc::new(MemoryBackgroundTaskService::default()),
            lifecycle: Rc::new(MemoryAppLifecycle::default()),
            clock: Rc::new(SystemClock),
        }
    }

    /// Replaces the worker context.
    pub fn with_worker(mut self, worker: Rc<dyn WorkerExecutor>) -> Self {
        self.worker = worker;
        self
    }

    /// Replaces the background task service.
    pub fn with_background_tasks(
        mut self,
        background_tasks: Rc<dyn BackgroundTaskService>,
    ) -> Self {
        self.background_tasks = background_tasks;
        self
    }

    /// Replaces the lifecycle source.
    pub fn with_lifecycle(mut self, lifecycle: Rc<dyn AppLifecycle>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
