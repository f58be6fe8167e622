//! Worker execution contexts for blocking host calls.

use std::{cell::RefCell, collections::VecDeque, fmt, rc::Rc, thread};

/// Unit of blocking work handed to a [`WorkerExecutor`].
pub type WorkerJob = Box<dyn FnOnce() + Send + 'static>;

/// Host service that runs blocking jobs away from the UI context.
///
/// Jobs report results through channels they capture; an executor that cannot run a job drops it,
/// which the waiting side observes as a cancelled channel.
pub trait WorkerExecutor {
    /// Schedules `job` on a worker context.
    fn execute(&self, job: WorkerJob);
}

#[derive(Debug, Clone, Copy, Default)]
/// Spawns one named OS thread per job.
pub struct ThreadWorkerExecutor;

impl ThreadWorkerExecutor {
    const THREAD_NAME: &'static str = "contacts-worker";
}

impl WorkerExecutor for ThreadWorkerExecutor {
    fn execute(&self, job: WorkerJob) {
        // A failed spawn drops `job` and with it the caller's sender.
        let _ = thread::Builder::new()
            .name(Self::THREAD_NAME.to_string())
            .spawn(job);
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Runs jobs immediately on the calling thread.
pub struct InlineWorkerExecutor;

impl WorkerExecutor for InlineWorkerExecutor {
    fn execute(&self, job: WorkerJob) {
        job();
    }
}

#[derive(Clone, Default)]
/// Queues jobs until [`DeferredWorkerExecutor::run_pending`] is called.
pub struct DeferredWorkerExecutor {
    queue: Rc<RefCell<VecDeque<WorkerJob>>>,
}

impl fmt::Debug for DeferredWorkerExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredWorkerExecutor")
            .field("pending", &self.pending())
            .finish()
    }
}

impl DeferredWorkerExecutor {
    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs every queued job in submission order and returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(job) = self.queue.borrow_mut().pop_front() else {
                return ran;
            };
            job();
            ran += 1;
        }
    }

    /// Drops every queued job without running it.
    pub fn discard_pending(&self) {
        self.queue.borrow_mut().clear();
    }
}

impl WorkerExecutor for DeferredWorkerExecutor {
    fn execute(&self, job: WorkerJob) {
        self.queue.borrow_mut().push_back(job);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn thread_executor_runs_job_on_named_worker() {
        let (tx, rx) = mpsc::channel();
        ThreadWorkerExecutor.execute(Box::new(move || {
            let name = thread::current().name().map(str::to_string);
            let _ = tx.send(name);
        }));
        let name = rx.recv().expect("worker result");
        assert_eq!(name.as_deref(), Some("contacts-worker"));
    }

    #[test]
    fn deferred_executor_runs_in_submission_order() {
        let executor = DeferredWorkerExecutor::default();
        let (tx, rx) = mpsc::channel();
        for n in 0..3 {
            let tx = tx.clone();
            executor.execute(Box::new(move || {
                let _ = tx.send(n);
            }));
        }
        assert_eq!(executor.pending(), 3);
        assert_eq!(executor.run_pending(), 3);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(executor.pending(), 0);
    }
}
