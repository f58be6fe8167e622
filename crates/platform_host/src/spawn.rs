//! Detached task spawning on the UI context.

use std::{future::Future, pin::Pin};

use futures::{
    executor::LocalSpawner,
    task::{LocalFutureObj, LocalSpawn},
};

/// Boxed `!Send` task run to completion on the UI context.
pub type LocalTask = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Host service that runs tasks on the UI context independently of whoever started them.
///
/// Work spawned here keeps running after the caller stops waiting for it.
pub trait TaskSpawner {
    /// Spawns `task` detached.
    fn spawn_local(&self, task: LocalTask);
}

#[derive(Clone)]
/// Spawner backed by a `futures` [`LocalPool`](futures::executor::LocalPool).
pub struct LocalPoolSpawner {
    spawner: LocalSpawner,
}

impl LocalPoolSpawner {
    /// Wraps the spawner of a local pool owned by the UI loop.
    pub fn new(spawner: LocalSpawner) -> Self {
        Self { spawner }
    }
}

impl TaskSpawner for LocalPoolSpawner {
    fn spawn_local(&self, task: LocalTask) {
        // Fails only once the pool is gone, and then nothing would poll the task anyway.
        let _ = self.spawner.spawn_local_obj(LocalFutureObj::new(task));
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use futures::executor::LocalPool;

    use super::*;

    #[test]
    fn spawned_task_runs_when_pool_is_driven() {
        let mut pool = LocalPool::new();
        let spawner = LocalPoolSpawner::new(pool.spawner());
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        spawner.spawn_local(Box::pin(async move { flag.set(true) }));

        assert!(!ran.get());
        pool.run_until_stalled();
        assert!(ran.get());
    }
}
