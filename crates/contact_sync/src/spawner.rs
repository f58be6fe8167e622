//! Leptos-backed UI task spawner.

use leptos::spawn_local;
use platform_host::{LocalTask, TaskSpawner};

#[derive(Debug, Clone, Copy, Default)]
/// Spawns fetcher tasks with [`leptos::spawn_local`].
///
/// Build with the `csr` feature on wasm32 so tasks run on the browser event loop. Without it,
/// leptos drives each task to completion inline, which never returns for the change listener.
pub struct LeptosTaskSpawner;

impl TaskSpawner for LeptosTaskSpawner {
    fn spawn_local(&self, task: LocalTask) {
        spawn_local(task);
    }
}
