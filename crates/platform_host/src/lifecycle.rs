//! App lifecycle queries.

use std::{cell::Cell, rc::Rc};

/// Host service describing whether the app is currently in the foreground.
pub trait AppLifecycle {
    /// Returns `true` while the app is backgrounded. Permission prompts are not allowed then.
    fn is_backgrounded(&self) -> bool;
}

#[derive(Debug, Clone, Default)]
/// In-memory lifecycle state toggled by the composition layer or tests.
pub struct MemoryAppLifecycle {
    backgrounded: Rc<Cell<bool>>,
}

impl MemoryAppLifecycle {
    /// Marks the app as backgrounded or foregrounded.
    pub fn set_backgrounded(&self, backgrounded: bool) {
        self.backgrounded.set(backgrounded);
    }
}

impl AppLifecycle for MemoryAppLifecycle {
    fn is_backgrounded(&self) -> bool {
        self.backgrounded.get()
    }
}
