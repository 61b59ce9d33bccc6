//! Owns the background task handles so shutdown can stop them in one place.

use std::collections::HashMap;

use tokio::task::JoinHandle;
use tracing::info;

/// The periodic cycles the bot runs in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleKind {
    ChangeDetection,
    Autokick,
}

/// Registry of the running background loops.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: HashMap<CycleKind, JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a running loop. A previously registered loop of the same kind
    /// is aborted first.
    pub fn register(&mut self, kind: CycleKind, handle: JoinHandle<()>) {
        if let Some(old) = self.tasks.insert(kind, handle) {
            old.abort();
        }
    }

    /// Abort every registered loop and wait for the tasks to wind down.
    pub async fn shutdown(mut self) {
        for (kind, handle) in self.tasks.drain() {
            handle.abort();
            let _ = handle.await;
            info!("⏹️ stopped {kind:?} loop");
        }
    }
}
