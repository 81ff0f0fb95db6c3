// Tracking for spawned service calls.

use std::future::Future;

use tokio::task::JoinHandle;

/// One slot per kind of request: at most one task runs in it, and starting a
/// new one aborts the previous.
///
/// Each task is stamped with a generation. Results carrying any other
/// generation come from a superseded task and must be discarded.
#[derive(Debug, Default)]
pub struct TaskSlot {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TaskSlot {
    /// Abort the running task, if any, and spawn the future built by `make`
    /// for the next generation. Returns that generation.
    pub fn spawn<F, Fut>(&mut self, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        self.handle = Some(tokio::spawn(make(generation)));
        generation
    }

    /// An idle slot whose next task gets `generation + 1`.
    pub fn starting_after(generation: u64) -> Self {
        TaskSlot {
            handle: None,
            generation,
        }
    }

    /// Abort the running task. Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Accept a result from `generation`. Returns false for stale results.
    pub fn finish(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.handle = None;
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}
