use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

type Continuation = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct State {
    done: bool,
    continuations: Vec<Continuation>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    done_cv: Condvar,
}

/// Completion token of a scheduled job.
///
/// Cheap to clone. Pass it as the dependency of later jobs, or block on it
/// with [`complete`](Self::complete).
#[derive(Clone)]
pub struct JobHandle {
    shared: Option<Arc<Shared>>,
}

impl JobHandle {
    /// A handle that is already complete (no dependency).
    #[inline]
    pub const fn completed() -> Self {
        Self { shared: None }
    }

    /// Creates an incomplete handle and the guard that completes it when dropped.
    pub(crate) fn pending() -> (JobHandle, Completer) {
        let shared = Arc::new(Shared::default());
        (
            JobHandle { shared: Some(Arc::clone(&shared)) },
            Completer { shared },
        )
    }

    pub fn is_completed(&self) -> bool {
        self.shared.as_ref().is_none_or(|s| s.state.lock().done)
    }

    /// Blocks the calling thread until the job has finished.
    ///
    /// Call this from the frame thread, not from inside another job: a worker
    /// blocked here is a worker the pool cannot use to finish the job.
    pub fn complete(&self) {
        let Some(shared) = &self.shared else { return };
        let mut state = shared.state.lock();
        while !state.done {
            shared.done_cv.wait(&mut state);
        }
    }

    /// A handle that completes once every handle in `handles` has completed.
    pub fn combine(handles: &[JobHandle]) -> JobHandle {
        let pending: Vec<&JobHandle> = handles.iter().filter(|h| !h.is_completed()).collect();
        if pending.is_empty() {
            return JobHandle::completed();
        }

        let (combined, completer) = JobHandle::pending();
        let remaining = Arc::new(AtomicUsize::new(pending.len()));
        let completer = Arc::new(Mutex::new(Some(completer)));

        for dep in pending {
            let remaining = Arc::clone(&remaining);
            let completer = Arc::clone(&completer);
            dep.then(Box::new(move || {
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    drop(completer.lock().take());
                }
            }));
        }

        combined
    }

    /// Runs `task` on the worker pool once this handle has completed.
    ///
    /// Never blocks: if the job is still running, `task` is queued and the
    /// completing thread spawns it.
    pub(crate) fn then(&self, task: Continuation) {
        if let Some(shared) = &self.shared {
            let mut state = shared.state.lock();
            if !state.done {
                state.continuations.push(task);
                return;
            }
        }
        rayon::spawn(task);
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::completed()
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Marks its handle complete on drop, including during unwinding.
pub(crate) struct Completer {
    shared: Arc<Shared>,
}

impl Drop for Completer {
    fn drop(&mut self) {
        let continuations = {
            let mut state = self.shared.state.lock();
            state.done = true;
            std::mem::take(&mut state.continuations)
        };
        self.shared.done_cv.notify_all();

        for task in continuations {
            rayon::spawn(task);
        }
    }
}
