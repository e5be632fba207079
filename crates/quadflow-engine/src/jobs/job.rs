use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::{self, Receiver};

use super::handle::JobHandle;

/// Failure to obtain a job's result.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job body panicked; the message is the panic payload if it was a string.
    #[error("job panicked: {0}")]
    Panicked(String),
}

/// Schedules `f` on the worker pool after `dependency` completes.
///
/// Returns immediately. A panic inside `f` is caught and logged; the returned
/// handle completes either way.
pub fn schedule<F>(dependency: &JobHandle, f: F) -> JobHandle
where
    F: FnOnce() + Send + 'static,
{
    let (handle, completer) = JobHandle::pending();

    dependency.then(Box::new(move || {
        let _completer = completer;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            log::error!("job panicked: {}", panic_message(payload.as_ref()));
        }
    }));

    handle
}

/// A scheduled job that produces a value.
pub struct Job<R> {
    handle: JobHandle,
    output: Receiver<Result<R, JobError>>,
}

/// Schedules `f` after `dependency` and keeps its result for [`Job::complete`].
pub fn schedule_with_output<R, F>(dependency: &JobHandle, f: F) -> Job<R>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    let (tx, rx) = channel::bounded(1);

    let handle = schedule(dependency, move || {
        let result = panic::catch_unwind(AssertUnwindSafe(f))
            .map_err(|payload| JobError::Panicked(panic_message(payload.as_ref())));
        // The receiver only goes away when the job is abandoned; nothing to report then.
        let _ = tx.send(result);
    });

    Job { handle, output: rx }
}

impl<R> Job<R> {
    /// Completion token, usable as the dependency of later jobs.
    #[inline]
    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.handle.is_completed()
    }

    /// Blocks until the job has run and returns its result.
    pub fn complete(self) -> Result<R, JobError> {
        self.handle.complete();
        self.output
            .try_recv()
            .unwrap_or_else(|_| Err(JobError::Panicked("job finished without a result".into())))
    }
}

impl<R> std::fmt::Debug for Job<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("handle", &self.handle).finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn output_is_returned() {
        let job = schedule_with_output(&JobHandle::completed(), || 6 * 7);
        assert_eq!(job.complete(), Ok(42));
    }

    #[test]
    fn dependency_runs_first() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let first_log = Arc::clone(&log);
        let first = schedule(&JobHandle::completed(), move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            first_log.lock().push("first");
        });

        let second_log = Arc::clone(&log);
        let second = schedule_with_output(&first, move || {
            second_log.lock().push("second");
            second_log.lock().len()
        });

        assert_eq!(second.complete(), Ok(2));
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn panic_is_reported_and_handle_completes() {
        let job = schedule_with_output(&JobHandle::completed(), || -> u32 { panic!("boom") });
        let handle = job.handle().clone();

        assert_eq!(job.complete(), Err(JobError::Panicked("boom".into())));
        assert!(handle.is_completed());
    }

    #[test]
    fn dependents_of_a_panicked_job_still_run() {
        let failing = schedule(&JobHandle::completed(), || panic!("upstream"));
        let job = schedule_with_output(&failing, || "ran");
        assert_eq!(job.complete(), Ok("ran"));
    }
}
