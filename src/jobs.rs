//! Fork/join job runner.
//!
//! A [`JobScope`] queues jobs on the shared `rayon` pool. Jobs may borrow from
//! the caller's stack and each one hands back a [`JobHandle`]. Every job queued
//! inside [`scope`] has finished by the time `scope` returns, whether or not it
//! was waited on.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::params::Parallelism;

const RUNNING: u8 = 0;
const FINISHED: u8 = 1;
const PANICKED: u8 = 2;

/// Queue of jobs bound to one fork/join region
pub struct JobScope<'a, 'scope> {
    /// `None` runs every job inline on the queueing thread
    scope: Option<&'a rayon::Scope<'scope>>,
}

/// Completion handle of one queued job
#[must_use = "a queued job should be waited on before its results are read"]
pub enum JobHandle {
    /// Handed to the pool
    Queued(Arc<AtomicU8>),
    /// Already ran on the queueing thread
    Completed,
}

/// Publishes the job's outcome when it returns or unwinds
struct Completion(Arc<AtomicU8>);

impl Drop for Completion {
    fn drop(&mut self) {
        let state = if std::thread::panicking() {
            PANICKED
        } else {
            FINISHED
        };
        self.0.store(state, Ordering::Release);
    }
}

impl<'a, 'scope> JobScope<'a, 'scope> {
    /// Queue `job`; with [`Parallelism::Serial`] it runs before this returns
    pub fn queue<F>(&self, job: F) -> JobHandle
    where
        F: FnOnce() + Send + 'scope,
    {
        match self.scope {
            Some(scope) => {
                let state = Arc::new(AtomicU8::new(RUNNING));
                let completion = Completion(Arc::clone(&state));
                scope.spawn(move |_| {
                    let _completion = completion;
                    job();
                });
                JobHandle::Queued(state)
            }
            None => {
                job();
                JobHandle::Completed
            }
        }
    }

    /// Block until the job behind `handle` has returned
    ///
    /// The waiting thread helps the pool with other queued work meanwhile. A
    /// panicking job panics the waiting thread.
    pub fn wait(&self, handle: JobHandle) {
        let JobHandle::Queued(state) = handle else {
            return;
        };
        loop {
            match state.load(Ordering::Acquire) {
                FINISHED => return,
                PANICKED => panic!("queued job panicked"),
                _ => {
                    if !matches!(rayon::yield_now(), Some(rayon::Yield::Executed)) {
                        std::thread::yield_now();
                    }
                }
            }
        }
    }
}

/// Open a fork/join region
pub fn scope<'scope, F, T>(parallelism: Parallelism, f: F) -> T
where
    F: for<'a> FnOnce(&JobScope<'a, 'scope>) -> T + Send,
    T: Send,
{
    match parallelism {
        Parallelism::Threads => rayon::scope(|scope| f(&JobScope { scope: Some(scope) })),
        Parallelism::Serial => f(&JobScope { scope: None }),
    }
}

/// Worker count of the pool [`Parallelism::Threads`] jobs run on
pub fn worker_count() -> usize {
    rayon::current_num_threads().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fill_chunks(parallelism: Parallelism) -> Vec<usize> {
        let mut data = vec![0usize; 20];
        scope(parallelism, |jobs| {
            let handles: Vec<_> = data
                .chunks_mut(4)
                .enumerate()
                .map(|(chunk_index, chunk)| {
                    jobs.queue(move || {
                        for (i, value) in chunk.iter_mut().enumerate() {
                            *value = chunk_index * 100 + i;
                        }
                    })
                })
                .collect();
            for handle in handles {
                jobs.wait(handle);
            }
        });
        data
    }

    #[test]
    fn test_threaded_and_serial_agree() {
        let threaded = fill_chunks(Parallelism::Threads);
        let serial = fill_chunks(Parallelism::Serial);
        assert_eq!(threaded, serial);
        assert_eq!(threaded[5], 101);
        assert_eq!(threaded[19], 403);
    }

    #[test]
    fn test_all_jobs_complete_before_scope_returns() {
        let counter = AtomicUsize::new(0);
        scope(Parallelism::Threads, |jobs| {
            for _ in 0..5 {
                // Handles dropped without waiting still finish inside the scope
                let _ = jobs.queue(|| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_wait_observes_job_writes() {
        let counter = AtomicUsize::new(0);
        scope(Parallelism::Threads, |jobs| {
            let handle = jobs.queue(|| {
                counter.fetch_add(7, Ordering::Relaxed);
            });
            jobs.wait(handle);
            assert_eq!(counter.load(Ordering::Relaxed), 7);
        });
    }

    #[test]
    fn test_serial_jobs_run_immediately() {
        let counter = AtomicUsize::new(0);
        scope(Parallelism::Serial, |jobs| {
            let handle = jobs.queue(|| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            assert!(matches!(handle, JobHandle::Completed));
            assert_eq!(counter.load(Ordering::SeqCst), 1);
            jobs.wait(handle);
        });
    }

    #[test]
    #[should_panic]
    fn test_panicking_job_reaches_the_caller() {
        scope(Parallelism::Threads, |jobs| {
            let handle = jobs.queue(|| panic!("job failed"));
            jobs.wait(handle);
        });
    }

    #[test]
    fn test_worker_count_is_positive() {
        assert!(worker_count() >= 1);
    }
}
