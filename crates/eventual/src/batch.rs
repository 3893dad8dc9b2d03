//! Bounded fan-out of independent jobs.
//!
//! Used to submit many mutations against the system under test before
//! waiting on an aggregate view of their effect. Jobs share no mutable
//! state; at most `workers` are in flight at once.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;

/// A job result with its position in the input and its duration
#[derive(Debug, Clone)]
pub struct Timed<T> {
    /// Position of the job's input item
    pub index: usize,
    /// What the job produced
    pub result: T,
    /// Wall time spent awaiting the job
    pub elapsed: Duration,
}

/// Results of one batch, in completion order
#[derive(Debug, Clone)]
pub struct BatchReport<T, E> {
    /// Per-job results in the order they completed
    pub results: Vec<Timed<Result<T, E>>>,
    /// Concurrency limit the batch ran with
    pub workers: usize,
    /// Wall time for the whole batch
    pub elapsed: Duration,
}

impl<T, E> BatchReport<T, E> {
    /// Number of jobs that succeeded
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_ok()).count()
    }

    /// Number of jobs that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Check if every job succeeded
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Values in input order, or the first failure in input order
    ///
    /// # Errors
    ///
    /// Returns the error of the lowest-indexed failed job.
    pub fn into_values(mut self) -> Result<Vec<T>, E> {
        self.results.sort_by_key(|r| r.index);
        self.results.into_iter().map(|r| r.result).collect()
    }
}

/// Run `job` over `items` with at most `workers` jobs in flight.
///
/// A `workers` of zero is treated as one. Failures do not cancel the
/// remaining jobs.
pub async fn run_batch<I, F, Fut, T, E>(items: I, workers: usize, mut job: F) -> BatchReport<T, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let workers = workers.max(1);
    let start = Instant::now();

    let jobs = items.into_iter().enumerate().map(|(index, item)| {
        let fut = job(item);
        async move {
            let started = Instant::now();
            let result = fut.await;
            Timed {
                index,
                result,
                elapsed: started.elapsed(),
            }
        }
    });
    let results: Vec<_> = stream::iter(jobs).buffer_unordered(workers).collect().await;

    let report = BatchReport {
        results,
        workers,
        elapsed: start.elapsed(),
    };
    tracing::info!(
        jobs = report.results.len(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        workers,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "batch finished"
    );
    report
}
