//! Supervised runner for detached side effects.
//!
//! Request handlers hand confirmation emails and event publication to a
//! [`DispatcherHandle`] and return immediately. The [`BackgroundDispatcher`]
//! task runs each job, logs failures and panics, and keeps the most recent
//! failures in a bounded dead-letter sink. Jobs are never retried.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use intake_core::types::Timestamp;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Default number of failures retained in the dead-letter sink.
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 256;

/// Default time allowed for in-flight jobs to finish on shutdown.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

type Job = BoxFuture<'static, anyhow::Result<()>>;

/// A job that failed or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub label: String,
    pub error: String,
    pub failed_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Dead-letter sink
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct DeadLetterSink {
    capacity: usize,
    entries: Mutex<VecDeque<DeadLetter>>,
}

impl DeadLetterSink {
    fn push(&self, label: String, error: String) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(DeadLetter {
            label,
            error,
            failed_at: chrono::Utc::now(),
        });
    }

    fn snapshot(&self) -> Vec<DeadLetter> {
        match self.entries.lock() {
            Ok(guard) => guard.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// DispatcherHandle
// ---------------------------------------------------------------------------

/// Cloneable handle for submitting detached jobs.
#[derive(Clone)]
pub struct DispatcherHandle {
    sender: mpsc::UnboundedSender<(String, Job)>,
    dead_letters: Arc<DeadLetterSink>,
}

impl DispatcherHandle {
    /// Queue a job. Returns `false` if the dispatcher has stopped, in which
    /// case the job is dropped and logged.
    pub fn dispatch<F>(&self, label: impl Into<String>, job: F) -> bool
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let label = label.into();
        match self.sender.send((label, job.boxed())) {
            Ok(()) => true,
            Err(mpsc::error::SendError((label, _))) => {
                tracing::warn!(job = %label, "Dispatcher stopped, dropping job");
                false
            }
        }
    }

    /// Most recent failures, oldest first.
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.snapshot()
    }
}

// ---------------------------------------------------------------------------
// BackgroundDispatcher
// ---------------------------------------------------------------------------

/// Long-lived task that runs queued jobs concurrently.
pub struct BackgroundDispatcher {
    receiver: mpsc::UnboundedReceiver<(String, Job)>,
    dead_letters: Arc<DeadLetterSink>,
    drain_timeout: Duration,
}

impl BackgroundDispatcher {
    /// Create a dispatcher and the handle used to feed it.
    pub fn new(dead_letter_capacity: usize) -> (Self, DispatcherHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let dead_letters = Arc::new(DeadLetterSink {
            capacity: dead_letter_capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        });
        let handle = DispatcherHandle {
            sender,
            dead_letters: Arc::clone(&dead_letters),
        };
        let dispatcher = Self {
            receiver,
            dead_letters,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        };
        (dispatcher, handle)
    }

    /// Override how long shutdown waits for in-flight jobs.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Run until cancelled or until every handle is dropped, then drain.
    ///
    /// On shutdown, jobs already queued are still started, and all in-flight
    /// jobs get up to the drain timeout to finish before being aborted.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut tasks = JoinSet::new();
        tracing::info!("Background dispatcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Background dispatcher shutting down");
                    break;
                }
                next = self.receiver.recv() => match next {
                    Some((label, job)) => {
                        tasks.spawn(run_job(label, job, Arc::clone(&self.dead_letters)));
                    }
                    None => break,
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        self.receiver.close();
        while let Some((label, job)) = self.receiver.recv().await {
            tasks.spawn(run_job(label, job, Arc::clone(&self.dead_letters)));
        }

        let in_flight = tasks.len();
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => tracing::info!(in_flight, "Background dispatcher drained"),
            Err(_) => {
                tracing::warn!(
                    remaining = tasks.len(),
                    "Background dispatcher drain timed out, aborting remaining jobs"
                );
                tasks.abort_all();
            }
        }
    }
}

async fn run_job(label: String, job: Job, dead_letters: Arc<DeadLetterSink>) {
    match AssertUnwindSafe(job).catch_unwind().await {
        Ok(Ok(())) => tracing::debug!(job = %label, "Background job completed"),
        Ok(Err(e)) => {
            tracing::error!(job = %label, error = %e, "Background job failed");
            dead_letters.push(label, format!("{e:#}"));
        }
        Err(_) => {
            tracing::error!(job = %label, "Background job panicked");
            dead_letters.push(label, "panicked".to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
