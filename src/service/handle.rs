use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::ledger::{
    JobId, JobResultData, JobResults, Ledger, LedgerError, LedgerSnapshot, Result, Severity,
};
use crate::observability::Metrics;

type Inspect = Box<dyn FnOnce(&Ledger) + Send>;

/// Commands processed one at a time by the ledger worker
pub(crate) enum LedgerCommand {
    Record {
        severity: Severity,
        text: String,
        ack: Option<oneshot::Sender<()>>,
    },
    CloseJobBoundary {
        job: JobId,
        ack: oneshot::Sender<JobResults>,
    },
    PutResultData {
        entries: Vec<JobResultData>,
        ack: oneshot::Sender<()>,
    },
    SetMirrorToStdout {
        enabled: bool,
        ack: oneshot::Sender<()>,
    },
    Inspect(Inspect),
    Shutdown,
}

/// Cloneable client of a running ledger service
///
/// Every call submits a command to the worker's queue; acknowledged calls
/// wait at most `ack_timeout` for room in the queue and again at most
/// `ack_timeout` for the worker's reply.
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerCommand>,
    ack_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl LedgerHandle {
    pub(crate) fn new(
        sender: mpsc::Sender<LedgerCommand>,
        ack_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            sender,
            ack_timeout,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Record a message and wait until the worker has applied it
    pub async fn record(&self, severity: Severity, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.call(|ack| LedgerCommand::Record {
            severity,
            text,
            ack: Some(ack),
        })
        .await
    }

    /// Queue a message without waiting for the worker
    ///
    /// Fails fast with [`LedgerError::QueueFull`] instead of waiting for room.
    pub fn record_nowait(&self, severity: Severity, text: impl Into<String>) -> Result<()> {
        let command = LedgerCommand::Record {
            severity,
            text: text.into(),
            ack: None,
        };

        self.sender.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => LedgerError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => LedgerError::ServiceClosed,
        })
    }

    pub async fn error(&self, text: impl Into<String>) -> Result<()> {
        self.record(Severity::Error, text).await
    }

    pub async fn warn(&self, text: impl Into<String>) -> Result<()> {
        self.record(Severity::Warning, text).await
    }

    pub async fn info(&self, text: impl Into<String>) -> Result<()> {
        self.record(Severity::Info, text).await
    }

    /// Close `job`'s boundary and return the results attributed to it
    pub async fn close_job_boundary(&self, job: JobId) -> Result<JobResults> {
        self.call(|ack| LedgerCommand::CloseJobBoundary { job, ack })
            .await
    }

    pub async fn put_result_data(&self, data: JobResultData) -> Result<()> {
        self.put_result_data_all(vec![data]).await
    }

    pub async fn put_result_data_all(&self, entries: Vec<JobResultData>) -> Result<()> {
        self.call(|ack| LedgerCommand::PutResultData { entries, ack })
            .await
    }

    pub async fn set_mirror_to_stdout(&self, enabled: bool) -> Result<()> {
        self.call(|ack| LedgerCommand::SetMirrorToStdout { enabled, ack })
            .await
    }

    /// Run a read-only query against the ledger on the worker
    pub async fn inspect<F, T>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&Ledger) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.call(|reply| {
            LedgerCommand::Inspect(Box::new(move |ledger| {
                // Receiver gone means the caller timed out
                let _ = reply.send(query(ledger));
            }))
        })
        .await
    }

    pub async fn results_for(&self, job: JobId) -> Result<JobResults> {
        self.inspect(move |ledger| ledger.results_for(&job).clone())
            .await
    }

    pub async fn errors_for(&self, job: JobId) -> Result<Vec<String>> {
        self.inspect(move |ledger| ledger.errors_for(&job).to_vec())
            .await
    }

    pub async fn warnings_for(&self, job: JobId) -> Result<Vec<String>> {
        self.inspect(move |ledger| ledger.warnings_for(&job).to_vec())
            .await
    }

    pub async fn infos_for(&self, job: JobId) -> Result<Vec<String>> {
        self.inspect(move |ledger| ledger.infos_for(&job).to_vec())
            .await
    }

    pub async fn all_closed_jobs(&self) -> Result<Vec<JobId>> {
        self.inspect(|ledger| ledger.all_closed_jobs().to_vec())
            .await
    }

    pub async fn get_result_data(&self, key: impl Into<String>) -> Result<Option<JobResultData>> {
        let key = key.into();
        self.inspect(move |ledger| ledger.get_result_data(&key).cloned())
            .await
    }

    pub async fn has_errors(&self) -> Result<bool> {
        self.inspect(Ledger::has_errors).await
    }

    pub async fn has_warnings(&self) -> Result<bool> {
        self.inspect(Ledger::has_warnings).await
    }

    pub async fn to_map(&self) -> Result<BTreeMap<String, String>> {
        self.inspect(Ledger::to_map).await
    }

    pub async fn snapshot(&self) -> Result<LedgerSnapshot> {
        self.inspect(Ledger::snapshot).await
    }

    /// Ask the worker to stop after the commands already queued
    pub async fn shutdown(&self) -> Result<()> {
        timeout(self.ack_timeout, self.sender.send(LedgerCommand::Shutdown))
            .await
            .map_err(|_| LedgerError::Timeout(self.ack_timeout))?
            .map_err(|_| LedgerError::ServiceClosed)
    }

    /// Submit a command and wait for its acknowledgment
    ///
    /// Queueing and acknowledgment are each bounded by `ack_timeout`. Only a
    /// command that never reached the queue fails with
    /// [`LedgerError::Timeout`]; one that was queued but not confirmed fails
    /// with [`LedgerError::Unacknowledged`] and is still applied.
    async fn call<T, F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(oneshot::Sender<T>) -> LedgerCommand,
    {
        let (tx, rx) = oneshot::channel();

        timeout(self.ack_timeout, self.sender.send(build(tx)))
            .await
            .map_err(|_| LedgerError::Timeout(self.ack_timeout))?
            .map_err(|_| LedgerError::ServiceClosed)?;

        // A dropped ack means the worker stopped before reaching the command
        timeout(self.ack_timeout, rx)
            .await
            .map_err(|_| LedgerError::Unacknowledged(self.ack_timeout))?
            .map_err(|_| LedgerError::ServiceClosed)
    }
}
