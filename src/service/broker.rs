use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ServiceSettings;
use crate::ledger::{Ledger, Result};

use super::handle::{LedgerCommand, LedgerHandle};

/// A ledger owned by one dedicated worker task
///
/// Architecture:
/// 1. Callers hold cloneable [`LedgerHandle`]s
/// 2. Each call becomes a `LedgerCommand` on one bounded mpsc queue
/// 3. The worker applies commands strictly in arrival order
/// 4. Acknowledgments travel back over oneshot channels
///
/// Because a boundary close is a single command, its snapshot can never
/// interleave with a concurrent `record`. Attribution itself is still
/// watermark-based: messages from two jobs running at once land on
/// whichever boundary closes next.
pub struct LedgerService {
    handle: LedgerHandle,
    worker: JoinHandle<Ledger>,
}

impl LedgerService {
    /// Move `ledger` onto a new worker task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(ledger: Ledger, settings: &ServiceSettings) -> Self {
        let capacity = settings.queue_capacity.max(1);
        let ack_timeout = settings.ack_timeout.as_duration();
        info!(capacity, ?ack_timeout, "Starting ledger service");

        let (sender, receiver) = mpsc::channel(capacity);
        let handle = LedgerHandle::new(sender, ack_timeout, ledger.metrics().clone());
        let worker = tokio::spawn(run_worker(ledger, receiver));

        Self { handle, worker }
    }

    pub fn handle(&self) -> LedgerHandle {
        self.handle.clone()
    }

    /// Stop the worker once queued commands are applied and hand back the ledger
    ///
    /// Calls made through other handles afterwards fail with
    /// `LedgerError::ServiceClosed`.
    pub async fn shutdown(self) -> Result<Ledger> {
        self.handle.shutdown().await?;
        let ledger = self.worker.await?;
        Ok(ledger)
    }
}

async fn run_worker(mut ledger: Ledger, mut receiver: mpsc::Receiver<LedgerCommand>) -> Ledger {
    debug!("Ledger worker started");

    while let Some(command) = receiver.recv().await {
        match command {
            LedgerCommand::Record {
                severity,
                text,
                ack,
            } => {
                ledger.record(severity, text);
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
            LedgerCommand::CloseJobBoundary { job, ack } => {
                ledger.close_job_boundary(job);
                let _ = ack.send(ledger.results_for(&job).clone());
            }
            LedgerCommand::PutResultData { entries, ack } => {
                ledger.put_result_data_all(entries);
                let _ = ack.send(());
            }
            LedgerCommand::SetMirrorToStdout { enabled, ack } => {
                ledger.set_mirror_to_stdout(enabled);
                let _ = ack.send(());
            }
            LedgerCommand::Inspect(query) => query(&ledger),
            LedgerCommand::Shutdown => break,
        }
    }

    info!(
        jobs = ledger.all_closed_jobs().len(),
        messages = ledger.all_messages().len(),
        "Ledger service stopped"
    );
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;
    use crate::ledger::{JobId, JobResultData, LedgerError, Severity};
    use std::collections::HashSet;

    fn settings() -> ServiceSettings {
        ServiceSettings::default()
    }

    #[tokio::test]
    async fn test_record_and_close_through_handle() {
        let service = LedgerService::spawn(Ledger::new(), &settings());
        let handle = service.handle();
        let job_a = JobId::new();
        let job_b = JobId::new();

        handle.error("E1").await.unwrap();
        handle.warn("W1").await.unwrap();
        let a = handle.close_job_boundary(job_a).await.unwrap();
        handle.info("I1").await.unwrap();
        let b = handle.close_job_boundary(job_b).await.unwrap();

        assert_eq!(a.errors(), ["E1"]);
        assert_eq!(a.warnings(), ["W1"]);
        assert_eq!(b.infos(), ["I1"]);
        assert!(b.errors().is_empty());
        assert!(handle.has_errors().await.unwrap());
        assert_eq!(handle.errors_for(job_a).await.unwrap(), vec!["E1"]);
        assert_eq!(handle.all_closed_jobs().await.unwrap(), vec![job_a, job_b]);

        let ledger = service.shutdown().await.unwrap();
        assert_eq!(ledger.all_messages().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_records_are_each_counted_once() {
        let service = LedgerService::spawn(Ledger::new(), &settings());
        let first = JobId::new();
        let second = JobId::new();

        let mut tasks = Vec::new();
        for i in 0..50 {
            let handle = service.handle();
            tasks.push(tokio::spawn(async move {
                handle.info(format!("msg-{i}")).await.unwrap();
            }));
        }

        let closer = service.handle();
        let close_first = tokio::spawn(async move { closer.close_job_boundary(first).await });

        for task in tasks {
            task.await.unwrap();
        }
        let first_results = close_first.await.unwrap().unwrap();
        let second_results = service.handle().close_job_boundary(second).await.unwrap();

        let mut seen = HashSet::new();
        for text in first_results.infos().iter().chain(second_results.infos()) {
            assert!(seen.insert(text.clone()), "double counted: {text}");
        }
        assert_eq!(seen.len(), 50);

        let ledger = service.shutdown().await.unwrap();
        let combined: Vec<&str> = ledger.all_messages().iter().map(|m| m.text()).collect();
        assert_eq!(combined.len(), 50);
    }

    #[tokio::test]
    async fn test_record_nowait_is_applied_in_order() {
        let service = LedgerService::spawn(Ledger::new(), &settings());
        let handle = service.handle();

        handle.record_nowait(Severity::Warning, "W1").unwrap();
        handle.record_nowait(Severity::Error, "E1").unwrap();

        // An acknowledged call is queued behind the fire-and-forget ones
        assert_eq!(handle.to_map().await.unwrap()["warnings.count"], "1");

        let ledger = service.shutdown().await.unwrap();
        assert_eq!(ledger.all_messages()[0].text(), "W1");
        assert_eq!(ledger.all_messages()[1].text(), "E1");
    }

    #[tokio::test]
    async fn test_result_data_and_snapshot() {
        let service = LedgerService::spawn(Ledger::new(), &settings());
        let handle = service.handle();

        handle
            .put_result_data(JobResultData::new("spider.urls", "URLs", 3))
            .await
            .unwrap();
        handle
            .put_result_data_all(vec![JobResultData::new("spider.urls", "URLs", 9)])
            .await
            .unwrap();

        let data = handle.get_result_data("spider.urls").await.unwrap().unwrap();
        assert_eq!(data.value, serde_json::json!(9));
        assert!(handle.get_result_data("none").await.unwrap().is_none());

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.result_data.len(), 1);

        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_fail() {
        let service = LedgerService::spawn(Ledger::new(), &settings());
        let handle = service.handle();

        service.shutdown().await.unwrap();

        assert!(matches!(
            handle.info("late").await,
            Err(LedgerError::ServiceClosed)
        ));
        assert!(matches!(
            handle.record_nowait(Severity::Info, "late"),
            Err(LedgerError::ServiceClosed)
        ));
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_unknown_job_through_handle_is_empty() {
        let service = LedgerService::spawn(Ledger::new(), &settings());
        let handle = service.handle();

        handle.error("E1").await.unwrap();
        let results = handle.results_for(JobId::new()).await.unwrap();
        assert!(results.is_empty());

        service.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_queue_rejects_nowait() {
        let settings = ServiceSettings {
            queue_capacity: 1,
            ack_timeout: HumanDuration::from_millis(5_000),
        };
        let service = LedgerService::spawn(Ledger::new(), &settings);
        let handle = service.handle();

        // Park the worker inside a query so the queue cannot drain
        let (entered_tx, entered_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let blocker = handle.clone();
        let blocked = tokio::spawn(async move {
            blocker
                .inspect(move |_| {
                    let _ = entered_tx.send(());
                    let _ = release_rx.recv();
                })
                .await
        });
        entered_rx.recv().unwrap();

        assert!(handle.record_nowait(Severity::Info, "queued").is_ok());
        assert!(matches!(
            handle.record_nowait(Severity::Info, "rejected"),
            Err(LedgerError::QueueFull)
        ));

        release_tx.send(()).unwrap();
        blocked.await.unwrap().unwrap();

        let ledger = service.shutdown().await.unwrap();
        assert_eq!(ledger.infos(), ["queued"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unacknowledged_record_is_applied_once() {
        let settings = ServiceSettings {
            queue_capacity: 16,
            ack_timeout: HumanDuration::from_millis(100),
        };
        let service = LedgerService::spawn(Ledger::new(), &settings);
        let handle = service.handle();

        let (entered_tx, entered_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let blocker = handle.clone();
        let blocked = tokio::spawn(async move {
            blocker
                .inspect(move |_| {
                    let _ = entered_tx.send(());
                    let _ = release_rx.recv();
                })
                .await
        });
        entered_rx.recv().unwrap();

        let err = handle.error("E1").await.unwrap_err();
        assert!(matches!(err, LedgerError::Unacknowledged(d) if d.as_millis() == 100));
        assert!(err.is_still_queued());

        release_tx.send(()).unwrap();
        let _ = blocked.await.unwrap();

        let ledger = service.shutdown().await.unwrap();
        assert_eq!(ledger.errors(), ["E1"]);
        assert_eq!(ledger.all_messages().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_record_times_out_when_queue_stays_full() {
        let settings = ServiceSettings {
            queue_capacity: 1,
            ack_timeout: HumanDuration::from_millis(100),
        };
        let service = LedgerService::spawn(Ledger::new(), &settings);
        let handle = service.handle();

        let (entered_tx, entered_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let blocker = handle.clone();
        let blocked = tokio::spawn(async move {
            blocker
                .inspect(move |_| {
                    let _ = entered_tx.send(());
                    let _ = release_rx.recv();
                })
                .await
        });
        entered_rx.recv().unwrap();

        handle.record_nowait(Severity::Info, "queued").unwrap();
        let err = handle.info("dropped").await.unwrap_err();
        assert!(matches!(err, LedgerError::Timeout(d) if d.as_millis() == 100));
        assert!(!err.is_still_queued());

        release_tx.send(()).unwrap();
        let _ = blocked.await.unwrap();

        let ledger = service.shutdown().await.unwrap();
        assert_eq!(ledger.infos(), ["queued"]);
    }
}
