use std::sync::Arc;

use tracing::{info, warn};

use crate::ledger::{JobId, JobResults, Result};
use crate::service::LedgerHandle;

use super::traits::{AutomationJob, JobError};

/// Results of one job as attributed at its boundary close
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: JobId,
    pub name: String,
    pub results: JobResults,
}

/// Runs jobs strictly one at a time, closing each boundary as it finishes
///
/// This is the turn-taking the ledger's watermark attribution relies on.
#[derive(Clone)]
pub struct SequentialRunner {
    ledger: LedgerHandle,
}

impl SequentialRunner {
    pub fn new(ledger: LedgerHandle) -> Self {
        Self { ledger }
    }

    /// Run one job and close its boundary.
    ///
    /// A job failure is recorded as an error attributed to that job; only a
    /// ledger failure aborts. A command the ledger queued but did not
    /// acknowledge in time is not resubmitted, since the worker still
    /// applies it.
    pub async fn run_job(&self, job: &dyn AutomationJob) -> Result<JobOutcome> {
        let id = job.id();
        info!(job = %id, name = job.name(), "Running job");

        match job.run(&self.ledger).await {
            Ok(()) => {}
            Err(JobError::Ledger(e)) => return Err(e),
            Err(e) => {
                warn!(job = %id, name = job.name(), error = %e, "Job failed");
                match self
                    .ledger
                    .error(format!("Job {} failed: {}", job.name(), e))
                    .await
                {
                    Ok(()) => {}
                    // Still lands before the boundary close queued below
                    Err(e) if e.is_still_queued() => {
                        warn!(job = %id, error = %e, "Failure record not acknowledged")
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let results = match self.ledger.close_job_boundary(id).await {
            Ok(results) => results,
            Err(e) if e.is_still_queued() => {
                // The close is applied anyway; this query is queued behind it
                warn!(job = %id, error = %e, "Boundary close not acknowledged, reading results back");
                self.ledger.results_for(id).await?
            }
            Err(e) => return Err(e),
        };
        info!(
            job = %id,
            errors = results.errors().len(),
            warnings = results.warnings().len(),
            "Job finished"
        );

        Ok(JobOutcome {
            job: id,
            name: job.name().to_string(),
            results,
        })
    }

    pub async fn run_all(&self, jobs: &[Arc<dyn AutomationJob>]) -> Result<Vec<JobOutcome>> {
        let mut outcomes = Vec::with_capacity(jobs.len());
        for job in jobs {
            outcomes.push(self.run_job(job.as_ref()).await?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceSettings;
    use crate::humanize::HumanDuration;
    use crate::ledger::{Ledger, LedgerError};
    use crate::service::LedgerService;
    use async_trait::async_trait;

    struct NoisyJob {
        id: JobId,
        fail: bool,
    }

    #[async_trait]
    impl AutomationJob for NoisyJob {
        fn id(&self) -> JobId {
            self.id
        }

        fn name(&self) -> &str {
            "noisy"
        }

        async fn run(&self, ledger: &LedgerHandle) -> std::result::Result<(), JobError> {
            ledger.info("noisy started").await?;
            if self.fail {
                return Err(JobError::Failed("target unreachable".to_string()));
            }
            ledger.warn("noisy finished with warnings").await?;
            Ok(())
        }
    }

    /// Leaves the worker busy past the ack timeout once it returns
    struct StallingJob {
        id: JobId,
        stall: std::time::Duration,
    }

    #[async_trait]
    impl AutomationJob for StallingJob {
        fn id(&self) -> JobId {
            self.id
        }

        fn name(&self) -> &str {
            "stalling"
        }

        async fn run(&self, ledger: &LedgerHandle) -> std::result::Result<(), JobError> {
            ledger.info("stalling started").await?;

            let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
            let stall = self.stall;
            let blocker = ledger.clone();
            tokio::spawn(async move {
                let _ = blocker
                    .inspect(move |_| {
                        let _ = entered_tx.send(());
                        std::thread::sleep(stall);
                    })
                    .await;
            });
            let _ = entered_rx.await;
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unacknowledged_close_still_yields_results() {
        let settings = ServiceSettings {
            queue_capacity: 16,
            ack_timeout: HumanDuration::from_millis(250),
        };
        let service = LedgerService::spawn(Ledger::new(), &settings);
        let runner = SequentialRunner::new(service.handle());
        let job = StallingJob {
            id: JobId::new(),
            stall: std::time::Duration::from_millis(400),
        };

        let outcome = runner.run_job(&job).await.unwrap();
        assert_eq!(outcome.results.infos(), ["stalling started"]);

        let ledger = service.shutdown().await.unwrap();
        assert_eq!(ledger.all_closed_jobs(), [job.id]);
        assert_eq!(ledger.infos(), ["stalling started"]);
    }

    #[tokio::test]
    async fn test_run_all_attributes_per_job() {
        let service = LedgerService::spawn(Ledger::new(), &ServiceSettings::default());
        let runner = SequentialRunner::new(service.handle());

        let first: Arc<dyn AutomationJob> = Arc::new(NoisyJob {
            id: JobId::new(),
            fail: false,
        });
        let second: Arc<dyn AutomationJob> = Arc::new(NoisyJob {
            id: JobId::new(),
            fail: true,
        });

        let outcomes = runner.run_all(&[first.clone(), second.clone()]).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].job, first.id());
        assert_eq!(outcomes[0].results.warnings(), ["noisy finished with warnings"]);
        assert!(outcomes[0].results.errors().is_empty());

        assert_eq!(outcomes[1].results.infos(), ["noisy started"]);
        assert_eq!(
            outcomes[1].results.errors(),
            ["Job noisy failed: job failed: target unreachable"]
        );

        let ledger = service.shutdown().await.unwrap();
        assert_eq!(ledger.all_closed_jobs(), [first.id(), second.id()]);
        assert!(ledger.has_errors());
    }

    #[tokio::test]
    async fn test_closed_ledger_aborts_run() {
        let service = LedgerService::spawn(Ledger::new(), &ServiceSettings::default());
        let runner = SequentialRunner::new(service.handle());
        service.shutdown().await.unwrap();

        let job = NoisyJob {
            id: JobId::new(),
            fail: false,
        };
        assert!(matches!(
            runner.run_job(&job).await,
            Err(LedgerError::ServiceClosed)
        ));
    }
}
