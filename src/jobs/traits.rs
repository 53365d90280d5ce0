use async_trait::async_trait;
use thiserror::Error;

use crate::ledger::{JobId, LedgerError};
use crate::service::LedgerHandle;

/// Job errors
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job failed: {0}")]
    Failed(String),
    #[error("ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),
}

/// One discrete step of an automation run
///
/// Jobs report diagnostics only through the ledger handle they are given.
/// They must stop recording once `run` returns: the runner closes the job's
/// boundary right after, and anything recorded later is attributed to the
/// next job.
#[async_trait]
pub trait AutomationJob: Send + Sync {
    /// Identity assigned when the job was created
    fn id(&self) -> JobId;

    fn name(&self) -> &str;

    async fn run(&self, ledger: &LedgerHandle) -> Result<(), JobError>;
}
