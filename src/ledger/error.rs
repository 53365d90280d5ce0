use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger service closed")]
    ServiceClosed,

    #[error("Ledger service queue is full")]
    QueueFull,

    /// The command could not be queued in time and was not applied
    #[error("Ledger service did not accept the command within {0:?}")]
    Timeout(std::time::Duration),

    /// The command was queued but not confirmed in time
    ///
    /// The worker still applies it, in order, once it catches up. Retrying
    /// would apply it twice.
    #[error("Ledger service did not acknowledge within {0:?}; the command is still queued")]
    Unacknowledged(std::time::Duration),

    #[error("Ledger worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl LedgerError {
    /// Whether the worker will still apply the command that failed
    pub fn is_still_queued(&self) -> bool {
        matches!(self, LedgerError::Unacknowledged(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
