//! Serialized access to a ledger shared by concurrent callers
//!
//! [`LedgerService`] moves a [`crate::ledger::Ledger`] onto a dedicated
//! tokio task and processes every mutation and query through one bounded
//! queue, so the combined message order equals arrival order and boundary
//! snapshots are atomic with respect to concurrent recording.
//!
//! ```rust,ignore
//! let service = LedgerService::spawn(Ledger::new(), &config.service);
//! let handle = service.handle();
//!
//! handle.warn("Spider found no URLs").await?;
//! let results = handle.close_job_boundary(job_id).await?;
//!
//! let ledger = service.shutdown().await?;
//! ```

mod broker;
mod handle;

pub use broker::LedgerService;
pub use handle::LedgerHandle;
