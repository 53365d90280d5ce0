//! Diagnostics ledger for a multi-step automation run
//!
//! Collects error, warning and info messages emitted while jobs execute and
//! attributes each message to the job that produced it. Jobs share one
//! message stream; attribution happens when the orchestration loop closes
//! a job's boundary, by slicing each severity sequence from the previous
//! boundary's watermark.
//!
//! ## Usage
//!
//! ```rust
//! use runledger::ledger::{JobId, Ledger};
//!
//! let mut ledger = Ledger::new();
//! let spider = JobId::new();
//!
//! ledger.error("E1");
//! ledger.warn("W1");
//! ledger.close_job_boundary(spider);
//!
//! assert_eq!(ledger.errors_for(&spider), ["E1"]);
//! assert!(ledger.has_errors());
//! ```
//!
//! For hosts that record from several tasks, see [`crate::service`].

pub mod error;
pub mod message;
pub mod partitions;
pub mod result_data;
pub mod results;
pub mod store;

pub use error::{LedgerError, Result};
pub use message::{JobId, Message, Severity};
pub use result_data::{JobResultData, ResultDataStore};
pub use results::{
    summary_map, JobResults, ERRORS_COUNT_KEY, INFOS_COUNT_KEY, WARNINGS_COUNT_KEY,
};
pub use store::{JobSummary, Ledger, LedgerSnapshot};
