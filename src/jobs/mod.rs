//! Job seam for the ledger
//!
//! Real automation jobs live outside this crate. This module defines how
//! they talk to the ledger and how a run drives them.
//!
//! ## Key Components
//!
//! - [`AutomationJob`] - Trait implemented by each unit of work
//! - [`SequentialRunner`] - Runs jobs one at a time and closes their boundaries
//! - [`ScriptedPlan`] / [`ScriptedJob`] - Declarative jobs replayed from TOML

mod runner;
mod scripted;
mod traits;

pub use runner::{JobOutcome, SequentialRunner};
pub use scripted::{PlanError, ScriptedJob, ScriptedJobDefinition, ScriptedMessage, ScriptedPlan};
pub use traits::{AutomationJob, JobError};
