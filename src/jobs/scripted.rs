use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::{JobId, JobResultData, Severity};
use crate::service::LedgerHandle;

use super::traits::{AutomationJob, JobError};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse plan: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A message a scripted job records when it runs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScriptedMessage {
    pub severity: Severity,
    pub text: String,
}

/// Declarative description of one scripted job
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptedJobDefinition {
    pub name: String,
    #[serde(default)]
    pub messages: Vec<ScriptedMessage>,
    #[serde(default)]
    pub result_data: Vec<JobResultData>,
    /// Make the job fail with this reason after recording its messages
    #[serde(default)]
    pub fail: Option<String>,
}

/// Ordered list of scripted jobs, replayed by the `replay` command
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScriptedPlan {
    #[serde(default)]
    pub jobs: Vec<ScriptedJobDefinition>,
}

impl ScriptedPlan {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(content)?)
    }

    /// Instantiate the jobs, each with a fresh id, in plan order
    pub fn into_jobs(self) -> Vec<Arc<dyn AutomationJob>> {
        self.jobs
            .into_iter()
            .map(|definition| Arc::new(ScriptedJob::new(definition)) as Arc<dyn AutomationJob>)
            .collect()
    }
}

/// Job that records a fixed script of messages and result data
#[derive(Debug, Clone)]
pub struct ScriptedJob {
    id: JobId,
    definition: ScriptedJobDefinition,
}

impl ScriptedJob {
    pub fn new(definition: ScriptedJobDefinition) -> Self {
        Self {
            id: JobId::new(),
            definition,
        }
    }

    pub fn definition(&self) -> &ScriptedJobDefinition {
        &self.definition
    }
}

#[async_trait]
impl AutomationJob for ScriptedJob {
    fn id(&self) -> JobId {
        self.id
    }

    fn name(&self) -> &str {
        &self.definition.name
    }

    async fn run(&self, ledger: &LedgerHandle) -> Result<(), JobError> {
        for message in &self.definition.messages {
            ledger.record(message.severity, message.text.clone()).await?;
        }

        if !self.definition.result_data.is_empty() {
            ledger
                .put_result_data_all(self.definition.result_data.clone())
                .await?;
        }

        match &self.definition.fail {
            Some(reason) => Err(JobError::Failed(reason.clone())),
            None => Ok(()),
        }
    }
}
