use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Keyed artifact contributed by a job for run-level summaries
///
/// Keys are global to the ledger; jobs are expected to prefix them with
/// their job type (e.g. `spider.urlsFound`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JobResultData {
    pub key: String,
    /// Human-readable label for reports
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl JobResultData {
    pub fn new(key: impl Into<String>, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Flat key -> entry store; later writes for a key replace earlier ones
#[derive(Debug, Clone, Default)]
pub struct ResultDataStore {
    entries: HashMap<String, JobResultData>,
}

impl ResultDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, data: JobResultData) {
        if let Some(previous) = self.entries.insert(data.key.clone(), data) {
            tracing::debug!(key = %previous.key, "Result data overwritten");
        }
    }

    pub fn put_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = JobResultData>,
    {
        for data in entries {
            self.put(data);
        }
    }

    pub fn get(&self, key: &str) -> Option<&JobResultData> {
        self.entries.get(key)
    }

    /// All current entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &JobResultData> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
