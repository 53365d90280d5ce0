use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LedgerSettings;
use crate::messaging::{EventPublisher, LedgerEvent, NoopPublisher};
use crate::mirror::{ConsoleMirror, MirrorSink};
use crate::observability::Metrics;

use super::message::{JobId, Message, Severity};
use super::partitions::Watermarks;
use super::result_data::{JobResultData, ResultDataStore};
use super::results::{summary_map, JobResults, EMPTY_RESULTS};

/// In-memory diagnostics ledger for one automation run
///
/// Messages land in one sequence per severity plus a combined sequence in
/// emission order. Closing a job boundary attributes everything recorded
/// since the previous close to that job.
///
/// Attribution assumes jobs run strictly one at a time: between two
/// consecutive boundary closes only the job about to be closed may record.
/// A job recording after its own close, or two jobs recording concurrently,
/// silently misattributes messages. The ledger does not detect this.
pub struct Ledger {
    errors: Vec<String>,
    warnings: Vec<String>,
    infos: Vec<String>,
    all_messages: Vec<Message>,
    run_jobs: Vec<JobId>,
    job_results: HashMap<JobId, JobResults>,
    result_data: ResultDataStore,
    marks: Watermarks,
    mirror_to_stdout: bool,
    mirror: Arc<dyn MirrorSink>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<Metrics>,
}

impl Ledger {
    /// Empty ledger with mirroring off and no subscribers
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            infos: Vec::new(),
            all_messages: Vec::new(),
            run_jobs: Vec::new(),
            job_results: HashMap::new(),
            result_data: ResultDataStore::new(),
            marks: Watermarks::default(),
            mirror_to_stdout: false,
            mirror: Arc::new(ConsoleMirror::new()),
            publisher: Arc::new(NoopPublisher::new()),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn from_settings(settings: &LedgerSettings) -> Self {
        let mut ledger = Self::new();
        ledger.mirror_to_stdout = settings.mirror_to_stdout;
        ledger
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Replace the console with another mirror target
    pub fn with_mirror(mut self, mirror: Arc<dyn MirrorSink>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn is_mirror_to_stdout(&self) -> bool {
        self.mirror_to_stdout
    }

    pub fn set_mirror_to_stdout(&mut self, mirror_to_stdout: bool) {
        self.mirror_to_stdout = mirror_to_stdout;
    }

    /// Append a message, mirror it if enabled, and publish it on its topic.
    ///
    /// Never fails: mirror and publisher errors are logged and counted.
    pub fn record(&mut self, severity: Severity, text: impl Into<String>) {
        let text = text.into();

        match severity {
            Severity::Error => self.errors.push(text.clone()),
            Severity::Warning => self.warnings.push(text.clone()),
            Severity::Info => self.infos.push(text.clone()),
        }
        self.all_messages.push(Message::new(severity, text.clone()));
        self.metrics.message_recorded();

        debug!(%severity, total = self.all_messages.len(), "Message recorded");

        if self.mirror_to_stdout {
            self.mirror_message(severity, &text);
        }

        let event = LedgerEvent::new(severity.topic(), text);
        if let Err(e) = self.publisher.publish(&event) {
            self.metrics.publish_failed();
            warn!(topic = %event.topic, error = %e, "Failed to publish ledger event");
        }
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.record(Severity::Error, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.record(Severity::Warning, text);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.record(Severity::Info, text);
    }

    fn mirror_message(&self, severity: Severity, text: &str) {
        let written = match severity {
            Severity::Error => self.mirror.write_error(text),
            Severity::Warning | Severity::Info => self.mirror.write_info(text),
        };

        if let Err(e) = written {
            self.metrics.mirror_failed();
            warn!(%severity, error = %e, "Failed to mirror ledger message");
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn infos(&self) -> &[String] {
        &self.infos
    }

    /// Every message in emission order across severities
    pub fn all_messages(&self) -> &[Message] {
        &self.all_messages
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        summary_map(self.errors.len(), self.warnings.len(), self.infos.len())
    }

    /// Attribute everything recorded since the previous close to `job`.
    ///
    /// Call once per job, right after it finishes. Closing the same job
    /// again replaces its stored results and lists it twice in the run.
    pub fn close_job_boundary(&mut self, job: JobId) {
        let results = self.marks.close(&self.errors, &self.warnings, &self.infos);

        debug!(
            job = %job,
            errors = results.errors().len(),
            warnings = results.warnings().len(),
            infos = results.infos().len(),
            "Job boundary closed"
        );

        if self.job_results.insert(job, results).is_some() {
            debug!(job = %job, "Job boundary closed more than once");
        }
        self.run_jobs.push(job);
        self.metrics.boundary_closed();
    }

    /// Stored results for `job`, or empty results if it was never closed
    pub fn results_for(&self, job: &JobId) -> &JobResults {
        self.job_results.get(job).unwrap_or(&EMPTY_RESULTS)
    }

    pub fn errors_for(&self, job: &JobId) -> &[String] {
        self.results_for(job).errors()
    }

    pub fn warnings_for(&self, job: &JobId) -> &[String] {
        self.results_for(job).warnings()
    }

    pub fn infos_for(&self, job: &JobId) -> &[String] {
        self.results_for(job).infos()
    }

    /// Closed jobs in closing order, duplicates included
    pub fn all_closed_jobs(&self) -> &[JobId] {
        &self.run_jobs
    }

    pub fn put_result_data(&mut self, data: JobResultData) {
        self.result_data.put(data);
    }

    /// Apply entries in order; a later entry replaces an earlier one with the same key
    pub fn put_result_data_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = JobResultData>,
    {
        self.result_data.put_all(entries);
    }

    pub fn get_result_data(&self, key: &str) -> Option<&JobResultData> {
        self.result_data.get(key)
    }

    /// Current result data, in no particular order
    pub fn all_result_data(&self) -> impl Iterator<Item = &JobResultData> {
        self.result_data.iter()
    }

    /// Owned, serializable view of the ledger for reports
    pub fn snapshot(&self) -> LedgerSnapshot {
        let jobs = self
            .run_jobs
            .iter()
            .map(|job| JobSummary {
                job: *job,
                counts: self.results_for(job).to_map(),
            })
            .collect();

        let mut result_data: Vec<JobResultData> = self.result_data.iter().cloned().collect();
        result_data.sort_by(|a, b| a.key.cmp(&b.key));

        LedgerSnapshot {
            counts: self.to_map(),
            jobs,
            result_data,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("errors", &self.errors.len())
            .field("warnings", &self.warnings.len())
            .field("infos", &self.infos.len())
            .field("run_jobs", &self.run_jobs.len())
            .field("result_data", &self.result_data.len())
            .field("marks", &self.marks)
            .field("mirror_to_stdout", &self.mirror_to_stdout)
            .finish()
    }
}

/// Per-job entry of a [`LedgerSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job: JobId,
    pub counts: BTreeMap<String, String>,
}

/// Point-in-time copy of the summary surface of a ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub counts: BTreeMap<String, String>,
    pub jobs: Vec<JobSummary>,
    /// Sorted by key
    pub result_data: Vec<JobResultData>,
}
