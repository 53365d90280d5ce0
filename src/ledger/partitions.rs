//! Watermark bookkeeping for per-job slicing of the severity sequences
//!
//! Each mark is the length of its sequence when the previous job boundary
//! was closed. A job's messages are the half-open range `[mark, len)` of
//! every sequence at the moment its own boundary closes.

use super::results::JobResults;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermarks {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl Watermarks {
    /// Cut the messages emitted since the last boundary and advance the marks
    pub fn close(&mut self, errors: &[String], warnings: &[String], infos: &[String]) -> JobResults {
        let results = JobResults::new(
            since(errors, self.errors),
            since(warnings, self.warnings),
            since(infos, self.infos),
        );

        self.errors = errors.len();
        self.warnings = warnings.len();
        self.infos = infos.len();

        results
    }
}

/// Owned copy of `sequence[mark..]`; a mark past the end yields nothing
fn since(sequence: &[String], mark: usize) -> Vec<String> {
    sequence.get(mark..).map(<[String]>::to_vec).unwrap_or_default()
}
