use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ERRORS_COUNT_KEY: &str = "errors.count";
pub const WARNINGS_COUNT_KEY: &str = "warnings.count";
pub const INFOS_COUNT_KEY: &str = "infos.count";

/// Summary map with exactly the three count keys, values string-encoded
pub fn summary_map(errors: usize, warnings: usize, infos: usize) -> BTreeMap<String, String> {
    BTreeMap::from([
        (ERRORS_COUNT_KEY.to_string(), errors.to_string()),
        (WARNINGS_COUNT_KEY.to_string(), warnings.to_string()),
        (INFOS_COUNT_KEY.to_string(), infos.to_string()),
    ])
}

/// Messages attributed to one job, captured when its boundary was closed
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobResults {
    errors: Vec<String>,
    warnings: Vec<String>,
    infos: Vec<String>,
}

pub(crate) static EMPTY_RESULTS: JobResults = JobResults {
    errors: Vec::new(),
    warnings: Vec::new(),
    infos: Vec::new(),
};

impl JobResults {
    pub fn new(errors: Vec<String>, warnings: Vec<String>, infos: Vec<String>) -> Self {
        Self {
            errors,
            warnings,
            infos,
        }
    }

    /// Results of a job that never had its boundary closed
    pub fn empty() -> Self {
        Self::default()
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

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.infos.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        summary_map(self.errors.len(), self.warnings.len(), self.infos.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_map_has_exactly_three_keys() {
        let results = JobResults::new(
            vec!["e".to_string()],
            vec![],
            vec!["i1".to_string(), "i2".to_string()],
        );
        let map = results.to_map();

        assert_eq!(map.len(), 3);
        assert_eq!(map[ERRORS_COUNT_KEY], "1");
        assert_eq!(map[WARNINGS_COUNT_KEY], "0");
        assert_eq!(map[INFOS_COUNT_KEY], "2");
    }

    #[test]
    fn test_empty_results() {
        let results = JobResults::empty();
        assert!(results.is_empty());
        assert!(!results.has_errors());
        assert!(!results.has_warnings());
        assert_eq!(&results, &EMPTY_RESULTS);
    }
}
