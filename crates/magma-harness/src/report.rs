//! JSON-serializable conformance report, in the shape a CI job can
//! diff or archive.

use serde::Serialize;

use crate::scenario::ScenarioResult;

#[derive(Debug, Serialize)]
pub struct ConformanceReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub scenarios: Vec<ScenarioResult>,
}

impl ConformanceReport {
    pub fn from_results(scenarios: Vec<ScenarioResult>) -> Self {
        let total = scenarios.len();
        let passed = scenarios.iter().filter(|s| s.passed).count();
        ConformanceReport {
            total,
            passed,
            failed: total - passed,
            scenarios,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
