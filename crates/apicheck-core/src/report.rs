//! Run results: per-case outcomes and the aggregate report
//!
//! These types are the machine-readable output of `apicheck run --output json`.

use std::fmt::Write as _;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed,
    /// Empty or missing sequence; counted neither as pass nor fail
    Skipped,
}

/// Why a case stopped.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaseFailure {
    /// Zero-based index of the failing step
    pub step: usize,
    /// Error taxonomy name, e.g. "ResponseAssertionMismatch"
    pub kind: String,
    pub message: String,
    /// Actual response body, when the failure happened after dispatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaseReport {
    pub title: String,
    pub outcome: CaseOutcome,
    /// Steps that completed successfully
    pub steps_passed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<CaseFailure>,
}

impl CaseReport {
    #[must_use]
    pub fn skipped(title: &str) -> Self {
        Self {
            title: title.to_string(),
            outcome: CaseOutcome::Skipped,
            steps_passed: 0,
            failure: None,
        }
    }

    #[must_use]
    pub fn passed(title: &str, steps: usize) -> Self {
        Self {
            title: title.to_string(),
            outcome: CaseOutcome::Passed,
            steps_passed: steps,
            failure: None,
        }
    }

    #[must_use]
    pub fn failed(title: &str, steps_passed: usize, failure: CaseFailure) -> Self {
        Self {
            title: title.to_string(),
            outcome: CaseOutcome::Failed,
            steps_passed,
            failure: Some(failure),
        }
    }
}

/// Aggregate of every case in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub cases: Vec<CaseReport>,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl RunReport {
    #[must_use]
    pub fn from_cases(cases: Vec<CaseReport>) -> Self {
        let count = |o: CaseOutcome| cases.iter().filter(|c| c.outcome == o).count() as u64;
        Self {
            passed: count(CaseOutcome::Passed),
            failed: count(CaseOutcome::Failed),
            skipped: count(CaseOutcome::Skipped),
            cases,
        }
    }

    /// 0 when nothing failed, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.failed == 0 { 0 } else { 1 }
    }

    /// Human-readable summary for terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut out = String::new();
        for case in &self.cases {
            let label = match case.outcome {
                CaseOutcome::Passed => "PASS",
                CaseOutcome::Failed => "NG",
                CaseOutcome::Skipped => "SKIP",
            };
            let _ = writeln!(out, "  [{label}] {}", case.title);
            if let Some(f) = &case.failure {
                let _ = writeln!(out, "         step {}: {} - {}", f.step, f.kind, f.message);
            }
        }
        let _ = write!(
            out,
            "\n{} passed, {} failed, {} skipped",
            self.passed, self.failed, self.skipped
        );
        out
    }
}

/// Generate JSON Schema for the report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(RunReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(title: &str, outcome: CaseOutcome) -> CaseReport {
        CaseReport {
            title: title.into(),
            outcome,
            steps_passed: 0,
            failure: None,
        }
    }

    #[test]
    fn counts_by_outcome() {
        let report = RunReport::from_cases(vec![
            case("a", CaseOutcome::Passed),
            case("b", CaseOutcome::Failed),
            case("c", CaseOutcome::Skipped),
            case("d", CaseOutcome::Passed),
        ]);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn skipped_only_exits_zero() {
        let report = RunReport::from_cases(vec![CaseReport::skipped("empty")]);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn terminal_summary() {
        let mut failed = case("create item", CaseOutcome::Failed);
        failed.failure = Some(CaseFailure {
            step: 1,
            kind: "MissingRequiredParameter".into(),
            message: "missing required parameter 'id'".into(),
            actual_body: None,
        });
        let report = RunReport::from_cases(vec![case("list items", CaseOutcome::Passed), failed]);
        assert_eq!(
            report.to_terminal(),
            "  [PASS] list items\n  [NG] create item\n         step 1: MissingRequiredParameter - missing required parameter 'id'\n\n1 passed, 1 failed, 0 skipped"
        );
    }

    #[test]
    fn serializes_outcome_snake_case() {
        let json = serde_json::to_value(case("a", CaseOutcome::Skipped)).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert!(json.get("failure").is_none());
    }

    #[test]
    fn schema_generation_produces_valid_json() {
        let schema = generate_schema();
        let parsed: serde_json::Value = serde_json::from_str(&schema).unwrap();
        assert_eq!(
            parsed.get("title").and_then(|v| v.as_str()),
            Some("RunReport")
        );
    }
}
