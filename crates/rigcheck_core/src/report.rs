//! The assembled result of one diagnostic run.

use crate::error::RunWarning;
use crate::history::{SeverityCounts, TrendSummary};
use crate::rules::Issue;
use crate::scoring::HealthScore;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Everything a renderer or downstream consumer needs about one run. The
/// embedded snapshot has already been through redaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub quick: bool,
    pub snapshot: Snapshot,
    pub issues: Vec<Issue>,
    pub health: HealthScore,
    /// Comparison against the previous recorded run, if any.
    pub trend: Option<TrendSummary>,
    /// Non-fatal problems hit along the way.
    pub warnings: Vec<RunWarning>,
}

impl RunReport {
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::from_issues(&self.issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Category, Severity};
    use crate::scoring::HealthLabel;
    use std::collections::BTreeMap;

    #[test]
    fn test_report_round_trips_through_json() {
        let report = RunReport {
            schema_version: REPORT_SCHEMA_VERSION,
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            duration_ms: 1234,
            quick: true,
            snapshot: Snapshot::new(Uuid::new_v4()),
            issues: vec![Issue {
                rule_id: "ram-low".into(),
                category: Category::Hardware,
                severity: Severity::Medium,
                confidence: 90,
                title: "t".into(),
                description: "d".into(),
                evidence: Vec::new(),
                recommendation: String::new(),
            }],
            health: HealthScore {
                value: 95,
                label: HealthLabel::Excellent,
                deductions: BTreeMap::new(),
            },
            trend: None,
            warnings: Vec::new(),
        };

        let json = serde_json::to_string_pretty(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.issues.len(), 1);
        assert_eq!(back.severity_counts().medium, 1);
        assert_eq!(back.severity_counts().total(), 1);
    }
}
