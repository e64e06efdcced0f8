//! Health score computation.
//!
//! The score starts at 100 and loses `penalty * confidence / 100` points per
//! issue, where the penalty depends on severity. Deductions are accumulated
//! per category and each category is capped, so one noisy subsystem cannot
//! sink the whole score on its own. All arithmetic runs in integer
//! centipoints (hundredths of a point) so the result is exact and identical
//! for any issue ordering.

use crate::rules::{Category, Issue, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_CATEGORY_CAP: f64 = 40.0;

/// Knobs for the scorer. Serialized as part of the main config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Cap on total deduction per category, in points.
    #[serde(default = "default_category_cap")]
    pub default_category_cap: f64,
    /// Per-category overrides of the cap.
    #[serde(default)]
    pub category_caps: BTreeMap<Category, f64>,
}

fn default_category_cap() -> f64 {
    DEFAULT_CATEGORY_CAP
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_category_cap: DEFAULT_CATEGORY_CAP,
            category_caps: BTreeMap::new(),
        }
    }
}

impl ScoringConfig {
    fn cap_centipoints(&self, category: Category) -> u64 {
        let cap = self
            .category_caps
            .get(&category)
            .copied()
            .unwrap_or(self.default_category_cap)
            .max(0.0);
        (cap * 100.0).round() as u64
    }
}

/// Qualitative band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLabel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthLabel {
    pub fn from_score(value: u8) -> Self {
        match value {
            90..=u8::MAX => HealthLabel::Excellent,
            75..=89 => HealthLabel::Good,
            50..=74 => HealthLabel::Fair,
            _ => HealthLabel::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLabel::Excellent => "excellent",
            HealthLabel::Good => "good",
            HealthLabel::Fair => "fair",
            HealthLabel::Poor => "poor",
        }
    }
}

impl std::fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final 0..=100 health score with its per-category deduction breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub value: u8,
    pub label: HealthLabel,
    /// Points actually deducted per category, after capping.
    pub deductions: BTreeMap<Category, f64>,
}

impl HealthScore {
    pub fn perfect() -> Self {
        Self {
            value: 100,
            label: HealthLabel::Excellent,
            deductions: BTreeMap::new(),
        }
    }
}

fn penalty_points(severity: Severity) -> u64 {
    match severity {
        Severity::Critical => 20,
        Severity::High => 10,
        Severity::Medium => 5,
        Severity::Low => 2,
    }
}

/// Score a set of issues. Order of `issues` never affects the result.
pub fn score(issues: &[Issue], config: &ScoringConfig) -> HealthScore {
    // penalty points * confidence = centipoints deducted.
    let mut raw: BTreeMap<Category, u64> = BTreeMap::new();
    for issue in issues {
        let centi = penalty_points(issue.severity) * u64::from(issue.confidence.min(100));
        let slot = raw.entry(issue.category).or_insert(0);
        *slot = slot.saturating_add(centi);
    }

    let mut total_centi: u64 = 0;
    let mut deductions = BTreeMap::new();
    for (category, centi) in raw {
        let applied = centi.min(config.cap_centipoints(category));
        if applied == 0 {
            continue;
        }
        total_centi = total_centi.saturating_add(applied);
        deductions.insert(category, applied as f64 / 100.0);
    }

    // Round half-up to whole points, then clamp.
    let deducted = ((total_centi + 50) / 100).min(100) as u8;
    let value = 100 - deducted;

    HealthScore {
        value,
        label: HealthLabel::from_score(value),
        deductions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Evidence;
    use serde_json::json;

    fn issue(category: Category, severity: Severity, confidence: u8) -> Issue {
        Issue {
            rule_id: format!("{}-{}", category, severity),
            category,
            severity,
            confidence,
            title: "t".into(),
            description: "d".into(),
            evidence: vec![Evidence {
                field: "x.y".into(),
                value: json!(1),
            }],
            recommendation: String::new(),
        }
    }

    #[test]
    fn test_no_issues_scores_perfect() {
        let health = score(&[], &ScoringConfig::default());
        assert_eq!(health.value, 100);
        assert_eq!(health.label, HealthLabel::Excellent);
        assert!(health.deductions.is_empty());
    }

    #[test]
    fn test_penalties_scale_with_severity() {
        let cfg = ScoringConfig::default();
        let cases = [
            (Severity::Critical, 80),
            (Severity::High, 90),
            (Severity::Medium, 95),
            (Severity::Low, 98),
        ];
        for (severity, expected) in cases {
            let health = score(&[issue(Category::Hardware, severity, 100)], &cfg);
            assert_eq!(health.value, expected, "severity {}", severity);
        }
    }

    #[test]
    fn test_confidence_scales_penalty() {
        let health = score(
            &[issue(Category::Network, Severity::High, 50)],
            &ScoringConfig::default(),
        );
        // 10 points * 50% confidence = 5 points.
        assert_eq!(health.value, 95);
        assert_eq!(health.deductions[&Category::Network], 5.0);
    }

    #[test]
    fn test_category_cap_limits_one_noisy_category() {
        let issues: Vec<Issue> = (0..6)
            .map(|_| issue(Category::Stability, Severity::High, 100))
            .collect();
        let health = score(&issues, &ScoringConfig::default());
        // 60 points uncapped, capped to 40.
        assert_eq!(health.value, 60);
        assert_eq!(health.deductions[&Category::Stability], 40.0);
    }

    #[test]
    fn test_custom_cap_override() {
        let mut cfg = ScoringConfig::default();
        cfg.category_caps.insert(Category::Stability, 12.5);
        let issues: Vec<Issue> = (0..6)
            .map(|_| issue(Category::Stability, Severity::High, 100))
            .collect();
        let health = score(&issues, &cfg);
        // Capped at 12.5 points, rounded half-up to 13.
        assert_eq!(health.value, 87);
        assert_eq!(health.deductions[&Category::Stability], 12.5);
    }

    #[test]
    fn test_order_independence() {
        let cfg = ScoringConfig::default();
        let mut issues = vec![
            issue(Category::Hardware, Severity::Critical, 95),
            issue(Category::Network, Severity::Low, 85),
            issue(Category::Hardware, Severity::Medium, 90),
            issue(Category::Gaming, Severity::High, 90),
            issue(Category::Hardware, Severity::High, 100),
        ];
        let forward = score(&issues, &cfg);
        issues.reverse();
        let reversed = score(&issues, &cfg);
        issues.swap(0, 2);
        let swapped = score(&issues, &cfg);
        assert_eq!(forward, reversed);
        assert_eq!(forward, swapped);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let issues: Vec<Issue> = [
            Category::Hardware,
            Category::Performance,
            Category::Gaming,
            Category::Network,
            Category::Config,
            Category::Stability,
            Category::Security,
        ]
        .iter()
        .flat_map(|&c| (0..3).map(move |_| issue(c, Severity::Critical, 100)))
        .collect();
        let health = score(&issues, &ScoringConfig::default());
        assert_eq!(health.value, 0);
        assert_eq!(health.label, HealthLabel::Poor);
    }

    #[test]
    fn test_label_bands() {
        assert_eq!(HealthLabel::from_score(100), HealthLabel::Excellent);
        assert_eq!(HealthLabel::from_score(90), HealthLabel::Excellent);
        assert_eq!(HealthLabel::from_score(89), HealthLabel::Good);
        assert_eq!(HealthLabel::from_score(75), HealthLabel::Good);
        assert_eq!(HealthLabel::from_score(74), HealthLabel::Fair);
        assert_eq!(HealthLabel::from_score(50), HealthLabel::Fair);
        assert_eq!(HealthLabel::from_score(49), HealthLabel::Poor);
        assert_eq!(HealthLabel::from_score(0), HealthLabel::Poor);
    }

    #[test]
    fn test_deductions_survive_serde() {
        let health = score(
            &[
                issue(Category::Hardware, Severity::High, 100),
                issue(Category::Network, Severity::Low, 85),
            ],
            &ScoringConfig::default(),
        );
        let json = serde_json::to_string(&health).unwrap();
        assert!(json.contains("\"hardware\":10.0"));
        let back: HealthScore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, health);
    }
}
