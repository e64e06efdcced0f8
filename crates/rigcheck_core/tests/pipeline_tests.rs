//! End-to-end pipeline tests.
//!
//! Drive complete runs through the public API with stub collectors: no real
//! system probes, no sockets, history on a temp dir. Each test pins one
//! property of the collect -> redact -> evaluate -> score -> record chain.

use rigcheck_core::snapshot::{
    BenchmarkReport, DriveKind, HardwareInfo, LauncherScan, NetworkReport, StorageInfo,
};
use rigcheck_core::{
    Category, Collector, CollectorContext, DiagConfig, DiagError, HealthLabel, HistoryStore,
    Orchestrator, RunStage, SectionData, SectionKind, Severity,
};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Stub collectors and fixtures
// ============================================================================

/// Hands back a fixed payload; the simplest possible collector.
struct FixedCollector {
    name: &'static str,
    data: SectionData,
}

impl FixedCollector {
    fn new(name: &'static str, data: SectionData) -> Arc<dyn Collector> {
        Arc::new(Self { name, data })
    }
}

impl Collector for FixedCollector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> SectionKind {
        self.data.kind()
    }

    fn collect(&self, _ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        Ok(self.data.clone())
    }
}

fn hdd_system_drive() -> SectionData {
    let mut hw = HardwareInfo::default();
    hw.storage.push(StorageInfo {
        model: "WDC WD10EZEX".into(),
        kind: DriveKind::Hdd,
        total_gb: 931.5,
        free_gb: 400.0,
        usage_percent: 57.1,
        is_system_drive: true,
        serial: None,
    });
    SectionData::Hardware(hw)
}

/// Defaults read as offline and would trip the disconnected rule.
fn online_network() -> SectionData {
    SectionData::Network(NetworkReport {
        is_connected: true,
        ..Default::default()
    })
}

fn config_with(dir: &TempDir) -> DiagConfig {
    let mut config = DiagConfig::default();
    config.paths.history_dir = Some(dir.path().join("history"));
    config
}

async fn run_with(config: DiagConfig, collectors: Vec<Arc<dyn Collector>>) -> rigcheck_core::RunReport {
    Orchestrator::with_collectors(config, collectors)
        .run()
        .await
        .unwrap()
}

// ============================================================================
// Scoring through the whole pipeline
// ============================================================================

/// An HDD as the system drive is exactly one High finding worth ten points.
#[tokio::test]
async fn test_hdd_rig_scores_ninety_with_one_finding() {
    let dir = TempDir::new().unwrap();
    let report = run_with(
        config_with(&dir),
        vec![
            FixedCollector::new("hardware", hdd_system_drive()),
            FixedCollector::new("network", online_network()),
        ],
    )
    .await;

    assert_eq!(report.health.value, 90);
    assert_eq!(report.health.label, HealthLabel::Excellent);
    assert_eq!(report.issues.len(), 1);

    let issue = &report.issues[0];
    assert_eq!(issue.rule_id, "system-drive-hdd");
    assert_eq!(issue.category, Category::Performance);
    assert_eq!(issue.severity, Severity::High);
    assert!(!issue.evidence.is_empty());
    assert!(!issue.recommendation.is_empty());
}

/// When one measurement crosses several cutoffs of the same family, only the
/// tightest one may speak.
#[tokio::test]
async fn test_slow_disk_reports_only_the_narrowest_threshold() {
    let dir = TempDir::new().unwrap();
    let benchmark = SectionData::Benchmark(BenchmarkReport {
        sequential_read_mbps: Some(40.0),
        sequential_write_mbps: Some(420.0),
        cpu_hash_score: Some(950.0),
        memory_copy_mbps: Some(8200.0),
        payload_mb: 256,
        duration_ms: 4200,
    });
    let report = run_with(
        config_with(&dir),
        vec![FixedCollector::new("benchmark", benchmark)],
    )
    .await;

    let ids: Vec<&str> = report.issues.iter().map(|i| i.rule_id.as_str()).collect();
    // 40 MB/s is under both the 100 and the 50 cutoff; only the 50 fires.
    assert!(ids.contains(&"disk-read-critical"));
    assert!(!ids.contains(&"disk-read-slow"));
    // The healthy write figure stays silent.
    assert!(!ids.iter().any(|id| id.starts_with("disk-write")));
}

// ============================================================================
// External rules
// ============================================================================

/// A rules file entry with a known id replaces the shipped rule wholesale.
#[tokio::test]
async fn test_external_rules_override_builtin() {
    let dir = TempDir::new().unwrap();
    let rules_path = dir.path().join("rules.json");
    std::fs::write(
        &rules_path,
        r#"{
            "rules": [
                {
                    "id": "system-drive-hdd",
                    "category": "performance",
                    "severity": "critical",
                    "confidence": 100,
                    "title": "Windows lives on spinning rust",
                    "message": "The system drive is mechanical.",
                    "recommendation": "Clone the system volume to an SSD.",
                    "when": {"field": "hardware.system_drive_kind", "op": "equals", "value": "hdd"}
                }
            ]
        }"#,
    )
    .unwrap();

    let mut config = config_with(&dir);
    config.paths.rules_file = Some(rules_path);
    let report = run_with(
        config,
        vec![
            FixedCollector::new("hardware", hdd_system_drive()),
            FixedCollector::new("network", online_network()),
        ],
    )
    .await;

    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, Severity::Critical);
    assert_eq!(report.issues[0].title, "Windows lives on spinning rust");
    // Critical costs twenty points instead of ten.
    assert_eq!(report.health.value, 80);
}

/// One malformed entry costs a warning, never the rest of the file.
#[tokio::test]
async fn test_rule_file_problems_surface_as_warnings() {
    let dir = TempDir::new().unwrap();
    let rules_path = dir.path().join("rules.json");
    std::fs::write(
        &rules_path,
        r#"[
            {
                "id": "no-launchers-installed",
                "category": "gaming",
                "severity": "low",
                "title": "No game launchers found",
                "message": "No launcher is installed on this machine.",
                "when": {"field": "launchers.installed_count", "op": "equals", "value": 0}
            },
            {"id": "broken"}
        ]"#,
    )
    .unwrap();

    let mut config = config_with(&dir);
    config.paths.rules_file = Some(rules_path);
    let report = run_with(
        config,
        vec![FixedCollector::new(
            "launchers",
            SectionData::Launchers(LauncherScan::default()),
        )],
    )
    .await;

    // The good entry made it in and fired.
    assert!(report
        .issues
        .iter()
        .any(|i| i.rule_id == "no-launchers-installed"));
    // The bad one turned into an analysis-stage warning.
    assert!(report
        .warnings
        .iter()
        .any(|w| w.stage == RunStage::Analyzing && w.message.contains("broken")));
}

// ============================================================================
// History across runs
// ============================================================================

/// Three runs chain through history: a regression shows as a new issue and a
/// negative delta, the fix as a resolved issue and a positive one.
#[tokio::test]
async fn test_history_chain_and_trends() {
    let dir = TempDir::new().unwrap();
    let config = config_with(&dir);

    let first = run_with(
        config.clone(),
        vec![FixedCollector::new("network", online_network())],
    )
    .await;
    assert_eq!(first.health.value, 100);
    assert!(first.trend.is_none());

    let second = run_with(
        config.clone(),
        vec![
            FixedCollector::new("hardware", hdd_system_drive()),
            FixedCollector::new("network", online_network()),
        ],
    )
    .await;
    let trend = second.trend.unwrap();
    assert_eq!(trend.score_delta, -10);
    assert_eq!(trend.new_issue_ids, vec!["system-drive-hdd"]);

    let third = run_with(
        config.clone(),
        vec![FixedCollector::new("network", online_network())],
    )
    .await;
    let trend = third.trend.unwrap();
    assert_eq!(trend.score_delta, 10);
    assert!(trend.new_issue_ids.is_empty());
    assert_eq!(trend.resolved_issue_ids, vec!["system-drive-hdd"]);

    // All three runs are on disk, newest last.
    let store = HistoryStore::new(dir.path().join("history")).unwrap();
    let entries = store.load_all().unwrap();
    let scores: Vec<u8> = entries.iter().map(|e| e.score).collect();
    assert_eq!(scores, vec![100, 90, 100]);
}

/// A history location that cannot be created degrades to a warning; the
/// report still comes back whole.
#[tokio::test]
async fn test_unwritable_history_is_a_warning_not_an_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("history");
    std::fs::write(&blocker, b"a file where the directory should be").unwrap();

    let mut config = DiagConfig::default();
    config.paths.history_dir = Some(blocker);
    let report = run_with(
        config,
        vec![FixedCollector::new("network", online_network())],
    )
    .await;

    assert_eq!(report.health.value, 100);
    assert!(report.trend.is_none());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.stage == RunStage::Recording));
}
