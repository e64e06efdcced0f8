//! Run orchestration.
//!
//! Drives one diagnostic run through its stages: collect every registered
//! section concurrently, redact, evaluate rules, score, record history, and
//! hand back a [`RunReport`]. Collector failures of any kind (errors,
//! timeouts, panics) degrade that one section to `Unavailable` and the run
//! carries on; only cancellation aborts the whole run.
//!
//! Concurrency is bounded by a semaphore and each collector runs on the
//! blocking pool under its own deadline. A collector that outlives its
//! deadline keeps running detached until it returns on its own; its slot is
//! handed to the next collector in the meantime.

use crate::collector::{CancelToken, Collector, CollectorContext, SectionData, SectionKind};
use crate::config::DiagConfig;
use crate::drivers_db::VersionDb;
use crate::error::{DiagError, RunStage, RunWarning};
use crate::history::{snapshot_digest, HistoryEntry, HistoryStore, TrendSummary};
use crate::redact::Redactor;
use crate::report::{RunReport, REPORT_SCHEMA_VERSION};
use crate::rules::load::load_ruleset;
use crate::rules::{evaluate, Issue};
use crate::scoring::{score, HealthScore};
use crate::snapshot::{Section, Snapshot};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct Orchestrator {
    config: DiagConfig,
    collectors: Vec<Arc<dyn Collector>>,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(config: DiagConfig) -> Self {
        Self {
            config,
            collectors: Vec::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_collectors(config: DiagConfig, collectors: Vec<Arc<dyn Collector>>) -> Self {
        let mut orchestrator = Self::new(config);
        orchestrator.collectors = collectors;
        orchestrator
    }

    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        self.collectors.push(collector);
    }

    /// Token to trip from a signal handler; the run then winds down and
    /// returns a fatal error.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Execute one full run.
    pub async fn run(self) -> Result<RunReport, DiagError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut warnings: Vec<RunWarning> = Vec::new();
        info!(
            "run {} starting with {} collectors (quick: {})",
            run_id,
            self.collectors.len(),
            self.config.run.quick
        );

        let mut stage = advance(RunStage::Init, RunStage::Collecting);
        let snapshot = self.collect_all(run_id, &mut warnings).await?;

        stage = advance(stage, RunStage::Analyzing);
        let redactor = Redactor::from_config(&self.config.redaction);
        let snapshot = redactor.redact(&snapshot);
        let (ruleset, rule_warnings) = load_ruleset(self.config.paths.rules_file.as_deref());
        warnings.extend(
            rule_warnings
                .into_iter()
                .map(|message| RunWarning::new(RunStage::Analyzing, message)),
        );
        let issues = evaluate(&snapshot, &ruleset);
        debug!("{} issue(s) from {} rules", issues.len(), ruleset.len());

        stage = advance(stage, RunStage::Scoring);
        let health = score(&issues, &self.config.scoring);
        info!("health score {} ({})", health.value, health.label);

        stage = advance(stage, RunStage::Recording);
        let trend = self.record(run_id, &snapshot, &issues, &health, &mut warnings);

        let _ = advance(stage, RunStage::Done);
        info!(
            "run {} done in {} ms, {} issue(s), {} warning(s)",
            run_id,
            started.elapsed().as_millis(),
            issues.len(),
            warnings.len()
        );

        Ok(RunReport {
            schema_version: REPORT_SCHEMA_VERSION,
            run_id,
            generated_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
            quick: self.config.run.quick,
            snapshot,
            issues,
            health,
            trend,
            warnings,
        })
    }

    // ========================================================================
    // COLLECTION
    // ========================================================================

    async fn collect_all(
        &self,
        run_id: Uuid,
        warnings: &mut Vec<RunWarning>,
    ) -> Result<Snapshot, DiagError> {
        let started = Instant::now();
        let mut snapshot = Snapshot::new(run_id);
        let ctx = CollectorContext::new(self.config.run.quick, self.cancel.clone());
        let semaphore = Arc::new(Semaphore::new(self.config.run.effective_concurrency()));
        let ceiling = self.config.run.collector_timeout();
        let grace = self.config.run.cancel_grace();

        let mut tasks = Vec::new();
        for collector in &self.collectors {
            if let Some(reason) = collector.skip_reason(&ctx) {
                debug!("skipping {}: {}", collector.name(), reason);
                store_skipped(&mut snapshot, collector.kind(), reason);
                continue;
            }
            // Collectors that run register the field paths redaction must blank.
            snapshot
                .sensitive_paths
                .extend(collector.sensitive_paths().iter().map(|p| p.to_string()));
            tasks.push(self.spawn_collector(collector, &ctx, &semaphore, ceiling));
        }

        for (name, kind, mut handle) in tasks {
            // Once cancelled, give in-flight collectors a short grace to
            // notice the token, then drop them.
            let joined = if self.cancel.is_cancelled() {
                match tokio::time::timeout(grace, &mut handle).await {
                    Ok(joined) => Some(joined),
                    Err(_) => {
                        handle.abort();
                        None
                    }
                }
            } else {
                Some(handle.await)
            };

            let verdict = match joined {
                None => Verdict::Cancelled,
                Some(Ok(verdict)) => verdict,
                Some(Err(join_err)) => Verdict::Panicked(join_err.to_string()),
            };
            apply_verdict(&mut snapshot, warnings, name, kind, verdict);
        }

        if self.cancel.is_cancelled() {
            return Err(DiagError::fatal(RunStage::Collecting, "run cancelled"));
        }

        snapshot.collection_ms = started.elapsed().as_millis() as u64;
        self.finish_snapshot(&mut snapshot, warnings);
        debug!(
            "collected {}/{} sections in {} ms",
            snapshot.collected_section_count(),
            self.collectors.len(),
            snapshot.collection_ms
        );
        Ok(snapshot)
    }

    fn spawn_collector(
        &self,
        collector: &Arc<dyn Collector>,
        ctx: &CollectorContext,
        semaphore: &Arc<Semaphore>,
        ceiling: Duration,
    ) -> (&'static str, SectionKind, tokio::task::JoinHandle<Verdict>) {
        let name = collector.name();
        let kind = collector.kind();
        let deadline = collector.timeout().min(ceiling);
        let collector = Arc::clone(collector);
        let ctx = ctx.clone();
        let cancel = self.cancel.clone();
        let semaphore = Arc::clone(semaphore);

        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return Verdict::Failed("collector pool closed".to_string());
            };
            if cancel.is_cancelled() {
                return Verdict::Cancelled;
            }
            debug!("collector {} starting (deadline {:?})", name, deadline);
            let work = tokio::task::spawn_blocking(move || collector.collect(&ctx));
            match tokio::time::timeout(deadline, work).await {
                Ok(Ok(Ok(data))) => Verdict::Ok(data),
                Ok(Ok(Err(e))) => Verdict::Failed(e.to_string()),
                Ok(Err(join_err)) => Verdict::Panicked(join_err.to_string()),
                Err(_) => Verdict::TimedOut(deadline),
            }
        });
        (name, kind, handle)
    }

    /// Post-collection touch-ups that need more than one section or outside
    /// data: mark which drive Windows lives on and annotate driver versions.
    fn finish_snapshot(&self, snapshot: &mut Snapshot, warnings: &mut Vec<RunWarning>) {
        if let Some(hardware) = snapshot.hardware.value_mut() {
            hardware.refresh_system_drive_kind();
        }

        let (db, db_warnings) = VersionDb::load(self.config.paths.drivers_db.as_deref());
        warnings.extend(
            db_warnings
                .into_iter()
                .map(|message| RunWarning::new(RunStage::Collecting, message)),
        );
        if let Some(inventory) = snapshot.drivers.value_mut() {
            db.annotate(inventory);
        }
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    /// Record the run and compute the trend against the previous one. Any
    /// persistence problem degrades to a warning; the report always comes
    /// back.
    fn record(
        &self,
        run_id: Uuid,
        snapshot: &Snapshot,
        issues: &[Issue],
        health: &HealthScore,
        warnings: &mut Vec<RunWarning>,
    ) -> Option<TrendSummary> {
        if !self.config.run.record_history {
            debug!("history recording disabled");
            return None;
        }

        let store = match self.history_store() {
            Ok(store) => store,
            Err(e) => {
                warn!("history unavailable: {}", e);
                warnings.push(RunWarning::new(RunStage::Recording, e.to_string()));
                return None;
            }
        };

        let issue_ids: Vec<String> = issues.iter().map(|i| i.rule_id.clone()).collect();
        // Trend first: it must compare against the previous run, not this one.
        let trend = match store.trend_against_latest(health.value, &issue_ids) {
            Ok(trend) => trend,
            Err(e) => {
                warn!("trend unavailable: {}", e);
                warnings.push(RunWarning::new(RunStage::Recording, e.to_string()));
                None
            }
        };

        let entry = HistoryEntry::from_run(run_id, health, issues, snapshot_digest(snapshot));
        if let Err(e) = store.record(&entry) {
            warn!("history append failed: {}", e);
            warnings.push(RunWarning::new(RunStage::Recording, e.to_string()));
        }
        trend
    }

    fn history_store(&self) -> Result<HistoryStore, DiagError> {
        match &self.config.paths.history_dir {
            Some(dir) => HistoryStore::new(dir.clone()),
            None => HistoryStore::open_default(),
        }
    }
}

fn advance(from: RunStage, to: RunStage) -> RunStage {
    debug!("stage {} -> {}", from, to);
    to
}

enum Verdict {
    Ok(SectionData),
    Failed(String),
    TimedOut(Duration),
    Panicked(String),
    Cancelled,
}

fn apply_verdict(
    snapshot: &mut Snapshot,
    warnings: &mut Vec<RunWarning>,
    name: &'static str,
    kind: SectionKind,
    verdict: Verdict,
) {
    let reason = match verdict {
        Verdict::Ok(data) => {
            if data.kind() == kind {
                store_data(snapshot, data);
                return;
            }
            format!("returned {} data instead of {}", data.kind(), kind)
        }
        Verdict::Failed(reason) => reason,
        Verdict::TimedOut(deadline) => format!("timed out after {} s", deadline.as_secs_f32()),
        Verdict::Panicked(detail) => format!("panicked: {}", detail),
        Verdict::Cancelled => {
            store_skipped(snapshot, kind, "cancelled".to_string());
            return;
        }
    };

    warn!("collector {} failed: {}", name, reason);
    snapshot.collector_errors.push(format!("{}: {}", name, reason));
    warnings.push(RunWarning::new(
        RunStage::Collecting,
        format!("collector {}: {}", name, reason),
    ));
    store_unavailable(snapshot, kind, reason);
}

fn store_data(snapshot: &mut Snapshot, data: SectionData) {
    match data {
        SectionData::Hardware(payload) => snapshot.hardware = Section::Collected(payload),
        SectionData::Windows(payload) => snapshot.windows = Section::Collected(payload),
        SectionData::EventLog(payload) => snapshot.event_log = Section::Collected(payload),
        SectionData::Drivers(payload) => snapshot.drivers = Section::Collected(payload),
        SectionData::Launchers(payload) => snapshot.launchers = Section::Collected(payload),
        SectionData::Network(payload) => snapshot.network = Section::Collected(payload),
        SectionData::Benchmark(payload) => snapshot.benchmark = Section::Collected(payload),
        SectionData::Prerequisites(payload) => {
            snapshot.prerequisites = Section::Collected(payload)
        }
        SectionData::Processes(payload) => snapshot.processes = Section::Collected(payload),
    }
}

fn store_unavailable(snapshot: &mut Snapshot, kind: SectionKind, reason: String) {
    match kind {
        SectionKind::Hardware => snapshot.hardware = Section::unavailable(reason),
        SectionKind::Windows => snapshot.windows = Section::unavailable(reason),
        SectionKind::EventLog => snapshot.event_log = Section::unavailable(reason),
        SectionKind::Drivers => snapshot.drivers = Section::unavailable(reason),
        SectionKind::Launchers => snapshot.launchers = Section::unavailable(reason),
        SectionKind::Network => snapshot.network = Section::unavailable(reason),
        SectionKind::Benchmark => snapshot.benchmark = Section::unavailable(reason),
        SectionKind::Prerequisites => snapshot.prerequisites = Section::unavailable(reason),
        SectionKind::Processes => snapshot.processes = Section::unavailable(reason),
    }
}

fn store_skipped(snapshot: &mut Snapshot, kind: SectionKind, reason: String) {
    match kind {
        SectionKind::Hardware => snapshot.hardware = Section::skipped(reason),
        SectionKind::Windows => snapshot.windows = Section::skipped(reason),
        SectionKind::EventLog => snapshot.event_log = Section::skipped(reason),
        SectionKind::Drivers => snapshot.drivers = Section::skipped(reason),
        SectionKind::Launchers => snapshot.launchers = Section::skipped(reason),
        SectionKind::Network => snapshot.network = Section::skipped(reason),
        SectionKind::Benchmark => snapshot.benchmark = Section::skipped(reason),
        SectionKind::Prerequisites => snapshot.prerequisites = Section::skipped(reason),
        SectionKind::Processes => snapshot.processes = Section::skipped(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        DriveKind, HardwareInfo, NetworkReport, OsInfo, SectionState, StorageInfo,
    };
    use tempfile::TempDir;

    struct StubCollector {
        name: &'static str,
        kind: SectionKind,
        behavior: Behavior,
        deadline: Duration,
    }

    enum Behavior {
        Hardware(Box<HardwareInfo>),
        Windows(OsInfo),
        Network(NetworkReport),
        Fail(&'static str),
        SleepThenNetwork(Duration),
        Panic,
        SkipInQuick,
        WrongKind,
    }

    impl StubCollector {
        fn new(name: &'static str, kind: SectionKind, behavior: Behavior) -> Arc<dyn Collector> {
            Arc::new(Self {
                name,
                kind,
                behavior,
                deadline: Duration::from_secs(5),
            })
        }

        fn with_deadline(
            name: &'static str,
            kind: SectionKind,
            behavior: Behavior,
            deadline: Duration,
        ) -> Arc<dyn Collector> {
            Arc::new(Self {
                name,
                kind,
                behavior,
                deadline,
            })
        }
    }

    impl Collector for StubCollector {
        fn name(&self) -> &'static str {
            self.name
        }

        fn kind(&self) -> SectionKind {
            self.kind
        }

        fn timeout(&self) -> Duration {
            self.deadline
        }

        fn skip_reason(&self, ctx: &CollectorContext) -> Option<String> {
            match self.behavior {
                Behavior::SkipInQuick if ctx.quick => Some("quick mode".to_string()),
                _ => None,
            }
        }

        fn sensitive_paths(&self) -> &'static [&'static str] {
            match self.behavior {
                Behavior::Windows(_) => &["windows.hostname"],
                _ => &[],
            }
        }

        fn collect(&self, ctx: &CollectorContext) -> Result<SectionData, DiagError> {
            match &self.behavior {
                Behavior::Hardware(payload) => {
                    Ok(SectionData::Hardware((**payload).clone()))
                }
                Behavior::Windows(payload) => Ok(SectionData::Windows(payload.clone())),
                Behavior::Network(payload) => Ok(SectionData::Network(payload.clone())),
                Behavior::Fail(reason) => Err(DiagError::collector(self.name, *reason)),
                Behavior::SleepThenNetwork(nap) => {
                    let step = Duration::from_millis(10);
                    let mut slept = Duration::ZERO;
                    while slept < *nap {
                        if ctx.cancel.is_cancelled() {
                            return Err(DiagError::collector(self.name, "cancelled"));
                        }
                        std::thread::sleep(step);
                        slept += step;
                    }
                    Ok(SectionData::Network(NetworkReport::default()))
                }
                Behavior::Panic => panic!("stub blew up"),
                Behavior::SkipInQuick => Ok(SectionData::Network(NetworkReport::default())),
                Behavior::WrongKind => Ok(SectionData::Windows(OsInfo::default())),
            }
        }
    }

    fn test_config(dir: &TempDir) -> DiagConfig {
        let mut config = DiagConfig::default();
        config.paths.history_dir = Some(dir.path().join("history"));
        config
    }

    fn hdd_hardware() -> Box<HardwareInfo> {
        let mut hw = HardwareInfo::default();
        hw.storage.push(StorageInfo {
            model: "WDC WD10EZEX".into(),
            kind: DriveKind::Hdd,
            total_gb: 931.5,
            free_gb: 400.0,
            usage_percent: 57.1,
            is_system_drive: true,
            serial: Some("WD-1234".into()),
        });
        Box::new(hw)
    }

    // Defaults read as offline and would trip the disconnected rule.
    fn online_network() -> NetworkReport {
        NetworkReport {
            is_connected: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_collects_and_reports() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::with_collectors(
            test_config(&dir),
            vec![
                StubCollector::new("hardware", SectionKind::Hardware, {
                    Behavior::Hardware(hdd_hardware())
                }),
                StubCollector::new(
                    "network",
                    SectionKind::Network,
                    Behavior::Network(online_network()),
                ),
            ],
        );

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.schema_version, REPORT_SCHEMA_VERSION);
        assert!(report.snapshot.hardware.is_collected());
        assert!(report.snapshot.network.is_collected());
        // System drive kind derived from the marked drive.
        let hw = report.snapshot.hardware.value().unwrap();
        assert_eq!(hw.system_drive_kind, Some(DriveKind::Hdd));
        // The HDD rule fires; health drops by its penalty.
        assert!(report.issues.iter().any(|i| i.rule_id == "system-drive-hdd"));
        assert_eq!(report.health.value, 90);
        assert!(report.trend.is_none());
    }

    #[tokio::test]
    async fn test_failing_collector_degrades_section_only() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::with_collectors(
            test_config(&dir),
            vec![
                StubCollector::new(
                    "network",
                    SectionKind::Network,
                    Behavior::Network(NetworkReport::default()),
                ),
                StubCollector::new("drivers", SectionKind::Drivers, Behavior::Fail("no wmi")),
            ],
        );

        let report = orchestrator.run().await.unwrap();
        assert!(report.snapshot.network.is_collected());
        assert!(matches!(
            report.snapshot.drivers.reason(),
            Some(reason) if reason.contains("no wmi")
        ));
        assert_eq!(report.snapshot.collector_errors.len(), 1);
        assert!(report.snapshot.collector_errors[0].starts_with("drivers:"));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.stage == RunStage::Collecting));
    }

    #[tokio::test]
    async fn test_slow_collector_times_out() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::with_collectors(
            test_config(&dir),
            vec![StubCollector::with_deadline(
                "network",
                SectionKind::Network,
                Behavior::SleepThenNetwork(Duration::from_secs(3)),
                Duration::from_millis(50),
            )],
        );

        let report = orchestrator.run().await.unwrap();
        assert!(matches!(
            report.snapshot.network.reason(),
            Some(reason) if reason.contains("timed out")
        ));
    }

    #[tokio::test]
    async fn test_panicking_collector_degrades_section() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::with_collectors(
            test_config(&dir),
            vec![StubCollector::new(
                "windows",
                SectionKind::Windows,
                Behavior::Panic,
            )],
        );

        let report = orchestrator.run().await.unwrap();
        assert!(matches!(
            report.snapshot.windows.reason(),
            Some(reason) if reason.contains("panicked")
        ));
    }

    #[tokio::test]
    async fn test_quick_mode_skips_marked_collectors() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.run.quick = true;
        let orchestrator = Orchestrator::with_collectors(
            config,
            vec![StubCollector::new(
                "event_log",
                SectionKind::EventLog,
                Behavior::SkipInQuick,
            )],
        );

        let report = orchestrator.run().await.unwrap();
        assert!(report.quick);
        let states = report.snapshot.section_states();
        let event_log = states.iter().find(|(name, _)| *name == "event_log").unwrap();
        assert!(matches!(event_log.1, SectionState::Skipped { .. }));
        assert!(report.snapshot.collector_errors.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_aborts_run_with_fatal() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::with_collectors(
            test_config(&dir),
            vec![StubCollector::new(
                "network",
                SectionKind::Network,
                Behavior::SleepThenNetwork(Duration::from_secs(10)),
            )],
        );

        let token = orchestrator.cancel_token();
        token.cancel();
        let err = orchestrator.run().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_wrong_section_kind_is_rejected() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::with_collectors(
            test_config(&dir),
            vec![StubCollector::new(
                "network",
                SectionKind::Network,
                Behavior::WrongKind,
            )],
        );

        let report = orchestrator.run().await.unwrap();
        assert!(!report.snapshot.network.is_collected());
        assert!(!report.snapshot.windows.is_collected());
        assert_eq!(report.snapshot.collector_errors.len(), 1);
    }

    #[tokio::test]
    async fn test_second_run_reports_trend() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let first = Orchestrator::with_collectors(
            config.clone(),
            vec![StubCollector::new(
                "network",
                SectionKind::Network,
                Behavior::Network(online_network()),
            )],
        );
        let report = first.run().await.unwrap();
        assert!(report.trend.is_none());
        assert_eq!(report.health.value, 100);

        let second = Orchestrator::with_collectors(
            config,
            vec![StubCollector::new(
                "hardware",
                SectionKind::Hardware,
                Behavior::Hardware(hdd_hardware()),
            )],
        );
        let report = second.run().await.unwrap();
        let trend = report.trend.unwrap();
        assert_eq!(trend.previous_score, 100);
        assert_eq!(trend.score_delta, -10);
        assert_eq!(trend.new_issue_ids, vec!["system-drive-hdd"]);
        assert!(trend.resolved_issue_ids.is_empty());
    }

    #[tokio::test]
    async fn test_history_disabled_never_touches_disk() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.run.record_history = false;
        let orchestrator = Orchestrator::with_collectors(
            config,
            vec![StubCollector::new(
                "network",
                SectionKind::Network,
                Behavior::Network(NetworkReport::default()),
            )],
        );

        let report = orchestrator.run().await.unwrap();
        assert!(report.trend.is_none());
        assert!(!dir.path().join("history").exists());
    }

    #[tokio::test]
    async fn test_redaction_applied_before_report() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::with_collectors(
            test_config(&dir),
            vec![StubCollector::new(
                "hardware",
                SectionKind::Hardware,
                Behavior::Hardware(hdd_hardware()),
            )],
        );

        let report = orchestrator.run().await.unwrap();
        let hw = report.snapshot.hardware.value().unwrap();
        // The drive serial is a sensitive key and must be blanked.
        assert_eq!(hw.storage[0].serial.as_deref(), Some(crate::redact::REDACTED));
        assert_eq!(hw.storage[0].model, "WDC WD10EZEX");
    }

    #[tokio::test]
    async fn test_collector_flagged_paths_blanked() {
        let dir = TempDir::new().unwrap();
        let os = OsInfo {
            edition: "Windows 11 Home".into(),
            hostname: "LIVINGROOM-PC".into(),
            ..Default::default()
        };
        let orchestrator = Orchestrator::with_collectors(
            test_config(&dir),
            vec![StubCollector::new(
                "windows",
                SectionKind::Windows,
                Behavior::Windows(os),
            )],
        );

        let report = orchestrator.run().await.unwrap();
        assert!(report
            .snapshot
            .sensitive_paths
            .iter()
            .any(|p| p == "windows.hostname"));
        let windows = report.snapshot.windows.value().unwrap();
        assert_eq!(windows.hostname, crate::redact::REDACTED);
        assert_eq!(windows.edition, "Windows 11 Home");
    }
}
