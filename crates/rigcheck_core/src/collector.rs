//! The collector seam.
//!
//! Each probe implements [`Collector`] and returns exactly one section's
//! payload. The orchestrator owns scheduling, timeouts, and error capture;
//! a collector only has to gather data and may block, since it runs on the
//! blocking pool. Collectors check [`CollectorContext::cancel`] at natural
//! pause points and bail out early when it trips.

use crate::error::DiagError;
use crate::snapshot::{
    BenchmarkReport, DriverInventory, EventLogSummary, HardwareInfo, LauncherScan, NetworkReport,
    OsInfo, PrereqReport, ProcessScan,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Which snapshot section a collector feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Hardware,
    Windows,
    EventLog,
    Drivers,
    Launchers,
    Network,
    Benchmark,
    Prerequisites,
    Processes,
}

impl SectionKind {
    /// Snapshot field name, also the first segment of rule field paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Hardware => "hardware",
            SectionKind::Windows => "windows",
            SectionKind::EventLog => "event_log",
            SectionKind::Drivers => "drivers",
            SectionKind::Launchers => "launchers",
            SectionKind::Network => "network",
            SectionKind::Benchmark => "benchmark",
            SectionKind::Prerequisites => "prerequisites",
            SectionKind::Processes => "processes",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A successfully collected payload, tagged with its destination section.
#[derive(Debug, Clone)]
pub enum SectionData {
    Hardware(HardwareInfo),
    Windows(OsInfo),
    EventLog(EventLogSummary),
    Drivers(DriverInventory),
    Launchers(LauncherScan),
    Network(NetworkReport),
    Benchmark(BenchmarkReport),
    Prerequisites(PrereqReport),
    Processes(ProcessScan),
}

impl SectionData {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionData::Hardware(_) => SectionKind::Hardware,
            SectionData::Windows(_) => SectionKind::Windows,
            SectionData::EventLog(_) => SectionKind::EventLog,
            SectionData::Drivers(_) => SectionKind::Drivers,
            SectionData::Launchers(_) => SectionKind::Launchers,
            SectionData::Network(_) => SectionKind::Network,
            SectionData::Benchmark(_) => SectionKind::Benchmark,
            SectionData::Prerequisites(_) => SectionKind::Prerequisites,
            SectionData::Processes(_) => SectionKind::Processes,
        }
    }
}

/// Cooperative cancellation flag shared between the orchestrator and every
/// running collector. Cancelling is sticky.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Everything a collector gets to see about the run it is part of.
#[derive(Debug, Clone)]
pub struct CollectorContext {
    /// Quick mode trims or skips the slow probes.
    pub quick: bool,
    pub cancel: CancelToken,
}

impl CollectorContext {
    pub fn new(quick: bool, cancel: CancelToken) -> Self {
        Self { quick, cancel }
    }
}

/// One diagnostic probe producing one snapshot section.
pub trait Collector: Send + Sync {
    /// Stable name used in logs, skip reasons, and error strings.
    fn name(&self) -> &'static str;

    fn kind(&self) -> SectionKind;

    /// Per-collector deadline; the orchestrator may tighten but never
    /// loosens it.
    fn timeout(&self) -> Duration {
        DEFAULT_TIMEOUT
    }

    /// Return a reason to skip this collector for the given run, e.g. in
    /// quick mode. A skipped collector never runs.
    fn skip_reason(&self, _ctx: &CollectorContext) -> Option<String> {
        None
    }

    /// Dotted snapshot paths this collector fills with data that must be
    /// blanked when redaction is on.
    fn sensitive_paths(&self) -> &'static [&'static str] {
        &[]
    }

    /// Gather the section payload. Runs on the blocking pool; free to do
    /// synchronous IO. Errors become an `Unavailable` section, never a
    /// failed run.
    fn collect(&self, ctx: &CollectorContext) -> Result<SectionData, DiagError>;
}
