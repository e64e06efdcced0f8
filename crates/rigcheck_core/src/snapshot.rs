//! Snapshot - the read-only system state captured by one diagnostic run
//!
//! A snapshot is assembled once, after all collectors have finished, and is
//! immutable from then on. Every section is optional: a collector that fails,
//! times out, or is skipped by configuration leaves its section in a state
//! that says so instead of fabricating data. Analysis treats absent sections
//! as "no evidence", never as an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SECTION WRAPPER
// ============================================================================

/// One snapshot section: collected data, or the reason there is none.
///
/// `Unavailable` means the collector ran and could not deliver (failure,
/// timeout, unsupported platform). `Skipped` means configuration excluded it
/// (quick mode). Both are ordinary outcomes; "collected but empty" is
/// represented by `Collected` of a default payload and is distinct from both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Collected(T),
    Unavailable { reason: String },
    Skipped { reason: String },
}

impl<T> Section<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Section::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Section::Skipped {
            reason: reason.into(),
        }
    }

    /// The collected payload, if there is one.
    pub fn value(&self) -> Option<&T> {
        match self {
            Section::Collected(data) => Some(data),
            _ => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Section::Collected(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_collected(&self) -> bool {
        matches!(self, Section::Collected(_))
    }

    /// The reason data is missing, for unavailable or skipped sections.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Section::Collected(_) => None,
            Section::Unavailable { reason } | Section::Skipped { reason } => Some(reason),
        }
    }
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Section::unavailable("not collected")
    }
}

// ============================================================================
// HARDWARE
// ============================================================================

/// Kind of storage device backing a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveKind {
    Ssd,
    Hdd,
    Unknown,
}

impl Default for DriveKind {
    fn default() -> Self {
        DriveKind::Unknown
    }
}

impl DriveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveKind::Ssd => "ssd",
            DriveKind::Hdd => "hdd",
            DriveKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// CPU model name as reported by the system
    pub name: String,
    pub vendor: String,
    pub physical_cores: usize,
    pub logical_cores: usize,
    pub base_clock_mhz: u64,
    /// Package temperature in Celsius, when a sensor is exposed
    pub temperature_c: Option<f64>,
    /// Instantaneous load at collection time (0-100)
    pub load_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
    /// Configured clock in MHz, when the firmware reports it
    pub speed_mhz: Option<u32>,
    /// Memory generation, e.g. "DDR4"
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub name: String,
    pub vendor: String,
    pub vram_mb: Option<u64>,
    pub driver_version: Option<String>,
    /// Driver release date in ISO format, when known
    pub driver_date: Option<String>,
    /// Days since the driver release date, computed at collection time
    pub driver_age_days: Option<i64>,
    pub temperature_c: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub model: String,
    #[serde(default)]
    pub kind: DriveKind,
    pub total_gb: f64,
    pub free_gb: f64,
    pub usage_percent: f64,
    /// Whether this volume hosts the operating system
    pub is_system_drive: bool,
    pub serial: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardInfo {
    pub manufacturer: String,
    pub model: String,
    pub bios_version: String,
    pub serial: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub cpu: Option<CpuInfo>,
    pub memory: Option<MemoryInfo>,
    pub gpus: Vec<GpuInfo>,
    pub storage: Vec<StorageInfo>,
    pub motherboard: Option<BoardInfo>,
    /// Kind of the drive marked as the system drive, mirrored here so
    /// consumers can read one scalar instead of scanning the storage list.
    pub system_drive_kind: Option<DriveKind>,
}

impl HardwareInfo {
    /// Recompute `system_drive_kind` from the storage list. Called once
    /// during snapshot assembly.
    pub fn refresh_system_drive_kind(&mut self) {
        self.system_drive_kind = self
            .storage
            .iter()
            .find(|d| d.is_system_drive)
            .map(|d| d.kind);
    }
}

// ============================================================================
// OPERATING SYSTEM
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsInfo {
    /// Product edition, e.g. "Windows 11 Pro"
    pub edition: String,
    pub version: String,
    pub build: String,
    pub architecture: String,
    pub install_date: Option<String>,
    // TODO: read activation state via `slmgr /xpr` once output parsing is
    // locale-safe; the field stays None until then.
    pub activation: Option<String>,
    /// Whether Game Mode is enabled, when the setting could be read
    pub game_mode_enabled: Option<bool>,
    /// Whether hardware-accelerated GPU scheduling is enabled
    pub hardware_gpu_scheduling: Option<bool>,
    pub uptime_hours: f64,
    /// Machine hostname; collectors flag this field for redaction
    pub hostname: String,
}

// ============================================================================
// EVENT LOG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLogSummary {
    /// Window the counters cover, in days
    pub period_days: u32,
    pub total_events: u64,
    /// Critical-level system events (level 1)
    pub critical_errors: u64,
    pub error_count: u64,
    pub warning_count: u64,
    /// Application crash events (Application Error 1000)
    pub app_crashes: u64,
    /// Kernel-Power 41 events: the machine lost power or hard-reset
    pub unexpected_shutdowns: u64,
}

// ============================================================================
// DRIVERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverCategory {
    Gpu,
    Audio,
    Network,
    Storage,
    Chipset,
    Other,
}

impl Default for DriverCategory {
    fn default() -> Self {
        DriverCategory::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    UpToDate,
    UpdateAvailable,
    Unknown,
}

impl Default for DriverStatus {
    fn default() -> Self {
        DriverStatus::Unknown
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub device: String,
    pub provider: String,
    pub version: String,
    pub date: Option<String>,
    #[serde(default)]
    pub category: DriverCategory,
    pub signed: bool,
    /// Latest known version for this vendor, filled from the version
    /// database during snapshot assembly
    pub latest_version: Option<String>,
    #[serde(default)]
    pub status: DriverStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverInventory {
    pub total: usize,
    pub drivers: Vec<DriverRecord>,
    pub unsigned_count: usize,
    /// GPU drivers with a newer version in the version database
    pub gpu_updates_available: usize,
    /// Drivers the system reports as having problems
    pub critical_count: usize,
}

// ============================================================================
// GAME LAUNCHERS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LauncherInfo {
    pub name: String,
    pub running: bool,
    pub exe: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LauncherScan {
    pub installed: Vec<LauncherInfo>,
    pub installed_count: usize,
    pub running_count: usize,
}

// ============================================================================
// NETWORK
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Ethernet,
    Wifi,
    Unknown,
}

/// Latency measurements against one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyProbe {
    /// host:port the probe connected to
    pub target: String,
    /// Human-readable endpoint name
    pub label: String,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub loss_percent: f64,
    pub jitter_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub is_connected: bool,
    pub connection_type: Option<LinkKind>,
    pub dns_latency_ms: Option<f64>,
    pub probes: Vec<LatencyProbe>,
    /// Average latency across reachable probes
    pub avg_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
    /// Worst packet loss observed across probes
    pub packet_loss_percent: Option<f64>,
}

// ============================================================================
// BENCHMARK
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub sequential_read_mbps: Option<f64>,
    pub sequential_write_mbps: Option<f64>,
    /// SHA-256 hashing throughput in MB/s, as a rough CPU figure
    pub cpu_hash_score: Option<f64>,
    pub memory_copy_mbps: Option<f64>,
    /// Size of the disk payload that was written and read back
    pub payload_mb: u64,
    pub duration_ms: u64,
}

// ============================================================================
// GAMING PREREQUISITES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrereqItem {
    pub name: String,
    pub installed: bool,
    /// Whether games commonly refuse to start without this component
    pub critical: bool,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrereqReport {
    pub items: Vec<PrereqItem>,
    pub missing_critical: usize,
}

// ============================================================================
// PROCESSES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlaggedProcess {
    pub name: String,
    pub pid: u32,
    pub reason: String,
    pub impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessScan {
    pub total: usize,
    pub flagged: Vec<FlaggedProcess>,
    pub flagged_count: usize,
    /// Flagged processes that are resource-heavy security suites
    pub heavy_security_count: usize,
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Complete system state captured by one diagnostic run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub run_id: Uuid,
    pub taken_at: DateTime<Utc>,

    #[serde(default)]
    pub hardware: Section<HardwareInfo>,
    #[serde(default)]
    pub windows: Section<OsInfo>,
    #[serde(default)]
    pub event_log: Section<EventLogSummary>,
    #[serde(default)]
    pub drivers: Section<DriverInventory>,
    #[serde(default)]
    pub launchers: Section<LauncherScan>,
    #[serde(default)]
    pub network: Section<NetworkReport>,
    #[serde(default)]
    pub benchmark: Section<BenchmarkReport>,
    #[serde(default)]
    pub prerequisites: Section<PrereqReport>,
    #[serde(default)]
    pub processes: Section<ProcessScan>,

    /// Dotted field paths collectors flagged for redaction
    #[serde(default)]
    pub sensitive_paths: Vec<String>,
    /// Wall-clock time the collection phase took
    #[serde(default)]
    pub collection_ms: u64,
    /// Human-readable descriptions of collector failures
    #[serde(default)]
    pub collector_errors: Vec<String>,
}

impl Snapshot {
    /// A snapshot with every section unavailable, ready for assembly.
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            taken_at: Utc::now(),
            hardware: Section::default(),
            windows: Section::default(),
            event_log: Section::default(),
            drivers: Section::default(),
            launchers: Section::default(),
            network: Section::default(),
            benchmark: Section::default(),
            prerequisites: Section::default(),
            processes: Section::default(),
            sensitive_paths: Vec::new(),
            collection_ms: 0,
            collector_errors: Vec::new(),
        }
    }

    /// JSON view the rule engine resolves field paths against.
    ///
    /// Only collected sections appear, keyed by section name and holding the
    /// payload directly (no state wrapper). A rule path into an unavailable
    /// or skipped section therefore resolves to nothing.
    pub fn field_tree(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        insert_collected(&mut map, "hardware", &self.hardware);
        insert_collected(&mut map, "windows", &self.windows);
        insert_collected(&mut map, "event_log", &self.event_log);
        insert_collected(&mut map, "drivers", &self.drivers);
        insert_collected(&mut map, "launchers", &self.launchers);
        insert_collected(&mut map, "network", &self.network);
        insert_collected(&mut map, "benchmark", &self.benchmark);
        insert_collected(&mut map, "prerequisites", &self.prerequisites);
        insert_collected(&mut map, "processes", &self.processes);
        serde_json::Value::Object(map)
    }

    /// Names and states of all sections, for availability reporting.
    pub fn section_states(&self) -> Vec<(&'static str, SectionState)> {
        vec![
            ("hardware", state_of(&self.hardware)),
            ("windows", state_of(&self.windows)),
            ("event_log", state_of(&self.event_log)),
            ("drivers", state_of(&self.drivers)),
            ("launchers", state_of(&self.launchers)),
            ("network", state_of(&self.network)),
            ("benchmark", state_of(&self.benchmark)),
            ("prerequisites", state_of(&self.prerequisites)),
            ("processes", state_of(&self.processes)),
        ]
    }

    pub fn collected_section_count(&self) -> usize {
        self.section_states()
            .iter()
            .filter(|(_, s)| matches!(s, SectionState::Collected))
            .count()
    }
}

/// Section state without the payload, for summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionState {
    Collected,
    Unavailable { reason: String },
    Skipped { reason: String },
}

fn state_of<T>(section: &Section<T>) -> SectionState {
    match section {
        Section::Collected(_) => SectionState::Collected,
        Section::Unavailable { reason } => SectionState::Unavailable {
            reason: reason.clone(),
        },
        Section::Skipped { reason } => SectionState::Skipped {
            reason: reason.clone(),
        },
    }
}

fn insert_collected<T: Serialize>(
    map: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
    section: &Section<T>,
) {
    if let Section::Collected(data) = section {
        if let Ok(value) = serde_json::to_value(data) {
            map.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_states_serialize_distinctly() {
        let collected: Section<EventLogSummary> = Section::Collected(EventLogSummary::default());
        let unavailable: Section<EventLogSummary> = Section::unavailable("wevtutil missing");
        let skipped: Section<EventLogSummary> = Section::skipped("quick mode");

        let c = serde_json::to_value(&collected).unwrap();
        let u = serde_json::to_value(&unavailable).unwrap();
        let s = serde_json::to_value(&skipped).unwrap();

        assert_eq!(c["state"], "collected");
        assert_eq!(u["state"], "unavailable");
        assert_eq!(u["data"]["reason"], "wevtutil missing");
        assert_eq!(s["state"], "skipped");
        assert_eq!(s["data"]["reason"], "quick mode");
    }

    #[test]
    fn test_collected_empty_differs_from_unavailable() {
        let empty: Section<ProcessScan> = Section::Collected(ProcessScan::default());
        assert!(empty.is_collected());
        assert!(empty.reason().is_none());

        let missing: Section<ProcessScan> = Section::unavailable("scan failed");
        assert!(!missing.is_collected());
        assert_eq!(missing.reason(), Some("scan failed"));
    }

    #[test]
    fn test_new_snapshot_has_no_collected_sections() {
        let snapshot = Snapshot::new(Uuid::new_v4());
        assert_eq!(snapshot.collected_section_count(), 0);
        assert_eq!(snapshot.field_tree(), serde_json::json!({}));
    }

    #[test]
    fn test_field_tree_exposes_only_collected_payloads() {
        let mut snapshot = Snapshot::new(Uuid::new_v4());
        snapshot.hardware = Section::Collected(HardwareInfo {
            memory: Some(MemoryInfo {
                total_gb: 32.0,
                ..Default::default()
            }),
            ..Default::default()
        });
        snapshot.network = Section::unavailable("no adapters");

        let tree = snapshot.field_tree();
        assert_eq!(tree["hardware"]["memory"]["total_gb"], 32.0);
        assert!(tree.get("network").is_none());
        // No state wrapper inside the tree.
        assert!(tree["hardware"].get("state").is_none());
    }

    #[test]
    fn test_refresh_system_drive_kind() {
        let mut hw = HardwareInfo {
            storage: vec![
                StorageInfo {
                    model: "Data HDD".into(),
                    kind: DriveKind::Hdd,
                    is_system_drive: false,
                    ..Default::default()
                },
                StorageInfo {
                    model: "OS SSD".into(),
                    kind: DriveKind::Ssd,
                    is_system_drive: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        hw.refresh_system_drive_kind();
        assert_eq!(hw.system_drive_kind, Some(DriveKind::Ssd));

        hw.storage.clear();
        hw.refresh_system_drive_kind();
        assert_eq!(hw.system_drive_kind, None);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut snapshot = Snapshot::new(Uuid::new_v4());
        snapshot.event_log = Section::Collected(EventLogSummary {
            period_days: 7,
            critical_errors: 2,
            ..Default::default()
        });
        snapshot.sensitive_paths.push("windows.hostname".into());

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_log.value().unwrap().critical_errors, 2);
        assert_eq!(back.sensitive_paths, vec!["windows.hostname".to_string()]);
    }

    #[test]
    fn test_drive_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(DriveKind::Hdd).unwrap(), "hdd");
        assert_eq!(serde_json::to_value(DriveKind::Ssd).unwrap(), "ssd");
    }
}
