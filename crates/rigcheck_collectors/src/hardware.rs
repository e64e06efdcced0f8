//! Hardware inventory probe.
//!
//! CPU, memory, and volume numbers come from sysinfo and work on any
//! platform. GPU adapters, memory module details, physical disk media types,
//! and the motherboard identity live in WMI and are reached through
//! PowerShell CIM queries on Windows; elsewhere those parts stay empty and
//! the section still collects.

use crate::probe;
use chrono::{NaiveDate, Utc};
use rigcheck_core::snapshot::{
    BoardInfo, CpuInfo, DriveKind, GpuInfo, HardwareInfo, MemoryInfo, StorageInfo,
};
use rigcheck_core::{Collector, CollectorContext, DiagError, SectionData, SectionKind};
use serde_json::Value;
use std::time::Duration;
use sysinfo::{Components, DiskKind, Disks, System};

const BYTES_PER_GB: f64 = 1_073_741_824.0;

const VIDEO_CONTROLLER_QUERY: &str = "Get-CimInstance Win32_VideoController | \
     Select-Object Name,AdapterCompatibility,AdapterRAM,DriverVersion,DriverDate | \
     ConvertTo-Json -Compress";

const MEMORY_MODULE_QUERY: &str = "Get-CimInstance Win32_PhysicalMemory | \
     Select-Object Speed,SMBIOSMemoryType | ConvertTo-Json -Compress";

const PHYSICAL_DISK_QUERY: &str =
    "Get-PhysicalDisk | Select-Object FriendlyName,MediaType,SerialNumber | \
     ConvertTo-Json -Compress";

const BASE_BOARD_QUERY: &str = "Get-CimInstance Win32_BaseBoard | \
     Select-Object Manufacturer,Product,SerialNumber | ConvertTo-Json -Compress";

const BIOS_QUERY: &str =
    "Get-CimInstance Win32_BIOS | Select-Object SMBIOSBIOSVersion | ConvertTo-Json -Compress";

pub struct HardwareCollector;

impl Collector for HardwareCollector {
    fn name(&self) -> &'static str {
        "hardware"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::Hardware
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    fn collect(&self, ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        let mut info = HardwareInfo {
            cpu: Some(collect_cpu()),
            memory: Some(collect_memory()),
            ..Default::default()
        };

        if ctx.cancel.is_cancelled() {
            return Err(DiagError::collector(self.name(), "cancelled"));
        }

        info.storage = collect_storage();
        info.gpus = collect_gpus(Utc::now().date_naive());
        info.motherboard = collect_board();
        Ok(SectionData::Hardware(info))
    }
}

// ============================================================================
// CPU AND MEMORY
// ============================================================================

fn collect_cpu() -> CpuInfo {
    let mut sys = System::new();
    // Load needs two samples a beat apart.
    sys.refresh_cpu();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();

    let (name, vendor, base_clock_mhz) = sys
        .cpus()
        .first()
        .map(|cpu| {
            (
                cpu.brand().trim().to_string(),
                cpu.vendor_id().to_string(),
                cpu.frequency(),
            )
        })
        .unwrap_or_default();

    CpuInfo {
        name,
        vendor,
        physical_cores: sys
            .physical_core_count()
            .unwrap_or_else(num_cpus::get_physical),
        logical_cores: sys.cpus().len().max(num_cpus::get()),
        base_clock_mhz,
        temperature_c: cpu_temperature(),
        load_percent: Some(f64::from(sys.global_cpu_info().cpu_usage())),
    }
}

fn cpu_temperature() -> Option<f64> {
    let components = Components::new_with_refreshed_list();
    components
        .iter()
        .filter(|c| {
            let label = c.label().to_lowercase();
            label.contains("cpu") || label.contains("tctl") || label.contains("package")
        })
        .map(|c| f64::from(c.temperature()))
        .filter(|t| *t > 0.0)
        .fold(None, |hottest: Option<f64>, t| {
            Some(hottest.map_or(t, |h| h.max(t)))
        })
}

fn collect_memory() -> MemoryInfo {
    let mut sys = System::new();
    sys.refresh_memory();
    let (speed_mhz, kind) = memory_module_details();

    MemoryInfo {
        total_gb: bytes_to_gb(sys.total_memory()),
        used_gb: bytes_to_gb(sys.used_memory()),
        available_gb: bytes_to_gb(sys.available_memory()),
        speed_mhz,
        kind,
    }
}

fn memory_module_details() -> (Option<u32>, Option<String>) {
    match probe::powershell(MEMORY_MODULE_QUERY) {
        Some(raw) => parse_memory_modules(&raw),
        None => (None, None),
    }
}

/// Highest configured module clock plus the DDR generation, when the
/// firmware reports them.
fn parse_memory_modules(raw: &str) -> (Option<u32>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return (None, None);
    };

    let mut speed: Option<u32> = None;
    let mut kind: Option<String> = None;
    for record in probe::json_records(&value) {
        if let Some(s) = record.get("Speed").and_then(Value::as_u64) {
            let s = s as u32;
            speed = Some(speed.map_or(s, |prev| prev.max(s)));
        }
        if kind.is_none() {
            kind = record
                .get("SMBIOSMemoryType")
                .and_then(Value::as_u64)
                .and_then(memory_kind_label)
                .map(str::to_string);
        }
    }
    (speed, kind)
}

fn memory_kind_label(smbios_type: u64) -> Option<&'static str> {
    match smbios_type {
        20 => Some("DDR"),
        21 => Some("DDR2"),
        24 => Some("DDR3"),
        26 => Some("DDR4"),
        34 => Some("DDR5"),
        _ => None,
    }
}

// ============================================================================
// STORAGE
// ============================================================================

fn collect_storage() -> Vec<StorageInfo> {
    let disks = Disks::new_with_refreshed_list();
    let physical = physical_disk_details();

    let mut volumes = Vec::new();
    for disk in disks.iter() {
        let total = disk.total_space();
        if total == 0 {
            continue;
        }
        let free = disk.available_space();
        let mount = disk.mount_point().to_string_lossy().to_string();

        let mut volume = StorageInfo {
            model: disk.name().to_string_lossy().trim().to_string(),
            kind: match disk.kind() {
                DiskKind::SSD => DriveKind::Ssd,
                DiskKind::HDD => DriveKind::Hdd,
                DiskKind::Unknown(_) => DriveKind::Unknown,
            },
            total_gb: bytes_to_gb(total),
            free_gb: bytes_to_gb(free),
            usage_percent: usage_percent(total, free),
            is_system_drive: is_system_mount(&mount),
            serial: None,
        };
        if volume.model.is_empty() {
            volume.model = mount;
        }
        refine_from_physical(&mut volume, &physical);
        volumes.push(volume);
    }
    volumes
}

/// Media type and serial for one physical drive, from `Get-PhysicalDisk`.
struct PhysicalDisk {
    name: String,
    kind: DriveKind,
    serial: Option<String>,
}

fn physical_disk_details() -> Vec<PhysicalDisk> {
    probe::powershell(PHYSICAL_DISK_QUERY)
        .map(|raw| parse_physical_disks(&raw))
        .unwrap_or_default()
}

fn parse_physical_disks(raw: &str) -> Vec<PhysicalDisk> {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };

    probe::json_records(&value)
        .into_iter()
        .filter_map(|record| {
            let name = probe::text_field(record, "FriendlyName");
            if name.is_empty() {
                return None;
            }
            Some(PhysicalDisk {
                name,
                kind: parse_media_type(record.get("MediaType")),
                serial: record
                    .get("SerialNumber")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            })
        })
        .collect()
}

/// MediaType serializes as a string on newer PowerShell and as the raw
/// enum value (3 = HDD, 4 = SSD) on older builds.
fn parse_media_type(value: Option<&Value>) -> DriveKind {
    match value {
        Some(Value::String(s)) if s.eq_ignore_ascii_case("ssd") => DriveKind::Ssd,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("hdd") => DriveKind::Hdd,
        Some(Value::Number(n)) if n.as_u64() == Some(4) => DriveKind::Ssd,
        Some(Value::Number(n)) if n.as_u64() == Some(3) => DriveKind::Hdd,
        _ => DriveKind::Unknown,
    }
}

/// Fill in media type and serial from the physical disk list. With a single
/// physical drive every volume belongs to it; otherwise match by name.
fn refine_from_physical(volume: &mut StorageInfo, physical: &[PhysicalDisk]) {
    let matched = match physical {
        [only] => Some(only),
        _ => {
            let model = volume.model.to_lowercase();
            physical.iter().find(|disk| {
                let name = disk.name.to_lowercase();
                !name.is_empty() && (model.contains(&name) || name.contains(&model))
            })
        }
    };

    if let Some(disk) = matched {
        if volume.kind == DriveKind::Unknown {
            volume.kind = disk.kind;
        }
        if volume.serial.is_none() {
            volume.serial = disk.serial.clone();
        }
    }
}

fn is_system_mount(mount: &str) -> bool {
    mount == "/" || mount.eq_ignore_ascii_case("C:\\") || mount.eq_ignore_ascii_case("C:")
}

fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_GB * 10.0).round() / 10.0
}

fn usage_percent(total: u64, free: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let used = total.saturating_sub(free) as f64;
    (used / total as f64 * 1000.0).round() / 10.0
}

// ============================================================================
// GPU AND MOTHERBOARD
// ============================================================================

fn collect_gpus(today: NaiveDate) -> Vec<GpuInfo> {
    probe::powershell(VIDEO_CONTROLLER_QUERY)
        .map(|raw| parse_video_controllers(&raw, today))
        .unwrap_or_default()
}

fn parse_video_controllers(raw: &str, today: NaiveDate) -> Vec<GpuInfo> {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };

    probe::json_records(&value)
        .into_iter()
        .filter_map(|record| {
            let name = record.get("Name").and_then(Value::as_str)?.trim().to_string();
            let driver_date = record
                .get("DriverDate")
                .and_then(Value::as_str)
                .and_then(probe::parse_cim_date);

            Some(GpuInfo {
                name,
                vendor: probe::text_field(record, "AdapterCompatibility"),
                // AdapterRAM is a 32-bit counter and tops out at 4 GiB.
                vram_mb: record
                    .get("AdapterRAM")
                    .and_then(Value::as_u64)
                    .filter(|bytes| *bytes > 0)
                    .map(|bytes| bytes / (1024 * 1024)),
                driver_version: record
                    .get("DriverVersion")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                driver_date: driver_date.map(|d| d.format("%Y-%m-%d").to_string()),
                driver_age_days: driver_date.map(|d| (today - d).num_days()),
                temperature_c: None,
            })
        })
        .collect()
}

fn collect_board() -> Option<BoardInfo> {
    let raw = probe::powershell(BASE_BOARD_QUERY)?;
    let mut board = parse_base_board(&raw)?;
    if let Some(bios_raw) = probe::powershell(BIOS_QUERY) {
        if let Some(version) = parse_bios_version(&bios_raw) {
            board.bios_version = version;
        }
    }
    Some(board)
}

fn parse_base_board(raw: &str) -> Option<BoardInfo> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let record = probe::json_records(&value).into_iter().next()?;

    Some(BoardInfo {
        manufacturer: probe::text_field(record, "Manufacturer"),
        model: probe::text_field(record, "Product"),
        bios_version: String::new(),
        serial: record
            .get("SerialNumber")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            // OEM boards ship placeholder serials.
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("default string")),
    })
}

fn parse_bios_version(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let record = probe::json_records(&value).into_iter().next()?;
    let version = probe::text_field(record, "SMBIOSBIOSVersion");
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_video_controllers_array() {
        let raw = r#"[
            {"Name": "NVIDIA GeForce RTX 4070", "AdapterCompatibility": "NVIDIA",
             "AdapterRAM": 4293918720, "DriverVersion": "31.0.15.5123",
             "DriverDate": "/Date(1705363200000)/"},
            {"Name": "Intel(R) UHD Graphics 770", "AdapterCompatibility": "Intel Corporation",
             "AdapterRAM": 1073741824, "DriverVersion": null, "DriverDate": null}
        ]"#;

        let gpus = parse_video_controllers(raw, day(2024, 3, 1));
        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].name, "NVIDIA GeForce RTX 4070");
        assert_eq!(gpus[0].vendor, "NVIDIA");
        assert_eq!(gpus[0].vram_mb, Some(4095));
        assert_eq!(gpus[0].driver_date.as_deref(), Some("2024-01-16"));
        assert_eq!(gpus[0].driver_age_days, Some(45));
        assert_eq!(gpus[1].driver_version, None);
        assert_eq!(gpus[1].driver_age_days, None);
    }

    #[test]
    fn test_parse_video_controllers_single_object() {
        let raw = r#"{"Name": "AMD Radeon RX 7800 XT", "AdapterCompatibility":
            "Advanced Micro Devices, Inc.", "AdapterRAM": 0, "DriverVersion": "24.1.1",
            "DriverDate": "2024-02-10T00:00:00"}"#;

        let gpus = parse_video_controllers(raw, day(2024, 2, 20));
        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].vram_mb, None);
        assert_eq!(gpus[0].driver_date.as_deref(), Some("2024-02-10"));
        assert_eq!(gpus[0].driver_age_days, Some(10));
    }

    #[test]
    fn test_parse_video_controllers_garbage() {
        assert!(parse_video_controllers("not json", day(2024, 1, 1)).is_empty());
        assert!(parse_video_controllers("[{\"NoName\": 1}]", day(2024, 1, 1)).is_empty());
    }

    #[test]
    fn test_parse_memory_modules_takes_max_speed() {
        let raw = r#"[
            {"Speed": 3200, "SMBIOSMemoryType": 26},
            {"Speed": 3600, "SMBIOSMemoryType": 26}
        ]"#;
        let (speed, kind) = parse_memory_modules(raw);
        assert_eq!(speed, Some(3600));
        assert_eq!(kind.as_deref(), Some("DDR4"));
    }

    #[test]
    fn test_memory_kind_label() {
        assert_eq!(memory_kind_label(26), Some("DDR4"));
        assert_eq!(memory_kind_label(34), Some("DDR5"));
        assert_eq!(memory_kind_label(24), Some("DDR3"));
        assert_eq!(memory_kind_label(99), None);
    }

    #[test]
    fn test_parse_physical_disks_media_type_shapes() {
        let raw = r#"[
            {"FriendlyName": "Samsung SSD 980 PRO 1TB", "MediaType": "SSD",
             "SerialNumber": "S5GXNX0T123456"},
            {"FriendlyName": "WDC WD40EZRZ", "MediaType": 3, "SerialNumber": "  "}
        ]"#;

        let disks = parse_physical_disks(raw);
        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].kind, DriveKind::Ssd);
        assert_eq!(disks[0].serial.as_deref(), Some("S5GXNX0T123456"));
        assert_eq!(disks[1].kind, DriveKind::Hdd);
        assert_eq!(disks[1].serial, None);
    }

    #[test]
    fn test_refine_single_physical_disk_covers_all_volumes() {
        let physical = vec![PhysicalDisk {
            name: "Samsung SSD 980 PRO 1TB".into(),
            kind: DriveKind::Ssd,
            serial: Some("S5GX".into()),
        }];
        let mut volume = StorageInfo {
            model: "C:\\".into(),
            kind: DriveKind::Unknown,
            ..Default::default()
        };

        refine_from_physical(&mut volume, &physical);
        assert_eq!(volume.kind, DriveKind::Ssd);
        assert_eq!(volume.serial.as_deref(), Some("S5GX"));
    }

    #[test]
    fn test_refine_matches_by_name_with_many_disks() {
        let physical = vec![
            PhysicalDisk {
                name: "Samsung SSD 980".into(),
                kind: DriveKind::Ssd,
                serial: None,
            },
            PhysicalDisk {
                name: "WDC WD40EZRZ".into(),
                kind: DriveKind::Hdd,
                serial: None,
            },
        ];
        let mut volume = StorageInfo {
            model: "WDC WD40EZRZ-00GXCB0".into(),
            kind: DriveKind::Unknown,
            ..Default::default()
        };

        refine_from_physical(&mut volume, &physical);
        assert_eq!(volume.kind, DriveKind::Hdd);

        // Existing kind is never overwritten.
        let mut ssd = StorageInfo {
            model: "WDC WD40EZRZ".into(),
            kind: DriveKind::Ssd,
            ..Default::default()
        };
        refine_from_physical(&mut ssd, &physical);
        assert_eq!(ssd.kind, DriveKind::Ssd);
    }

    #[test]
    fn test_parse_base_board_filters_placeholder_serial() {
        let raw = r#"{"Manufacturer": "ASUSTeK COMPUTER INC.", "Product": "ROG STRIX B550-F",
            "SerialNumber": "Default string"}"#;
        let board = parse_base_board(raw).unwrap();
        assert_eq!(board.manufacturer, "ASUSTeK COMPUTER INC.");
        assert_eq!(board.model, "ROG STRIX B550-F");
        assert_eq!(board.serial, None);
    }

    #[test]
    fn test_bytes_and_usage_helpers() {
        assert_eq!(bytes_to_gb(1_073_741_824), 1.0);
        assert_eq!(bytes_to_gb(16_106_127_360), 15.0);
        assert_eq!(usage_percent(1000, 250), 75.0);
        assert_eq!(usage_percent(0, 0), 0.0);
        // Free space larger than total is clamped, not negative.
        assert_eq!(usage_percent(100, 200), 0.0);
    }

    #[test]
    fn test_is_system_mount() {
        assert!(is_system_mount("/"));
        assert!(is_system_mount("C:\\"));
        assert!(is_system_mount("c:"));
        assert!(!is_system_mount("D:\\"));
        assert!(!is_system_mount("/home"));
    }
}
