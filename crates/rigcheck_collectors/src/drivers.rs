//! Driver inventory probe.
//!
//! Walks `Win32_PnPSignedDriver` for provider, version, date, device class,
//! and the signature flag, plus `Win32_PnPEntity` for devices the system
//! itself marks as broken. Update status against the vendor version database
//! is stamped on later, during snapshot assembly.

use crate::probe;
use rigcheck_core::snapshot::{DriverCategory, DriverInventory, DriverRecord, DriverStatus};
use rigcheck_core::{Collector, CollectorContext, DiagError, SectionData, SectionKind};
use serde_json::Value;
use tracing::debug;

const SIGNED_DRIVER_QUERY: &str = "Get-CimInstance Win32_PnPSignedDriver | \
     Select-Object DeviceName,DriverProviderName,DriverVersion,DriverDate,DeviceClass,IsSigned | \
     ConvertTo-Json -Compress";

const PROBLEM_DEVICE_QUERY: &str =
    "Get-CimInstance Win32_PnPEntity -Filter 'ConfigManagerErrorCode <> 0' | \
     Select-Object Name,ConfigManagerErrorCode | ConvertTo-Json -Compress";

pub struct DriverCollector;

impl Collector for DriverCollector {
    fn name(&self) -> &'static str {
        "drivers"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::Drivers
    }

    fn collect(&self, ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        let raw = probe::powershell(SIGNED_DRIVER_QUERY).ok_or_else(|| {
            DiagError::collector(self.name(), "driver inventory requires the Windows CIM provider")
        })?;
        let records = parse_signed_drivers(&raw);
        if records.is_empty() {
            return Err(DiagError::collector(
                self.name(),
                "driver query returned no usable records",
            ));
        }

        if ctx.cancel.is_cancelled() {
            return Err(DiagError::collector(self.name(), "cancelled"));
        }

        let problem_count = probe::powershell(PROBLEM_DEVICE_QUERY)
            .map(|raw| count_problem_devices(&raw))
            .unwrap_or(0);
        debug!(
            "{} driver records, {} problem devices",
            records.len(),
            problem_count
        );

        Ok(SectionData::Drivers(build_inventory(records, problem_count)))
    }
}

fn parse_signed_drivers(raw: &str) -> Vec<DriverRecord> {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };

    probe::json_records(&value)
        .into_iter()
        .filter_map(|record| {
            let device = probe::text_field(record, "DeviceName");
            let version = probe::text_field(record, "DriverVersion");
            if device.is_empty() || version.is_empty() {
                return None;
            }
            Some(DriverRecord {
                device,
                provider: probe::text_field(record, "DriverProviderName"),
                version,
                date: record
                    .get("DriverDate")
                    .and_then(Value::as_str)
                    .and_then(probe::parse_cim_date)
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                category: device_class_category(&probe::text_field(record, "DeviceClass")),
                // A missing flag is not evidence of tampering.
                signed: record.get("IsSigned").and_then(Value::as_bool).unwrap_or(true),
                latest_version: None,
                status: DriverStatus::Unknown,
            })
        })
        .collect()
}

fn device_class_category(class: &str) -> DriverCategory {
    match class.to_uppercase().as_str() {
        "DISPLAY" => DriverCategory::Gpu,
        "MEDIA" => DriverCategory::Audio,
        "NET" => DriverCategory::Network,
        "SCSIADAPTER" | "DISKDRIVE" | "HDC" => DriverCategory::Storage,
        "SYSTEM" => DriverCategory::Chipset,
        _ => DriverCategory::Other,
    }
}

/// The full PnP tree runs to hundreds of entries. Counters cover every
/// scanned record; the kept list is the classes that matter for gaming plus
/// anything unsigned.
fn build_inventory(records: Vec<DriverRecord>, problem_count: usize) -> DriverInventory {
    let total = records.len();
    let unsigned_count = records.iter().filter(|d| !d.signed).count();
    let drivers: Vec<DriverRecord> = records
        .into_iter()
        .filter(|d| d.category != DriverCategory::Other || !d.signed)
        .collect();

    DriverInventory {
        total,
        drivers,
        unsigned_count,
        gpu_updates_available: 0,
        critical_count: problem_count,
    }
}

fn count_problem_devices(raw: &str) -> usize {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return 0;
    };
    probe::json_records(&value).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"DeviceName": "NVIDIA GeForce RTX 4070", "DriverProviderName": "NVIDIA",
         "DriverVersion": "31.0.15.5123", "DriverDate": "/Date(1705363200000)/",
         "DeviceClass": "DISPLAY", "IsSigned": true},
        {"DeviceName": "Realtek High Definition Audio", "DriverProviderName": "Realtek",
         "DriverVersion": "6.0.9235.1", "DriverDate": null,
         "DeviceClass": "MEDIA", "IsSigned": true},
        {"DeviceName": null, "DriverProviderName": "Microsoft",
         "DriverVersion": "10.0.22621.1", "DeviceClass": "SYSTEM", "IsSigned": true},
        {"DeviceName": "Mystery Filter Driver", "DriverProviderName": "",
         "DriverVersion": "1.0.0.0", "DriverDate": null,
         "DeviceClass": "UNKNOWN", "IsSigned": false},
        {"DeviceName": "Intel(R) SMBus", "DriverProviderName": "Intel",
         "DriverVersion": "10.1.19444.8378", "DriverDate": null,
         "DeviceClass": "SYSTEM", "IsSigned": true},
        {"DeviceName": "Some Virtual Adapter", "DriverProviderName": "Microsoft",
         "DriverVersion": "10.0.1.1", "DriverDate": null,
         "DeviceClass": "SOFTWARECOMPONENT", "IsSigned": true}
    ]"#;

    #[test]
    fn test_parse_skips_incomplete_records() {
        let records = parse_signed_drivers(SAMPLE);
        // The null DeviceName entry is dropped.
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].device, "NVIDIA GeForce RTX 4070");
        assert_eq!(records[0].category, DriverCategory::Gpu);
        assert_eq!(records[0].date.as_deref(), Some("2024-01-16"));
        assert_eq!(records[0].status, DriverStatus::Unknown);
        assert!(!records[2].signed);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_signed_drivers("no json here").is_empty());
        assert!(parse_signed_drivers("[]").is_empty());
    }

    #[test]
    fn test_device_class_mapping() {
        assert_eq!(device_class_category("DISPLAY"), DriverCategory::Gpu);
        assert_eq!(device_class_category("display"), DriverCategory::Gpu);
        assert_eq!(device_class_category("MEDIA"), DriverCategory::Audio);
        assert_eq!(device_class_category("NET"), DriverCategory::Network);
        assert_eq!(device_class_category("DISKDRIVE"), DriverCategory::Storage);
        assert_eq!(device_class_category("HDC"), DriverCategory::Storage);
        assert_eq!(device_class_category("SYSTEM"), DriverCategory::Chipset);
        assert_eq!(device_class_category("USB"), DriverCategory::Other);
        assert_eq!(device_class_category(""), DriverCategory::Other);
    }

    #[test]
    fn test_build_inventory_counts_all_keeps_interesting() {
        let records = parse_signed_drivers(SAMPLE);
        let inventory = build_inventory(records, 2);

        assert_eq!(inventory.total, 5);
        assert_eq!(inventory.unsigned_count, 1);
        assert_eq!(inventory.critical_count, 2);
        assert_eq!(inventory.gpu_updates_available, 0);
        // GPU, audio, chipset, and the unsigned oddball survive; the signed
        // software component does not.
        assert_eq!(inventory.drivers.len(), 4);
        assert!(inventory
            .drivers
            .iter()
            .any(|d| d.device == "Mystery Filter Driver"));
        assert!(!inventory
            .drivers
            .iter()
            .any(|d| d.device == "Some Virtual Adapter"));
    }

    #[test]
    fn test_count_problem_devices_both_shapes() {
        let single = r#"{"Name": "Broken USB Hub", "ConfigManagerErrorCode": 43}"#;
        assert_eq!(count_problem_devices(single), 1);

        let many = r#"[{"Name": "A", "ConfigManagerErrorCode": 10},
                       {"Name": "B", "ConfigManagerErrorCode": 28}]"#;
        assert_eq!(count_problem_devices(many), 2);
        assert_eq!(count_problem_devices(""), 0);
    }
}
