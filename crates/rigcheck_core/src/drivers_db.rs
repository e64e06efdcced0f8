//! Known-latest driver version database.
//!
//! Ships with a small bundled table of vendor driver versions and optionally
//! merges a `drivers.json` placed next to the executable (or given on the
//! command line), so the table can be refreshed without a new build.
//! External entries win over bundled ones key by key; a malformed entry is
//! skipped with a warning and the rest of the file still applies.

use crate::snapshot::{DriverCategory, DriverInventory, DriverStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DB_FILENAME: &str = "drivers.json";

/// Latest known driver release for one vendor key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorVersion {
    pub version: String,
    #[serde(default)]
    pub date: Option<String>,
    /// Marketing name of the release line, e.g. "Game Ready Driver".
    #[serde(default)]
    pub name: Option<String>,
}

impl VendorVersion {
    fn new(version: &str, name: &str) -> Self {
        Self {
            version: version.to_string(),
            date: None,
            name: Some(name.to_string()),
        }
    }
}

/// Vendor key -> latest version. Keys ending in `_network` only apply to
/// network-class drivers, so a Realtek NIC is never compared against the
/// Realtek audio release line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDb {
    pub vendors: BTreeMap<String, VendorVersion>,
}

impl VersionDb {
    /// The bundled table. Versions are a point-in-time snapshot; ship a
    /// drivers.json alongside the binary to keep them current.
    pub fn builtin() -> Self {
        let mut vendors = BTreeMap::new();
        vendors.insert(
            "nvidia".to_string(),
            VendorVersion::new("551.23", "Game Ready Driver"),
        );
        vendors.insert(
            "amd".to_string(),
            VendorVersion::new("24.1.1", "Adrenalin Edition"),
        );
        vendors.insert(
            "intel".to_string(),
            VendorVersion::new("31.0.101.5084", "Arc Graphics Driver"),
        );
        vendors.insert(
            "realtek".to_string(),
            VendorVersion::new("6.0.9235.1", "HD Audio Driver"),
        );
        vendors.insert(
            "intel_network".to_string(),
            VendorVersion::new("28.0.0", "Ethernet Adapter Driver"),
        );
        Self { vendors }
    }

    /// Load the effective database: bundled table plus an optional external
    /// file. With an explicit path, a missing or broken file is reported as a
    /// warning; without one, the default locations are probed quietly.
    pub fn load(explicit: Option<&Path>) -> (Self, Vec<String>) {
        let mut db = Self::builtin();
        let mut warnings = Vec::new();

        let (path, required) = match explicit {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (default_db_path(), false),
        };

        if let Some(path) = path {
            match read_external(&path) {
                Ok((entries, mut entry_warnings)) => {
                    let count = entries.len();
                    db.vendors.extend(entries);
                    warnings.append(&mut entry_warnings);
                    info!("merged {} vendor entries from {}", count, path.display());
                }
                Err(reason) => {
                    if required {
                        warn!("driver database ignored: {}", reason);
                        warnings.push(reason);
                    } else {
                        debug!("no usable driver database at {}: {}", path.display(), reason);
                    }
                }
            }
        }

        (db, warnings)
    }

    /// Find the vendor entry matching a driver's provider string, respecting
    /// the `_network` key convention.
    pub fn find_entry(
        &self,
        provider: &str,
        category: DriverCategory,
    ) -> Option<(&str, &VendorVersion)> {
        let provider = provider.to_lowercase();
        let want_network = category == DriverCategory::Network;
        self.vendors
            .iter()
            .find(|(key, _)| {
                let is_network_key = key.ends_with("_network");
                if is_network_key != want_network {
                    return false;
                }
                let base = key.strip_suffix("_network").unwrap_or(key);
                provider_matches(&provider, base)
            })
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// Fill in `latest_version` and `status` on every driver the database
    /// knows about, then refresh the inventory's derived counters. Drivers
    /// from unknown vendors keep their `Unknown` status.
    pub fn annotate(&self, inventory: &mut DriverInventory) {
        for driver in &mut inventory.drivers {
            let Some((_, entry)) = self.find_entry(&driver.provider, driver.category) else {
                continue;
            };
            driver.latest_version = Some(entry.version.clone());
            driver.status = match compare_versions(&driver.version, &entry.version) {
                Ordering::Less => DriverStatus::UpdateAvailable,
                _ => DriverStatus::UpToDate,
            };
        }
        inventory.total = inventory.drivers.len();
        inventory.gpu_updates_available = inventory
            .drivers
            .iter()
            .filter(|d| {
                d.category == DriverCategory::Gpu && d.status == DriverStatus::UpdateAvailable
            })
            .count();
    }
}

fn provider_matches(provider_lc: &str, vendor: &str) -> bool {
    if provider_lc.contains(vendor) {
        return true;
    }
    // Common provider strings that do not contain the short vendor key.
    vendor == "amd" && provider_lc.contains("advanced micro")
}

fn default_db_path() -> Option<PathBuf> {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DB_FILENAME)));
    if let Some(path) = beside_exe {
        if path.exists() {
            return Some(path);
        }
    }
    let in_cwd = PathBuf::from(DB_FILENAME);
    in_cwd.exists().then_some(in_cwd)
}

fn read_external(path: &Path) -> Result<(BTreeMap<String, VendorVersion>, Vec<String>), String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let root: Value = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))?;
    let Value::Object(map) = root else {
        return Err(format!(
            "{}: expected an object of vendor entries",
            path.display()
        ));
    };

    let mut entries = BTreeMap::new();
    let mut warnings = Vec::new();
    for (vendor, value) in map {
        match parse_vendor(value) {
            Ok(entry) => {
                entries.insert(vendor.to_lowercase(), entry);
            }
            Err(reason) => {
                let message = format!("driver entry '{}' skipped: {}", vendor, reason);
                warn!("{}", message);
                warnings.push(message);
            }
        }
    }
    Ok((entries, warnings))
}

/// A vendor entry is either a bare version string or a full object.
fn parse_vendor(value: Value) -> Result<VendorVersion, String> {
    match value {
        Value::String(version) => Ok(VendorVersion {
            version,
            date: None,
            name: None,
        }),
        other => serde_json::from_value(other).map_err(|e| e.to_string()),
    }
}

/// Lenient dotted-numeric comparison. Each segment contributes its leading
/// digits ("23.Q4" reads as 23.0); missing segments count as zero. Strings
/// with no comparable content come back Equal so nothing gets flagged on
/// garbage input.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = numeric_segments(a);
    let right = numeric_segments(b);
    let len = left.len().max(right.len());
    for i in 0..len {
        let x = left.get(i).copied().unwrap_or(0);
        let y = right.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn numeric_segments(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|segment| {
            let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DriverRecord;
    use std::fs;
    use tempfile::TempDir;

    fn record(provider: &str, version: &str, category: DriverCategory) -> DriverRecord {
        DriverRecord {
            device: "dev".into(),
            provider: provider.into(),
            version: version.into(),
            date: None,
            category,
            signed: true,
            latest_version: None,
            status: DriverStatus::Unknown,
        }
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("546.01", "551.23"), Ordering::Less);
        assert_eq!(compare_versions("551.23", "551.23"), Ordering::Equal);
        assert_eq!(compare_versions("552.01", "551.23"), Ordering::Greater);
        // Missing trailing segments count as zero.
        assert_eq!(compare_versions("28.0", "28.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("31.0.101.5000", "31.0.101.5084"), Ordering::Less);
        // Non-numeric tail reads as zero.
        assert_eq!(compare_versions("23.Q4", "23.0"), Ordering::Equal);
        assert_eq!(compare_versions("garbage", "still garbage"), Ordering::Equal);
    }

    #[test]
    fn test_annotate_flags_stale_gpu_driver() {
        let db = VersionDb::builtin();
        let mut inventory = DriverInventory {
            total: 2,
            drivers: vec![
                record("NVIDIA", "546.01", DriverCategory::Gpu),
                record("Contoso Devices", "1.0", DriverCategory::Other),
            ],
            ..Default::default()
        };
        db.annotate(&mut inventory);

        let nvidia = &inventory.drivers[0];
        assert_eq!(nvidia.status, DriverStatus::UpdateAvailable);
        assert_eq!(nvidia.latest_version.as_deref(), Some("551.23"));
        assert_eq!(inventory.drivers[1].status, DriverStatus::Unknown);
        assert_eq!(inventory.gpu_updates_available, 1);
    }

    #[test]
    fn test_annotate_up_to_date() {
        let db = VersionDb::builtin();
        let mut inventory = DriverInventory {
            total: 1,
            drivers: vec![record("NVIDIA", "551.23", DriverCategory::Gpu)],
            ..Default::default()
        };
        db.annotate(&mut inventory);
        assert_eq!(inventory.drivers[0].status, DriverStatus::UpToDate);
        assert_eq!(inventory.gpu_updates_available, 0);
    }

    #[test]
    fn test_amd_alias_matches() {
        let db = VersionDb::builtin();
        let hit = db.find_entry("Advanced Micro Devices, Inc.", DriverCategory::Gpu);
        assert_eq!(hit.map(|(k, _)| k), Some("amd"));
    }

    #[test]
    fn test_network_category_uses_network_key() {
        let db = VersionDb::builtin();
        let hit = db.find_entry("Intel Corporation", DriverCategory::Network);
        assert_eq!(hit.map(|(k, _)| k), Some("intel_network"));

        // A Realtek NIC must not be compared against the audio line.
        assert!(db.find_entry("Realtek", DriverCategory::Network).is_none());
        let audio = db.find_entry("Realtek Semiconductor Corp.", DriverCategory::Audio);
        assert_eq!(audio.map(|(k, _)| k), Some("realtek"));
    }

    #[test]
    fn test_external_file_overrides_and_extends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drivers.json");
        fs::write(
            &path,
            r#"{
                "nvidia": {"version": "560.70", "name": "Game Ready Driver"},
                "contoso": "2.4.1"
            }"#,
        )
        .unwrap();

        let (db, warnings) = VersionDb::load(Some(&path));
        assert!(warnings.is_empty());
        assert_eq!(db.vendors["nvidia"].version, "560.70");
        assert_eq!(db.vendors["contoso"].version, "2.4.1");
        // Untouched bundled entries survive.
        assert_eq!(db.vendors["amd"].version, "24.1.1");
    }

    #[test]
    fn test_external_malformed_entry_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drivers.json");
        fs::write(&path, r#"{"nvidia": 12345, "amd": {"version": "25.1.1"}}"#).unwrap();

        let (db, warnings) = VersionDb::load(Some(&path));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("nvidia"));
        assert_eq!(db.vendors["nvidia"].version, "551.23");
        assert_eq!(db.vendors["amd"].version, "25.1.1");
    }

    #[test]
    fn test_explicit_missing_file_warns_and_keeps_builtin() {
        let (db, warnings) = VersionDb::load(Some(Path::new("/no/such/drivers.json")));
        assert_eq!(db.vendors.len(), VersionDb::builtin().vendors.len());
        assert_eq!(warnings.len(), 1);
    }
}
