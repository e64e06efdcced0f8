//! Operating system probe.
//!
//! Basics come from sysinfo. On Windows the registry fills in the parts
//! gamers actually ask about: the real edition and build, Game Mode, and
//! hardware-accelerated GPU scheduling.

use crate::probe;
use chrono::DateTime;
use rigcheck_core::snapshot::OsInfo;
use rigcheck_core::{Collector, CollectorContext, DiagError, SectionData, SectionKind};
use std::time::Duration;
use sysinfo::System;

const CURRENT_VERSION_KEY: &str = r"HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion";
const GAME_BAR_KEY: &str = r"HKCU\Software\Microsoft\GameBar";
const GRAPHICS_DRIVERS_KEY: &str = r"HKLM\SYSTEM\CurrentControlSet\Control\GraphicsDrivers";

pub struct SystemCollector;

impl Collector for SystemCollector {
    fn name(&self) -> &'static str {
        "system"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::Windows
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    fn sensitive_paths(&self) -> &'static [&'static str] {
        &["windows.hostname"]
    }

    fn collect(&self, _ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        let mut info = OsInfo {
            edition: System::name().unwrap_or_else(|| "unknown".to_string()),
            version: System::os_version().unwrap_or_default(),
            build: System::kernel_version().unwrap_or_default(),
            architecture: std::env::consts::ARCH.to_string(),
            uptime_hours: round1(System::uptime() as f64 / 3600.0),
            hostname: System::host_name().unwrap_or_default(),
            ..Default::default()
        };
        apply_registry_details(&mut info);
        Ok(SectionData::Windows(info))
    }
}

fn apply_registry_details(info: &mut OsInfo) {
    let build = probe::reg_query(CURRENT_VERSION_KEY, "CurrentBuildNumber")
        .and_then(|out| probe::parse_reg_value(&out))
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(b) = build {
        info.build = b.to_string();
    }

    if let Some(product) = probe::reg_query(CURRENT_VERSION_KEY, "ProductName")
        .and_then(|out| probe::parse_reg_value(&out))
    {
        info.edition = effective_edition(&product, build);
    }

    if let Some(display) = probe::reg_query(CURRENT_VERSION_KEY, "DisplayVersion")
        .and_then(|out| probe::parse_reg_value(&out))
    {
        info.version = display;
    }

    if let Some(secs) = probe::reg_query(CURRENT_VERSION_KEY, "InstallDate")
        .and_then(|out| probe::parse_reg_dword(&out))
    {
        info.install_date =
            DateTime::from_timestamp(secs as i64, 0).map(|dt| dt.format("%Y-%m-%d").to_string());
    }

    info.game_mode_enabled = game_mode_enabled();
    info.hardware_gpu_scheduling = probe::reg_query(GRAPHICS_DRIVERS_KEY, "HwSchMode")
        .and_then(|out| probe::parse_reg_dword(&out))
        .map(|mode| mode == 2);
}

/// ProductName still reads "Windows 10 ..." on Windows 11; the build number
/// disambiguates, with 22000 as the first 11 build.
fn effective_edition(product_name: &str, build: Option<u64>) -> String {
    match build {
        Some(b) if b >= 22000 => product_name.replacen("Windows 10", "Windows 11", 1),
        _ => product_name.to_string(),
    }
}

/// Newer builds expose AutoGameModeEnabled; older ones AllowAutoGameMode.
fn game_mode_enabled() -> Option<bool> {
    for value in ["AutoGameModeEnabled", "AllowAutoGameMode"] {
        if let Some(v) =
            probe::reg_query(GAME_BAR_KEY, value).and_then(|out| probe::parse_reg_dword(&out))
        {
            return Some(v != 0);
        }
    }
    None
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_edition_swaps_on_11_builds() {
        assert_eq!(
            effective_edition("Windows 10 Pro", Some(22631)),
            "Windows 11 Pro"
        );
        assert_eq!(
            effective_edition("Windows 10 Home", Some(19045)),
            "Windows 10 Home"
        );
        assert_eq!(effective_edition("Windows 10 Pro", None), "Windows 10 Pro");
        // Editions that already carry the right name pass through.
        assert_eq!(
            effective_edition("Windows 11 Pro", Some(26100)),
            "Windows 11 Pro"
        );
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(1.2345), 1.2);
        assert_eq!(round1(47.96), 48.0);
        assert_eq!(round1(0.0), 0.0);
    }
}
