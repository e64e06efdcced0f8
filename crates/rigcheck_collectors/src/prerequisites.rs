//! Gaming prerequisite probe.
//!
//! Checks for the runtimes games refuse to start without: the Visual C++
//! 2015-2022 redistributables, the DirectX runtime, and .NET Framework 4.8.
//! Everything is read from the registry or the filesystem; nothing is
//! installed or repaired here.

use crate::probe;
use rigcheck_core::snapshot::{PrereqItem, PrereqReport};
use rigcheck_core::{Collector, CollectorContext, DiagError, SectionData, SectionKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

const VCREDIST_X64_KEY: &str = r"HKLM\SOFTWARE\Microsoft\VisualStudio\14.0\VC\Runtimes\x64";
const VCREDIST_X86_KEY: &str =
    r"HKLM\SOFTWARE\WOW6432Node\Microsoft\VisualStudio\14.0\VC\Runtimes\x86";
const DOTNET_KEY: &str = r"HKLM\SOFTWARE\Microsoft\NET Framework Setup\NDP\v4\Full";

const DOTNET_48_RELEASE: u64 = 528040;

pub struct PrereqCollector;

impl Collector for PrereqCollector {
    fn name(&self) -> &'static str {
        "prerequisites"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::Prerequisites
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    fn collect(&self, _ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        // Off Windows a failed registry read would look identical to a
        // missing runtime, so refuse instead of reporting everything absent.
        if !cfg!(windows) {
            return Err(DiagError::collector(
                self.name(),
                "prerequisite checks require Windows",
            ));
        }

        let items = vec![
            check_vcredist("Visual C++ 2015-2022 Redistributable (x64)", VCREDIST_X64_KEY, true),
            check_vcredist("Visual C++ 2015-2022 Redistributable (x86)", VCREDIST_X86_KEY, false),
            check_directx(),
            check_dotnet(),
        ];
        Ok(SectionData::Prerequisites(build_report(items)))
    }
}

fn build_report(items: Vec<PrereqItem>) -> PrereqReport {
    let missing_critical = items.iter().filter(|i| i.critical && !i.installed).count();
    PrereqReport {
        items,
        missing_critical,
    }
}

fn check_vcredist(name: &str, key: &str, critical: bool) -> PrereqItem {
    let version = probe::reg_query(key, "Version").and_then(|out| probe::parse_reg_value(&out));
    PrereqItem {
        name: name.to_string(),
        installed: version.is_some(),
        critical,
        detail: version,
    }
}

fn check_directx() -> PrereqItem {
    let system32 = PathBuf::from(
        std::env::var("SystemRoot").unwrap_or_else(|_| r"C:\Windows".to_string()),
    )
    .join("System32");
    let level = directx_level(&system32);

    PrereqItem {
        name: "DirectX Runtime".to_string(),
        installed: level.is_some(),
        critical: true,
        detail: level.map(str::to_string),
    }
}

/// Highest runtime generation present, judged by which system DLLs exist.
fn directx_level(system32: &Path) -> Option<&'static str> {
    if system32.join("d3d12.dll").exists() {
        return Some("DirectX 12");
    }
    if system32.join("d3d11.dll").exists() && system32.join("dxgi.dll").exists() {
        return Some("DirectX 11");
    }
    None
}

fn check_dotnet() -> PrereqItem {
    let release =
        probe::reg_query(DOTNET_KEY, "Release").and_then(|out| probe::parse_reg_dword(&out));
    let (installed, detail) = match release {
        Some(r) => (
            r >= DOTNET_48_RELEASE,
            Some(format!(".NET Framework {}", dotnet_version_name(r))),
        ),
        None => (false, None),
    };

    PrereqItem {
        name: ".NET Framework 4.8".to_string(),
        installed,
        critical: false,
        detail,
    }
}

/// Map the NDP Release counter to the marketing version.
fn dotnet_version_name(release: u64) -> &'static str {
    match release {
        533320.. => "4.8.1",
        528040.. => "4.8",
        461808.. => "4.7.2",
        _ => "4.7 or older",
    }
}
