//! Background process probe.
//!
//! Flags the background software that reliably costs frames: heavyweight
//! security suites, RGB and peripheral daemons, sync clients, overlays, and
//! chat apps. The table is deliberately short; anything on it has shown up
//! in enough "why is my game stuttering" threads to earn its place.

use rigcheck_core::snapshot::{FlaggedProcess, ProcessScan};
use rigcheck_core::{Collector, CollectorContext, DiagError, SectionData, SectionKind};
use std::collections::HashSet;
use std::time::Duration;
use sysinfo::System;

struct KnownHog {
    exe: &'static str,
    description: &'static str,
    impact: &'static str,
    /// Resource-heavy antivirus suites get their own counter; a missed
    /// real-time scanner hurts far more than a wallpaper animation.
    heavy_security: bool,
}

const KNOWN_HOGS: &[KnownHog] = &[
    // Security suites
    KnownHog { exe: "mcshield.exe", description: "McAfee real-time scanner", impact: "high", heavy_security: true },
    KnownHog { exe: "nortonsecurity.exe", description: "Norton 360", impact: "high", heavy_security: true },
    KnownHog { exe: "ns.exe", description: "Norton security engine", impact: "high", heavy_security: true },
    KnownHog { exe: "ccsvchst.exe", description: "Symantec service host", impact: "high", heavy_security: true },
    KnownHog { exe: "avp.exe", description: "Kaspersky antivirus", impact: "high", heavy_security: true },
    KnownHog { exe: "avastsvc.exe", description: "Avast background service", impact: "high", heavy_security: true },
    KnownHog { exe: "ekrn.exe", description: "ESET kernel service", impact: "high", heavy_security: true },
    // Peripheral and RGB suites
    KnownHog { exe: "icue.exe", description: "Corsair iCUE RGB suite", impact: "medium", heavy_security: false },
    KnownHog { exe: "lghub.exe", description: "Logitech G HUB", impact: "medium", heavy_security: false },
    KnownHog { exe: "armourycrate.exe", description: "ASUS Armoury Crate", impact: "medium", heavy_security: false },
    KnownHog { exe: "rzsynapse.exe", description: "Razer Synapse", impact: "medium", heavy_security: false },
    // Sync clients and indexing
    KnownHog { exe: "onedrive.exe", description: "OneDrive sync client", impact: "medium", heavy_security: false },
    KnownHog { exe: "dropbox.exe", description: "Dropbox sync client", impact: "medium", heavy_security: false },
    KnownHog { exe: "googledrivesync.exe", description: "Google Drive sync client", impact: "medium", heavy_security: false },
    KnownHog { exe: "searchindexer.exe", description: "Windows Search indexer", impact: "low", heavy_security: false },
    // Chat and meetings
    KnownHog { exe: "teams.exe", description: "Microsoft Teams", impact: "medium", heavy_security: false },
    KnownHog { exe: "slack.exe", description: "Slack", impact: "low", heavy_security: false },
    KnownHog { exe: "discord.exe", description: "Discord", impact: "low", heavy_security: false },
    // Capture, overlays, and eye candy
    KnownHog { exe: "obs64.exe", description: "OBS Studio capture", impact: "high", heavy_security: false },
    KnownHog { exe: "rtss.exe", description: "RivaTuner statistics overlay", impact: "low", heavy_security: false },
    KnownHog { exe: "msiafterburner.exe", description: "MSI Afterburner", impact: "low", heavy_security: false },
    KnownHog { exe: "wallpaper64.exe", description: "Wallpaper Engine", impact: "medium", heavy_security: false },
    // Browsers
    KnownHog { exe: "chrome.exe", description: "Chrome with open tabs", impact: "medium", heavy_security: false },
];

pub struct ProcessCollector;

impl Collector for ProcessCollector {
    fn name(&self) -> &'static str {
        "processes"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::Processes
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    fn collect(&self, _ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        let mut sys = System::new();
        sys.refresh_processes();
        let running: Vec<(u32, String)> = sys
            .processes()
            .iter()
            .map(|(pid, p)| (pid.as_u32(), p.name().to_string()))
            .collect();
        Ok(SectionData::Processes(flag_processes(&running)))
    }
}

/// Match the process list against the table. Multi-process apps (browsers,
/// Electron) are reported once, under the first PID seen.
fn flag_processes(running: &[(u32, String)]) -> ProcessScan {
    let mut flagged = Vec::new();
    let mut heavy_security_count = 0;
    let mut seen: HashSet<&'static str> = HashSet::new();

    for (pid, name) in running {
        let lower = name.to_lowercase();
        let Some(hog) = KNOWN_HOGS.iter().find(|h| h.exe == lower) else {
            continue;
        };
        if !seen.insert(hog.exe) {
            continue;
        }
        if hog.heavy_security {
            heavy_security_count += 1;
        }
        flagged.push(FlaggedProcess {
            name: name.clone(),
            pid: *pid,
            reason: hog.description.to_string(),
            impact: hog.impact.to_string(),
        });
    }

    ProcessScan {
        total: running.len(),
        flagged_count: flagged.len(),
        heavy_security_count,
        flagged,
    }
}
