//! Game launcher probe.
//!
//! Matches the process table against the launchers people actually install,
//! then checks default install paths for the ones that are not running.
//! A launcher found either way counts as installed.

use rigcheck_core::snapshot::{LauncherInfo, LauncherScan};
use rigcheck_core::{Collector, CollectorContext, DiagError, SectionData, SectionKind};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use sysinfo::System;

struct LauncherDef {
    name: &'static str,
    exe: &'static str,
    install_paths: &'static [&'static str],
}

const LAUNCHERS: &[LauncherDef] = &[
    LauncherDef {
        name: "Steam",
        exe: "steam.exe",
        install_paths: &[r"C:\Program Files (x86)\Steam\steam.exe"],
    },
    LauncherDef {
        name: "Epic Games Launcher",
        exe: "EpicGamesLauncher.exe",
        install_paths: &[
            r"C:\Program Files (x86)\Epic Games\Launcher\Portal\Binaries\Win64\EpicGamesLauncher.exe",
        ],
    },
    LauncherDef {
        name: "EA App",
        exe: "EADesktop.exe",
        install_paths: &[r"C:\Program Files\Electronic Arts\EA Desktop\EA Desktop\EADesktop.exe"],
    },
    LauncherDef {
        name: "Ubisoft Connect",
        exe: "UbisoftConnect.exe",
        install_paths: &[
            r"C:\Program Files (x86)\Ubisoft\Ubisoft Game Launcher\UbisoftConnect.exe",
        ],
    },
    LauncherDef {
        name: "Battle.net",
        exe: "Battle.net.exe",
        install_paths: &[r"C:\Program Files (x86)\Battle.net\Battle.net.exe"],
    },
    LauncherDef {
        // Store app, no stable filesystem location.
        name: "Xbox App",
        exe: "XboxApp.exe",
        install_paths: &[],
    },
    LauncherDef {
        name: "GOG Galaxy",
        exe: "GalaxyClient.exe",
        install_paths: &[r"C:\Program Files (x86)\GOG Galaxy\GalaxyClient.exe"],
    },
    LauncherDef {
        name: "Riot Client",
        exe: "RiotClientServices.exe",
        install_paths: &[r"C:\Riot Games\Riot Client\RiotClientServices.exe"],
    },
];

pub struct LauncherCollector;

impl Collector for LauncherCollector {
    fn name(&self) -> &'static str {
        "launchers"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::Launchers
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    fn collect(&self, _ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        let scan = scan_launchers(&running_process_names(), true);
        Ok(SectionData::Launchers(scan))
    }
}

fn running_process_names() -> HashSet<String> {
    let mut sys = System::new();
    sys.refresh_processes();
    sys.processes()
        .values()
        .map(|p| p.name().to_lowercase())
        .collect()
}

fn scan_launchers(process_names: &HashSet<String>, check_disk: bool) -> LauncherScan {
    let mut installed = Vec::new();
    for def in LAUNCHERS {
        let running = process_names.contains(&def.exe.to_lowercase());
        let on_disk = check_disk && def.install_paths.iter().any(|p| Path::new(p).exists());
        if running || on_disk {
            installed.push(LauncherInfo {
                name: def.name.to_string(),
                running,
                exe: Some(def.exe.to_string()),
            });
        }
    }

    let running_count = installed.iter().filter(|l| l.running).count();
    LauncherScan {
        installed_count: installed.len(),
        running_count,
        installed,
    }
}
