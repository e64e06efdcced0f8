//! The shipped diagnostic rule table.
//!
//! Thresholds target a mid-range gaming PC in 2024+: what makes games load
//! slowly, stutter, crash, or refuse to launch. External rule files can
//! override any entry by id.

use super::{Category, Comparison, Operator, Predicate, Rule, Severity};
use serde_json::{json, Value};

fn cmp(field: &str, op: Operator, value: Value) -> Predicate {
    Predicate::Compare(Comparison {
        field: field.into(),
        op,
        value,
    })
}

fn all(preds: Vec<Predicate>) -> Predicate {
    Predicate::All { all: preds }
}

#[allow(clippy::too_many_arguments)]
fn rule(
    id: &str,
    category: Category,
    severity: Severity,
    confidence: u8,
    title: &str,
    message: &str,
    recommendation: &str,
    when: Predicate,
) -> Rule {
    Rule {
        id: id.into(),
        category,
        severity,
        confidence,
        title: title.into(),
        message: message.into(),
        recommendation: recommendation.into(),
        when,
        enabled: true,
    }
}

/// All built-in rules, in declaration order.
pub fn builtin_rules() -> Vec<Rule> {
    use Category::*;
    use Operator::*;
    use Severity::*;

    vec![
        // ---- memory -------------------------------------------------------
        rule(
            "ram-critical",
            Hardware,
            Critical,
            100,
            "Critically low system memory",
            "Only {value} GB of RAM is installed. Modern games expect at least 16 GB and many will not run acceptably on less than 8.",
            "Upgrade to at least 16 GB (two modules for dual channel).",
            cmp("hardware.memory.total_gb", Lt, json!(8)),
        ),
        rule(
            "ram-low",
            Hardware,
            Medium,
            90,
            "System memory below the comfortable minimum",
            "{value} GB of RAM is enough to start most games but leaves no headroom for browsers, voice chat, and launchers.",
            "Consider upgrading to 16 GB or more.",
            all(vec![
                cmp("hardware.memory.total_gb", Ge, json!(8)),
                cmp("hardware.memory.total_gb", Lt, json!(16)),
            ]),
        ),
        rule(
            "ram-speed-low",
            Hardware,
            Medium,
            85,
            "RAM running below its class",
            "Memory is clocked at {value} MHz, which is low for a DDR4/DDR5 system and usually means the XMP/EXPO profile is off.",
            "Enable the XMP/EXPO profile in the BIOS to run the advertised speed.",
            all(vec![
                cmp("hardware.memory.speed_mhz", Lt, json!(2400)),
                cmp("hardware.memory.kind", In, json!(["DDR4", "DDR5"])),
            ]),
        ),
        // ---- storage ------------------------------------------------------
        rule(
            "system-drive-hdd",
            Performance,
            High,
            100,
            "Operating system on a mechanical drive",
            "The system drive is a mechanical hard disk. Boot, level loading, and texture streaming are dominated by it.",
            "Move Windows and your games to an SSD (NVMe preferred).",
            cmp("hardware.system_drive_kind", Equals, json!("hdd")),
        ),
        rule(
            "drive-nearly-full",
            Hardware,
            High,
            100,
            "Drive almost out of space",
            "A drive is {value}% full. Windows and games degrade badly past 90% usage.",
            "Free up space or add storage; keep at least 10% free on every drive games use.",
            cmp("hardware.storage.*.usage_percent", Gt, json!(90)),
        ),
        // ---- GPU drivers --------------------------------------------------
        rule(
            "gpu-driver-stale",
            Gaming,
            High,
            90,
            "GPU driver badly out of date",
            "The installed GPU driver is {value} days old. New releases routinely need current drivers for performance and stability.",
            "Update the GPU driver from the vendor's site or app.",
            cmp("hardware.gpus.*.driver_age_days", Gt, json!(180)),
        ),
        rule(
            "gpu-driver-update",
            Gaming,
            Medium,
            90,
            "Newer GPU driver available",
            "A newer GPU driver version is available for this system.",
            "Install the latest driver from the vendor's site or app.",
            cmp("drivers.gpu_updates_available", Gt, json!(0)),
        ),
        // ---- thermals -----------------------------------------------------
        rule(
            "cpu-overheating",
            Hardware,
            Critical,
            95,
            "CPU overheating",
            "CPU temperature is {value}\u{b0}C outside of game load. Throttling and shutdowns under load are likely.",
            "Check cooler mounting, fan operation, and dust filters; renew the thermal paste if the cooler is old.",
            cmp("hardware.cpu.temperature_c", Gt, json!(85)),
        ),
        rule(
            "cpu-running-hot",
            Hardware,
            Medium,
            85,
            "CPU running hot",
            "CPU temperature is {value}\u{b0}C, leaving little thermal headroom for sustained game load.",
            "Improve case airflow or upgrade the CPU cooler.",
            all(vec![
                cmp("hardware.cpu.temperature_c", Gt, json!(75)),
                cmp("hardware.cpu.temperature_c", Le, json!(85)),
            ]),
        ),
        // ---- gaming prerequisites and OS settings -------------------------
        rule(
            "prereq-missing",
            Gaming,
            High,
            100,
            "Required gaming runtime missing",
            "{value} critical runtime component(s) are missing (Visual C++ redistributables, DirectX). Games fail to launch without them.",
            "Install the missing runtimes listed in the prerequisites section.",
            cmp("prerequisites.missing_critical", Gt, json!(0)),
        ),
        rule(
            "game-mode-off",
            Config,
            Low,
            90,
            "Windows Game Mode is off",
            "Game Mode is disabled. It prioritizes the foreground game and defers background work.",
            "Enable it under Settings > Gaming > Game Mode.",
            cmp("windows.game_mode_enabled", Equals, json!(false)),
        ),
        // ---- background software ------------------------------------------
        rule(
            "bloatware-running",
            Performance,
            Medium,
            80,
            "Resource-heavy background software",
            "{value} known resource-heavy program(s) are running in the background.",
            "Close or uninstall the flagged programs before long gaming sessions.",
            cmp("processes.flagged_count", Gt, json!(0)),
        ),
        rule(
            "security-suite-heavy",
            Performance,
            High,
            80,
            "Heavy third-party security suite active",
            "A third-party security suite known for high scanning overhead is running.",
            "Consider the built-in Windows Security with exclusions for game folders instead.",
            cmp("processes.heavy_security_count", Gt, json!(0)),
        ),
        rule(
            "launcher-overload",
            Performance,
            Medium,
            90,
            "Too many launchers running",
            "{value} game launchers are running at once, each keeping background services and updaters alive.",
            "Close launchers you are not using and disable their autostart.",
            cmp("launchers.running_count", Gt, json!(3)),
        ),
        // ---- network ------------------------------------------------------
        rule(
            "network-disconnected",
            Network,
            High,
            100,
            "No network connectivity",
            "No working network connection was detected.",
            "Check the adapter, the cable or WiFi link, and the router.",
            cmp("network.is_connected", Equals, json!(false)),
        ),
        rule(
            "wifi-connection",
            Network,
            Low,
            85,
            "Gaming over WiFi",
            "The active connection is WiFi. Latency spikes and packet loss are far more common than on a cable.",
            "Use an Ethernet cable for online play where possible.",
            cmp("network.connection_type", Equals, json!("wifi")),
        ),
        rule(
            "network-latency-high",
            Network,
            Medium,
            85,
            "High latency to gaming services",
            "Average latency to common gaming endpoints is {value} ms.",
            "Prefer a wired connection, stop background uploads, or raise the route with your ISP.",
            cmp("network.avg_latency_ms", Gt, json!(100)),
        ),
        rule(
            "packet-loss",
            Network,
            High,
            90,
            "Packet loss detected",
            "Probes observed {value}% packet loss. Online games rubber-band at even 1%.",
            "Test the link and router; if loss persists on a cable, contact the ISP.",
            cmp("network.packet_loss_percent", Gt, json!(1)),
        ),
        rule(
            "dns-slow",
            Network,
            Low,
            80,
            "Slow DNS resolution",
            "DNS lookups take {value} ms, delaying every new connection a game or launcher opens.",
            "Switch the resolver to 1.1.1.1 or 8.8.8.8.",
            cmp("network.dns_latency_ms", Gt, json!(100)),
        ),
        // ---- disk throughput ---------------------------------------------
        rule(
            "disk-read-slow",
            Performance,
            Medium,
            100,
            "Slow sequential reads",
            "The benchmark read {value} MB/s sequentially. Texture streaming and load times suffer below 100 MB/s.",
            "Move games to a faster drive.",
            cmp("benchmark.sequential_read_mbps", Lt, json!(100)),
        ),
        rule(
            "disk-read-critical",
            Performance,
            High,
            100,
            "Critically slow sequential reads",
            "The benchmark read {value} MB/s sequentially, below the floor for acceptable game loading.",
            "Replace the drive with an SSD.",
            cmp("benchmark.sequential_read_mbps", Lt, json!(50)),
        ),
        rule(
            "disk-write-slow",
            Performance,
            Medium,
            100,
            "Slow sequential writes",
            "The benchmark wrote {value} MB/s sequentially. Installs, updates, and shader caching will be slow.",
            "Move the system or game drive to an SSD.",
            cmp("benchmark.sequential_write_mbps", Lt, json!(100)),
        ),
        rule(
            "disk-write-critical",
            Performance,
            High,
            100,
            "Critically slow sequential writes",
            "The benchmark wrote {value} MB/s sequentially, slow enough to stall game installs and updates.",
            "Replace the drive with an SSD.",
            cmp("benchmark.sequential_write_mbps", Lt, json!(50)),
        ),
        // ---- driver health ------------------------------------------------
        rule(
            "driver-unsigned",
            Security,
            Critical,
            95,
            "Unsigned drivers installed",
            "{value} installed driver(s) are unsigned. Anti-cheat systems refuse to start with them and they are a stability risk.",
            "Identify the unsigned drivers and replace them with vendor-signed versions.",
            cmp("drivers.unsigned_count", Gt, json!(0)),
        ),
        rule(
            "driver-problems",
            Stability,
            Critical,
            95,
            "Drivers reporting problems",
            "{value} driver(s) are in an error state.",
            "Open Device Manager and resolve the flagged devices.",
            cmp("drivers.critical_count", Gt, json!(0)),
        ),
        // ---- event log ----------------------------------------------------
        rule(
            "system-crashes",
            Stability,
            High,
            85,
            "Recent critical system errors",
            "{value} critical system event(s) were logged in the last 7 days.",
            "Review the System event log; check temperatures, RAM stability, and drivers.",
            cmp("event_log.critical_errors", Gt, json!(0)),
        ),
        rule(
            "app-crashes",
            Stability,
            Medium,
            80,
            "Recent application crashes",
            "{value} application crash(es) were logged in the last 7 days.",
            "Update or reinstall the crashing applications; a GPU driver update often helps.",
            cmp("event_log.app_crashes", Gt, json!(0)),
        ),
        rule(
            "unexpected-shutdowns",
            Stability,
            High,
            90,
            "Unexpected shutdowns recorded",
            "The machine lost power or hard-reset {value} time(s) in the last 7 days.",
            "Check the power supply, temperatures, and any overclocks.",
            cmp("event_log.unexpected_shutdowns", Gt, json!(0)),
        ),
    ]
}
