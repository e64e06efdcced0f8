//! Plain-text report file, the default output format.
//!
//! Mirrors the console summary but carries the full system inventory, so the
//! file stands on its own when shared for support.

use rigcheck_core::report::RunReport;
use rigcheck_core::snapshot::{
    BenchmarkReport, DriverInventory, EventLogSummary, HardwareInfo, LauncherScan, NetworkReport,
    OsInfo, PrereqReport, ProcessScan, SectionState, Snapshot,
};

use super::{fmt_mbps, fmt_ms, fmt_secs, link_label, on_off};

const WIDE: &str =
    "================================================================";
const THIN: &str =
    "----------------------------------------------------------------";

pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", WIDE));
    out.push_str("                  RIGCHECK DIAGNOSTIC REPORT\n");
    out.push_str(&format!("{}\n", WIDE));
    out.push_str(&format!(
        "Generated: {} UTC\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    let mode = if report.quick { " (quick mode)" } else { "" };
    out.push_str(&format!("Run id:    {}{}\n", report.run_id, mode));
    out.push_str(&format!("Duration:  {}\n", fmt_secs(report.duration_ms)));

    heading(&mut out, "HEALTH");
    out.push_str(&format!(
        "Score: {}/100 ({})\n",
        report.health.value, report.health.label
    ));
    if !report.health.deductions.is_empty() {
        out.push_str("Deductions:\n");
        for (category, points) in &report.health.deductions {
            out.push_str(&format!("  {}: -{:.1}\n", category, points));
        }
    }

    heading(&mut out, &format!("ISSUES ({})", report.issues.len()));
    if report.issues.is_empty() {
        out.push_str("No issues found.\n");
    }
    for (i, issue) in report.issues.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {}  ({}, confidence {}%)\n",
            i + 1,
            issue.severity.as_str().to_uppercase(),
            issue.title,
            issue.category,
            issue.confidence
        ));
        if !issue.description.is_empty() {
            out.push_str(&format!("   {}\n", issue.description));
        }
        for evidence in &issue.evidence {
            out.push_str(&format!(
                "   evidence: {} = {}\n",
                evidence.field, evidence.value
            ));
        }
        if !issue.recommendation.is_empty() {
            out.push_str(&format!("   fix: {}\n", issue.recommendation));
        }
    }

    heading(&mut out, "SYSTEM");
    if let Some(hw) = report.snapshot.hardware.value() {
        hardware_block(&mut out, hw);
    }
    if let Some(os) = report.snapshot.windows.value() {
        windows_block(&mut out, os);
    }
    if let Some(events) = report.snapshot.event_log.value() {
        event_log_block(&mut out, events);
    }
    if let Some(drivers) = report.snapshot.drivers.value() {
        drivers_block(&mut out, drivers);
    }
    if let Some(launchers) = report.snapshot.launchers.value() {
        launchers_block(&mut out, launchers);
    }
    if let Some(network) = report.snapshot.network.value() {
        network_block(&mut out, network);
    }
    if let Some(bench) = report.snapshot.benchmark.value() {
        benchmark_block(&mut out, bench);
    }
    if let Some(prereqs) = report.snapshot.prerequisites.value() {
        prereq_block(&mut out, prereqs);
    }
    if let Some(processes) = report.snapshot.processes.value() {
        processes_block(&mut out, processes);
    }
    missing_sections(&mut out, &report.snapshot);

    if let Some(trend) = &report.trend {
        heading(&mut out, "TREND");
        out.push_str(&format!(
            "Score {} (was {} on {}, {:+})\n",
            report.health.value,
            trend.previous_score,
            trend.previous_recorded_at.format("%Y-%m-%d"),
            trend.score_delta
        ));
        if !trend.new_issue_ids.is_empty() {
            out.push_str(&format!("New issues: {}\n", trend.new_issue_ids.join(", ")));
        }
        if !trend.resolved_issue_ids.is_empty() {
            out.push_str(&format!(
                "Resolved: {}\n",
                trend.resolved_issue_ids.join(", ")
            ));
        }
    }

    if !report.warnings.is_empty() {
        heading(&mut out, "WARNINGS");
        for warning in &report.warnings {
            out.push_str(&format!("- [{}] {}\n", warning.stage, warning.message));
        }
    }

    out.push_str(&format!("\n{}\n", WIDE));
    out.push_str(&format!(
        "Generated by rigcheck v{}\n",
        env!("CARGO_PKG_VERSION")
    ));
    out
}

fn heading(out: &mut String, title: &str) {
    out.push_str(&format!("\n{}\n{}\n{}\n", THIN, title, THIN));
}

fn hardware_block(out: &mut String, hw: &HardwareInfo) {
    out.push_str("Hardware\n");
    if let Some(cpu) = &hw.cpu {
        let mut line = format!(
            "  CPU:    {} ({}c/{}t)",
            cpu.name, cpu.physical_cores, cpu.logical_cores
        );
        if let Some(load) = cpu.load_percent {
            line.push_str(&format!(", load {:.0}%", load));
        }
        if let Some(temp) = cpu.temperature_c {
            line.push_str(&format!(", {:.0} C", temp));
        }
        out.push_str(&format!("{}\n", line));
    }
    if let Some(mem) = &hw.memory {
        let mut line = format!(
            "  Memory: {:.1} GB total, {:.1} GB available",
            mem.total_gb, mem.available_gb
        );
        match (&mem.kind, mem.speed_mhz) {
            (Some(kind), Some(speed)) => line.push_str(&format!(" ({}, {} MHz)", kind, speed)),
            (Some(kind), None) => line.push_str(&format!(" ({})", kind)),
            (None, Some(speed)) => line.push_str(&format!(" ({} MHz)", speed)),
            (None, None) => {}
        }
        out.push_str(&format!("{}\n", line));
    }
    for gpu in &hw.gpus {
        let mut line = format!("  GPU:    {}", gpu.name);
        if let Some(vram) = gpu.vram_mb {
            line.push_str(&format!(" ({} MB)", vram));
        }
        if let Some(version) = &gpu.driver_version {
            line.push_str(&format!(", driver {}", version));
        }
        if let Some(age) = gpu.driver_age_days {
            line.push_str(&format!(" ({} days old)", age));
        }
        out.push_str(&format!("{}\n", line));
    }
    for drive in &hw.storage {
        let system = if drive.is_system_drive { ", system" } else { "" };
        out.push_str(&format!(
            "  Drive:  {} [{}] {:.1} GB, {:.1}% used{}\n",
            drive.model,
            drive.kind.as_str(),
            drive.total_gb,
            drive.usage_percent,
            system
        ));
    }
    if let Some(board) = &hw.motherboard {
        out.push_str(&format!(
            "  Board:  {} {}, BIOS {}\n",
            board.manufacturer, board.model, board.bios_version
        ));
    }
    out.push('\n');
}

fn windows_block(out: &mut String, os: &OsInfo) {
    out.push_str("Windows\n");
    out.push_str(&format!(
        "  {} build {} ({})\n",
        os.edition, os.build, os.architecture
    ));
    if let Some(date) = &os.install_date {
        out.push_str(&format!("  Installed: {}\n", date));
    }
    if let Some(activation) = &os.activation {
        out.push_str(&format!("  Activation: {}\n", activation));
    }
    out.push_str(&format!("  Uptime: {:.1} h\n", os.uptime_hours));
    out.push_str(&format!(
        "  Game Mode: {}, HW GPU scheduling: {}\n",
        on_off(os.game_mode_enabled),
        on_off(os.hardware_gpu_scheduling)
    ));
    if !os.hostname.is_empty() {
        out.push_str(&format!("  Host: {}\n", os.hostname));
    }
    out.push('\n');
}

fn event_log_block(out: &mut String, events: &EventLogSummary) {
    out.push_str(&format!("Event log ({} days)\n", events.period_days));
    out.push_str(&format!(
        "  {} events: {} critical, {} errors, {} warnings\n",
        events.total_events, events.critical_errors, events.error_count, events.warning_count
    ));
    out.push_str(&format!(
        "  App crashes: {}, unexpected shutdowns: {}\n\n",
        events.app_crashes, events.unexpected_shutdowns
    ));
}

fn drivers_block(out: &mut String, drivers: &DriverInventory) {
    out.push_str("Drivers\n");
    out.push_str(&format!(
        "  {} drivers, {} unsigned, {} with problems\n",
        drivers.total, drivers.unsigned_count, drivers.critical_count
    ));
    if drivers.gpu_updates_available > 0 {
        out.push_str(&format!(
            "  GPU updates available: {}\n",
            drivers.gpu_updates_available
        ));
    }
    out.push('\n');
}

fn launchers_block(out: &mut String, launchers: &LauncherScan) {
    let running: Vec<&str> = launchers
        .installed
        .iter()
        .filter(|l| l.running)
        .map(|l| l.name.as_str())
        .collect();
    out.push_str("Launchers\n");
    if running.is_empty() {
        out.push_str(&format!(
            "  {} installed, none running\n\n",
            launchers.installed_count
        ));
    } else {
        out.push_str(&format!(
            "  {} installed, {} running ({})\n\n",
            launchers.installed_count,
            launchers.running_count,
            running.join(", ")
        ));
    }
}

fn network_block(out: &mut String, network: &NetworkReport) {
    out.push_str("Network\n");
    if !network.is_connected {
        out.push_str("  Not connected\n\n");
        return;
    }
    out.push_str(&format!(
        "  Connected ({}), avg latency {}, loss {}, DNS {}\n",
        link_label(network.connection_type),
        fmt_ms(network.avg_latency_ms),
        network
            .packet_loss_percent
            .map(|p| format!("{:.1}%", p))
            .unwrap_or_else(|| "n/a".to_string()),
        fmt_ms(network.dns_latency_ms)
    ));
    for probe in &network.probes {
        out.push_str(&format!(
            "  - {} ({}): avg {:.1} ms, loss {:.1}%\n",
            probe.label, probe.target, probe.avg_ms, probe.loss_percent
        ));
    }
    out.push('\n');
}

fn benchmark_block(out: &mut String, bench: &BenchmarkReport) {
    out.push_str("Benchmark\n");
    out.push_str(&format!(
        "  Read {}, write {}\n",
        fmt_mbps(bench.sequential_read_mbps),
        fmt_mbps(bench.sequential_write_mbps)
    ));
    out.push_str(&format!(
        "  CPU hash {}, memory copy {}\n",
        fmt_mbps(bench.cpu_hash_score),
        fmt_mbps(bench.memory_copy_mbps)
    ));
    out.push_str(&format!(
        "  ({} MB payload, {})\n\n",
        bench.payload_mb,
        fmt_secs(bench.duration_ms)
    ));
}

fn prereq_block(out: &mut String, prereqs: &PrereqReport) {
    out.push_str("Prerequisites\n");
    for item in &prereqs.items {
        let tag = if item.installed {
            "[ok]     "
        } else if item.critical {
            "[MISSING]"
        } else {
            "[missing]"
        };
        let mut line = format!("  {} {}", tag, item.name);
        if let Some(detail) = &item.detail {
            line.push_str(&format!(" - {}", detail));
        }
        out.push_str(&format!("{}\n", line));
    }
    out.push('\n');
}

fn processes_block(out: &mut String, processes: &ProcessScan) {
    out.push_str("Processes\n");
    out.push_str(&format!(
        "  {} scanned, {} flagged\n",
        processes.total, processes.flagged_count
    ));
    for proc in &processes.flagged {
        out.push_str(&format!(
            "  - {} (pid {}): {} [{}]\n",
            proc.name, proc.pid, proc.reason, proc.impact
        ));
    }
    out.push('\n');
}

fn missing_sections(out: &mut String, snapshot: &Snapshot) {
    let mut lines = Vec::new();
    for (name, state) in snapshot.section_states() {
        match state {
            SectionState::Collected => {}
            SectionState::Unavailable { reason } => {
                lines.push(format!("  - {}: unavailable ({})", name, reason));
            }
            SectionState::Skipped { reason } => {
                lines.push(format!("  - {}: skipped ({})", name, reason));
            }
        }
    }
    if !lines.is_empty() {
        out.push_str("Sections without data:\n");
        for line in lines {
            out.push_str(&format!("{}\n", line));
        }
    }
}
