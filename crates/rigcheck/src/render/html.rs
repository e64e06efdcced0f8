//! Self-contained HTML report. One file, inline CSS, no external assets, so
//! it can be mailed or dropped in a support ticket as-is.

use rigcheck_core::report::RunReport;
use rigcheck_core::scoring::HealthLabel;
use rigcheck_core::snapshot::SectionState;

use super::{fmt_mbps, fmt_ms, fmt_secs, link_label, on_off};

const STYLE: &str = r#"
:root {
  --primary: #2563eb;
  --secondary: #3b82f6;
  --success: #10b981;
  --warning: #f59e0b;
  --error: #ef4444;
  --high: #f97316;
  --bg: #0f172a;
  --card: #1e293b;
  --text: #f8fafc;
  --muted: #94a3b8;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: 'Segoe UI', system-ui, sans-serif;
  line-height: 1.5;
}
.wrap { max-width: 960px; margin: 0 auto; padding: 24px; }
header { margin-bottom: 24px; }
header h1 { font-size: 26px; }
h2.section-title { font-size: 18px; margin: 24px 0 12px; }
.muted { color: var(--muted); }
.card {
  background: var(--card);
  border-radius: 12px;
  padding: 20px;
  margin-bottom: 16px;
}
.card h3 { font-size: 15px; margin-bottom: 10px; color: var(--secondary); }
.score-wrap { display: flex; align-items: center; gap: 28px; flex-wrap: wrap; }
.score-circle {
  position: relative;
  width: 140px;
  height: 140px;
  border-radius: 50%;
  background: conic-gradient(currentColor calc(var(--score) * 1%), #334155 0);
}
.score-inner {
  position: absolute;
  inset: 12px;
  background: var(--card);
  border-radius: 50%;
  display: flex;
  flex-direction: column;
  align-items: center;
  justify-content: center;
}
.score-inner strong { font-size: 38px; line-height: 1; }
.score-inner span { color: var(--muted); font-size: 13px; }
.score-label { font-size: 22px; text-transform: uppercase; letter-spacing: 1px; }
.issue {
  background: var(--card);
  border-left: 4px solid var(--muted);
  border-radius: 0 8px 8px 0;
  padding: 14px 18px;
  margin-bottom: 10px;
}
.issue.critical { border-left-color: var(--error); }
.issue.high { border-left-color: var(--high); }
.issue.medium { border-left-color: var(--warning); }
.issue.low { border-left-color: var(--muted); }
.issue p { margin-top: 6px; }
.issue .fix { color: var(--success); }
.tag {
  display: inline-block;
  font-size: 11px;
  font-weight: 700;
  text-transform: uppercase;
  padding: 2px 8px;
  border-radius: 4px;
  margin-right: 8px;
  color: var(--bg);
  background: var(--muted);
}
.tag.critical { background: var(--error); }
.tag.high { background: var(--high); }
.tag.medium { background: var(--warning); }
.tag.low { background: var(--muted); }
.grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(280px, 1fr));
  gap: 16px;
}
.grid .card { margin-bottom: 0; }
.row {
  display: flex;
  justify-content: space-between;
  gap: 12px;
  padding: 4px 0;
  border-bottom: 1px solid #334155;
  font-size: 14px;
}
.row:last-child { border-bottom: none; }
.row .k { color: var(--muted); white-space: nowrap; }
.row .v { text-align: right; }
.state-collected { color: var(--success); }
.state-unavailable { color: var(--warning); }
.state-skipped { color: var(--muted); }
footer {
  text-align: center;
  color: var(--muted);
  padding: 20px 0 8px;
  font-size: 13px;
}
"#;

pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>rigcheck report</title>\n");
    out.push_str(&format!("<style>{}</style>\n", STYLE));
    out.push_str("</head>\n<body>\n<div class=\"wrap\">\n");

    out.push_str("<header>\n<h1>rigcheck diagnostic report</h1>\n");
    let mode = if report.quick { ", quick mode" } else { "" };
    out.push_str(&format!(
        "<p class=\"muted\">Generated {} UTC, run {}, took {}{}</p>\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S"),
        report.run_id,
        fmt_secs(report.duration_ms),
        mode
    ));
    out.push_str("</header>\n");

    health_card(&mut out, report);
    findings(&mut out, report);
    system_grid(&mut out, report);
    scan_results(&mut out, report);
    coverage_card(&mut out, report);
    trend_card(&mut out, report);
    warnings_card(&mut out, report);

    out.push_str(&format!(
        "<footer>Generated by rigcheck v{}</footer>\n",
        env!("CARGO_PKG_VERSION")
    ));
    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn health_card(out: &mut String, report: &RunReport) {
    out.push_str("<div class=\"card score-wrap\">\n");
    out.push_str(&format!(
        "<div class=\"score-circle\" style=\"--score:{}; color:{};\">\
         <div class=\"score-inner\"><strong>{}</strong><span>/100</span></div></div>\n",
        report.health.value,
        score_color(report.health.label),
        report.health.value
    ));
    out.push_str("<div>\n");
    out.push_str(&format!(
        "<div class=\"score-label\" style=\"color:{}\">{}</div>\n",
        score_color(report.health.label),
        report.health.label
    ));
    if report.health.deductions.is_empty() {
        out.push_str("<p class=\"muted\">No deductions.</p>\n");
    } else {
        for (category, points) in &report.health.deductions {
            out.push_str(&format!(
                "<p class=\"muted\">{}: -{:.1}</p>\n",
                category, points
            ));
        }
    }
    out.push_str("</div>\n</div>\n");
}

fn findings(out: &mut String, report: &RunReport) {
    out.push_str(&format!(
        "<h2 class=\"section-title\">Findings ({})</h2>\n",
        report.issues.len()
    ));
    if report.issues.is_empty() {
        out.push_str("<div class=\"card\"><p>No issues found.</p></div>\n");
        return;
    }
    for issue in &report.issues {
        let class = issue.severity.as_str();
        out.push_str(&format!("<div class=\"issue {}\">\n", class));
        out.push_str(&format!(
            "<span class=\"tag {}\">{}</span><strong>{}</strong> \
             <span class=\"muted\">({}, confidence {}%)</span>\n",
            class,
            class,
            escape(&issue.title),
            issue.category,
            issue.confidence
        ));
        if !issue.description.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", escape(&issue.description)));
        }
        if !issue.recommendation.is_empty() {
            out.push_str(&format!(
                "<p class=\"fix\">Fix: {}</p>\n",
                escape(&issue.recommendation)
            ));
        }
        out.push_str("</div>\n");
    }
}

fn system_grid(out: &mut String, report: &RunReport) {
    out.push_str("<h2 class=\"section-title\">System</h2>\n<div class=\"grid\">\n");

    if let Some(hw) = report.snapshot.hardware.value() {
        out.push_str("<div class=\"card\">\n<h3>Hardware</h3>\n");
        if let Some(cpu) = &hw.cpu {
            row(out, "CPU", &cpu.name);
            row(
                out,
                "Cores",
                &format!("{}c/{}t", cpu.physical_cores, cpu.logical_cores),
            );
        }
        if let Some(mem) = &hw.memory {
            let mut value = format!("{:.1} GB", mem.total_gb);
            if let Some(kind) = &mem.kind {
                value.push_str(&format!(" {}", kind));
            }
            if let Some(speed) = mem.speed_mhz {
                value.push_str(&format!(" @ {} MHz", speed));
            }
            row(out, "Memory", &value);
        }
        for gpu in &hw.gpus {
            row(out, "GPU", &gpu.name);
            if let Some(version) = &gpu.driver_version {
                let mut value = version.clone();
                if let Some(age) = gpu.driver_age_days {
                    value.push_str(&format!(" ({} days old)", age));
                }
                row(out, "GPU driver", &value);
            }
        }
        for drive in &hw.storage {
            let label = if drive.is_system_drive {
                "System drive"
            } else {
                "Drive"
            };
            row(
                out,
                label,
                &format!(
                    "{} [{}] {:.1} GB, {:.1}% used",
                    drive.model,
                    drive.kind.as_str(),
                    drive.total_gb,
                    drive.usage_percent
                ),
            );
        }
        if let Some(board) = &hw.motherboard {
            row(out, "Board", &format!("{} {}", board.manufacturer, board.model));
        }
        out.push_str("</div>\n");
    }

    if let Some(os) = report.snapshot.windows.value() {
        out.push_str("<div class=\"card\">\n<h3>Windows</h3>\n");
        row(out, "Edition", &os.edition);
        row(out, "Build", &format!("{} ({})", os.build, os.architecture));
        if let Some(date) = &os.install_date {
            row(out, "Installed", date);
        }
        row(out, "Uptime", &format!("{:.1} h", os.uptime_hours));
        row(out, "Game Mode", on_off(os.game_mode_enabled));
        row(out, "GPU scheduling", on_off(os.hardware_gpu_scheduling));
        out.push_str("</div>\n");
    }

    if let Some(network) = report.snapshot.network.value() {
        out.push_str("<div class=\"card\">\n<h3>Network</h3>\n");
        if network.is_connected {
            row(
                out,
                "Status",
                &format!("connected ({})", link_label(network.connection_type)),
            );
            row(out, "Avg latency", &fmt_ms(network.avg_latency_ms));
            row(
                out,
                "Packet loss",
                &network
                    .packet_loss_percent
                    .map(|p| format!("{:.1}%", p))
                    .unwrap_or_else(|| "n/a".to_string()),
            );
            row(out, "DNS lookup", &fmt_ms(network.dns_latency_ms));
            for probe in &network.probes {
                row(
                    out,
                    &probe.label,
                    &format!("avg {:.1} ms, loss {:.1}%", probe.avg_ms, probe.loss_percent),
                );
            }
        } else {
            row(out, "Status", "not connected");
        }
        out.push_str("</div>\n");
    }

    if let Some(bench) = report.snapshot.benchmark.value() {
        out.push_str("<div class=\"card\">\n<h3>Benchmark</h3>\n");
        row(out, "Sequential read", &fmt_mbps(bench.sequential_read_mbps));
        row(out, "Sequential write", &fmt_mbps(bench.sequential_write_mbps));
        row(out, "CPU hash", &fmt_mbps(bench.cpu_hash_score));
        row(out, "Memory copy", &fmt_mbps(bench.memory_copy_mbps));
        row(out, "Payload", &format!("{} MB", bench.payload_mb));
        out.push_str("</div>\n");
    }

    out.push_str("</div>\n");
}

fn scan_results(out: &mut String, report: &RunReport) {
    let mut lines = Vec::new();
    if let Some(events) = report.snapshot.event_log.value() {
        lines.push(format!(
            "Event log, last {} days: {} critical, {} errors, {} app crashes, {} unexpected shutdowns",
            events.period_days,
            events.critical_errors,
            events.error_count,
            events.app_crashes,
            events.unexpected_shutdowns
        ));
    }
    if let Some(drivers) = report.snapshot.drivers.value() {
        lines.push(format!(
            "Drivers: {} total, {} unsigned, {} with problems, {} GPU updates available",
            drivers.total,
            drivers.unsigned_count,
            drivers.critical_count,
            drivers.gpu_updates_available
        ));
    }
    if let Some(launchers) = report.snapshot.launchers.value() {
        lines.push(format!(
            "Launchers: {} installed, {} running",
            launchers.installed_count, launchers.running_count
        ));
    }
    if let Some(prereqs) = report.snapshot.prerequisites.value() {
        let installed = prereqs.items.iter().filter(|i| i.installed).count();
        lines.push(format!(
            "Prerequisites: {} of {} installed, {} critical missing",
            installed,
            prereqs.items.len(),
            prereqs.missing_critical
        ));
    }
    if let Some(processes) = report.snapshot.processes.value() {
        lines.push(format!(
            "Processes: {} scanned, {} flagged",
            processes.total, processes.flagged_count
        ));
    }
    if lines.is_empty() {
        return;
    }
    out.push_str("<div class=\"card\">\n<h3>Scan results</h3>\n");
    for line in lines {
        out.push_str(&format!("<p>{}</p>\n", escape(&line)));
    }
    out.push_str("</div>\n");
}

fn coverage_card(out: &mut String, report: &RunReport) {
    out.push_str("<div class=\"card\">\n<h3>Scan coverage</h3>\n");
    for (name, state) in report.snapshot.section_states() {
        let (class, value) = match state {
            SectionState::Collected => ("state-collected", "collected".to_string()),
            SectionState::Unavailable { reason } => {
                ("state-unavailable", format!("unavailable: {}", reason))
            }
            SectionState::Skipped { reason } => ("state-skipped", format!("skipped: {}", reason)),
        };
        out.push_str(&format!(
            "<div class=\"row\"><span class=\"k\">{}</span>\
             <span class=\"v {}\">{}</span></div>\n",
            name,
            class,
            escape(&value)
        ));
    }
    out.push_str("</div>\n");
}

fn trend_card(out: &mut String, report: &RunReport) {
    let Some(trend) = &report.trend else {
        return;
    };
    out.push_str("<div class=\"card\">\n<h3>Trend</h3>\n");
    out.push_str(&format!(
        "<p>Score {}, was {} on {} ({:+})</p>\n",
        report.health.value,
        trend.previous_score,
        trend.previous_recorded_at.format("%Y-%m-%d"),
        trend.score_delta
    ));
    if !trend.new_issue_ids.is_empty() {
        out.push_str(&format!(
            "<p class=\"muted\">New: {}</p>\n",
            escape(&trend.new_issue_ids.join(", "))
        ));
    }
    if !trend.resolved_issue_ids.is_empty() {
        out.push_str(&format!(
            "<p class=\"muted\">Resolved: {}</p>\n",
            escape(&trend.resolved_issue_ids.join(", "))
        ));
    }
    out.push_str("</div>\n");
}

fn warnings_card(out: &mut String, report: &RunReport) {
    if report.warnings.is_empty() {
        return;
    }
    out.push_str("<div class=\"card\">\n<h3>Warnings</h3>\n");
    for warning in &report.warnings {
        out.push_str(&format!(
            "<p class=\"muted\">[{}] {}</p>\n",
            warning.stage,
            escape(&warning.message)
        ));
    }
    out.push_str("</div>\n");
}

fn row(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!(
        "<div class=\"row\"><span class=\"k\">{}</span><span class=\"v\">{}</span></div>\n",
        escape(key),
        escape(value)
    ));
}

fn score_color(label: HealthLabel) -> &'static str {
    match label {
        HealthLabel::Excellent => "var(--success)",
        HealthLabel::Good => "var(--secondary)",
        HealthLabel::Fair => "var(--warning)",
        HealthLabel::Poor => "var(--error)",
    }
}

pub(crate) fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
