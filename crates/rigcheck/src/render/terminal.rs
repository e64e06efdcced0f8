//! Console summary: bracketed ASCII tags, color when the terminal wants it.

use owo_colors::OwoColorize;
use rigcheck_core::report::RunReport;
use rigcheck_core::rules::Severity;
use rigcheck_core::scoring::HealthLabel;
use rigcheck_core::snapshot::SectionState;

use super::fmt_secs;

/// Build the end-of-run console summary as one string.
pub fn render(report: &RunReport, color: bool) -> String {
    let mut out = String::new();

    let mode = if report.quick { " (quick scan)" } else { "" };
    out.push_str(&format!(
        "[RIGCHECK] diagnostic finished in {}{}\n\n",
        fmt_secs(report.duration_ms),
        mode
    ));

    let health = format!(
        "{}/100 ({})",
        report.health.value,
        report.health.label.as_str().to_uppercase()
    );
    out.push_str(&format!(
        "[HEALTH] {}\n",
        paint_health(&health, report.health.label, color)
    ));
    for (category, points) in &report.health.deductions {
        out.push_str(&format!("  {}: -{:.1}\n", category, points));
    }
    out.push('\n');

    if report.issues.is_empty() {
        out.push_str(&format!("[ISSUES] {}\n", ok("none found", color)));
    } else {
        out.push_str(&format!("[ISSUES] {} finding(s)\n", report.issues.len()));
        for (i, issue) in report.issues.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} {}\n",
                i + 1,
                severity_tag(issue.severity, color),
                issue.title
            ));
            if !issue.recommendation.is_empty() {
                let fix = format!("-> {}", issue.recommendation);
                let fix = if color { fix.cyan().to_string() } else { fix };
                out.push_str(&format!("     {}\n", fix));
            }
        }
    }
    out.push('\n');

    let states = report.snapshot.section_states();
    out.push_str(&format!(
        "[SECTIONS] {}/{} collected\n",
        report.snapshot.collected_section_count(),
        states.len()
    ));
    for (name, state) in &states {
        let line = match state {
            SectionState::Collected => continue,
            SectionState::Unavailable { reason } => {
                format!("  * {}: unavailable ({})", name, reason)
            }
            SectionState::Skipped { reason } => format!("  * {}: skipped ({})", name, reason),
        };
        let line = if color { line.yellow().to_string() } else { line };
        out.push_str(&format!("{}\n", line));
    }

    if let Some(trend) = &report.trend {
        out.push('\n');
        out.push_str(&format!(
            "[TREND] {:+} since {} (was {})\n",
            trend.score_delta,
            trend.previous_recorded_at.format("%Y-%m-%d"),
            trend.previous_score
        ));
        if !trend.new_issue_ids.is_empty() {
            out.push_str(&format!("  new: {}\n", trend.new_issue_ids.join(", ")));
        }
        if !trend.resolved_issue_ids.is_empty() {
            out.push_str(&format!(
                "  resolved: {}\n",
                trend.resolved_issue_ids.join(", ")
            ));
        }
    }

    if !report.warnings.is_empty() {
        out.push('\n');
        out.push_str("[WARNINGS]\n");
        for warning in &report.warnings {
            let line = format!("  * [{}] {}", warning.stage, warning.message);
            let line = if color { line.yellow().to_string() } else { line };
            out.push_str(&format!("{}\n", line));
        }
    }

    out
}

fn paint_health(text: &str, label: HealthLabel, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match label {
        HealthLabel::Excellent => text.bright_green().to_string(),
        HealthLabel::Good => text.green().to_string(),
        HealthLabel::Fair => text.yellow().to_string(),
        HealthLabel::Poor => text.bright_red().to_string(),
    }
}

fn severity_tag(severity: Severity, color: bool) -> String {
    let tag = format!("[{}]", severity.as_str().to_uppercase());
    if !color {
        return tag;
    }
    match severity {
        Severity::Critical => tag.bright_red().to_string(),
        Severity::High => tag.red().to_string(),
        Severity::Medium => tag.yellow().to_string(),
        Severity::Low => tag.white().to_string(),
    }
}

fn ok(text: &str, color: bool) -> String {
    if color {
        text.green().to_string()
    } else {
        text.to_string()
    }
}
