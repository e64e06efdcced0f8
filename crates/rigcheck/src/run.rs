//! One invocation end to end: configuration, collectors, the run itself,
//! terminal output, and the report file.

use crate::cli::Cli;
use crate::render::{html, terminal, text};
use anyhow::{Context, Result};
use chrono::Local;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use rigcheck_core::{DiagConfig, Orchestrator, RunReport};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub async fn execute(cli: Cli) -> Result<()> {
    let color = use_color(&cli);
    let config = build_config(&cli);
    let collectors = rigcheck_collectors::default_collectors();
    let orchestrator = Orchestrator::with_collectors(config, collectors);

    // Ctrl-C trips the shared token; the run winds down on its own and
    // comes back as a fatal error.
    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let spinner = progress_spinner(color);
    let result = orchestrator.run().await;
    spinner.finish_and_clear();
    let report = result.context("diagnostic run failed")?;

    println!("{}", terminal::render(&report, color));
    save_report(&cli, &report, color);
    Ok(())
}

/// File config overlaid with command-line flags.
pub fn build_config(cli: &Cli) -> DiagConfig {
    let mut config = DiagConfig::load(cli.config.as_deref());
    if cli.quick {
        config.run.quick = true;
    }
    if let Some(rules) = &cli.rules {
        config.paths.rules_file = Some(rules.clone());
    }
    if let Some(db) = &cli.drivers_db {
        config.paths.drivers_db = Some(db.clone());
    }
    if let Some(dir) = &cli.history_dir {
        config.paths.history_dir = Some(dir.clone());
    }
    config
}

/// Desktop when there is one, the working directory otherwise.
pub fn default_report_path() -> PathBuf {
    let name = format!(
        "rigcheck_report_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    dirs::desktop_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

fn save_report(cli: &Cli, report: &RunReport, color: bool) {
    let destination = cli.output.clone().unwrap_or_else(default_report_path);
    let html_wanted = destination
        .extension()
        .map(|e| e.eq_ignore_ascii_case("html"))
        .unwrap_or(false);
    let body = if html_wanted {
        html::render(report)
    } else {
        text::render(report)
    };

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match std::fs::write(&destination, body) {
        Ok(()) => {
            let message = format!("Report saved to {}", destination.display());
            if color {
                println!("[OK] {}", message.green());
            } else {
                println!("[OK] {}", message);
            }
        }
        Err(e) => {
            // The terminal summary already went out; a missing file is not
            // worth a failing exit code.
            warn!("report not written to {}: {}", destination.display(), e);
            let message = format!("report not written to {}: {}", destination.display(), e);
            if color {
                println!("[WARNING] {}", message.yellow());
            } else {
                println!("[WARNING] {}", message);
            }
        }
    }
}

fn use_color(cli: &Cli) -> bool {
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("TERM").map(|term| term == "dumb").unwrap_or(false) {
        return false;
    }
    Term::stdout().is_term()
}

fn progress_spinner(color: bool) -> ProgressBar {
    if !Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if color {
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
    } else {
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["-", "\\", "|", "/"])
                .template("{spinner} {msg}")
                .unwrap(),
        );
    }
    spinner.set_message("collecting system data...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
