//! rigcheck - Windows gaming PC diagnostics.

use clap::Parser;
use owo_colors::OwoColorize;
use rigcheck::cli::Cli;
use rigcheck::run;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let no_color = cli.no_color;
    if let Err(e) = run::execute(cli).await {
        let message = format!("{:#}", e);
        if no_color || !std::io::stderr().is_terminal() {
            eprintln!("[ERROR] {}", message);
        } else {
            eprintln!("[ERROR] {}", message.red());
        }
        std::process::exit(1);
    }
}

/// RUST_LOG wins when set; otherwise -v/-vv pick the level.
fn init_logging(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
