//! Command line definition.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rigcheck")]
#[command(about = "Gaming PC diagnostics - scan, score, report", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Faster run: skip the event log scan and shrink the disk benchmark
    #[arg(long)]
    pub quick: bool,

    /// Where to write the report; a .html extension switches to the HTML report
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// More log output on stderr; repeat for debug detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Plain output without colors
    #[arg(long)]
    pub no_color: bool,

    /// Extra rules file (JSON or YAML) overlaid on the built-in table
    #[arg(long, value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Driver version database (JSON)
    #[arg(long, value_name = "PATH")]
    pub drivers_db: Option<PathBuf>,

    /// Directory where run history is kept
    #[arg(long, value_name = "PATH")]
    pub history_dir: Option<PathBuf>,

    /// Configuration file; probed next to the executable by default
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
