use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Watch webpages for visible-text changes and email on change")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one check cycle over all configured targets
    Check(CheckArgs),

    /// List stored snapshots
    History(HistoryArgs),

    /// Print the text of a stored snapshot
    Show(ShowArgs),

    /// Apply the retention bound to every known target
    Prune(PruneArgs),
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Target URLs to check (defaults to VIGIL_URLS)
    #[arg(long, value_delimiter = ',')]
    pub urls: Option<Vec<String>>,

    /// Snapshots to keep per target (defaults to VIGIL_KEEP, then 10)
    #[arg(long)]
    pub keep: Option<usize>,

    /// Per-request fetch timeout ("30s", "2m")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub timeout: Duration,

    /// Database path (defaults to VIGIL_DB, then the platform data dir)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Detect and store changes but skip email notifications
    #[arg(long, default_value_t = false)]
    pub no_notify: bool,

    /// Output the cycle report as JSON instead of a summary line
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Only show snapshots for this URL
    #[arg(long)]
    pub url: Option<String>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Database path (defaults to VIGIL_DB, then the platform data dir)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Target URL
    #[arg(long)]
    pub url: String,

    /// Show a specific snapshot by ID instead of the latest
    #[arg(long)]
    pub id: Option<i64>,

    /// Database path (defaults to VIGIL_DB, then the platform data dir)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Parser)]
pub struct PruneArgs {
    /// Snapshots to keep per target (defaults to VIGIL_KEEP, then 10)
    #[arg(long)]
    pub keep: Option<usize>,

    /// Database path (defaults to VIGIL_DB, then the platform data dir)
    #[arg(long)]
    pub db: Option<PathBuf>,
}
