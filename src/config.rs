//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

/// Periodically classify inbox messages against a rule file and apply
/// archive/delete actions, reporting outcomes to the console.
#[derive(Debug, Parser)]
#[command(name = "inbox-triage", version, about)]
pub struct Cli {
    /// Path to the JSON rules file.
    #[arg(long, default_value_os_t = default_rules_path())]
    pub rules: PathBuf,

    /// Gmail search query override. Defaults to unread messages; explicit
    /// queries are capped at 50 results.
    #[arg(long)]
    pub query: Option<String>,

    /// Seconds between processing cycles.
    #[arg(long, default_value_t = 600)]
    pub interval_seconds: u64,

    /// Content preview length for manual-review entries (0 disables).
    #[arg(long, default_value_t = 0)]
    pub preview_length: usize,

    /// Run a single cycle and exit instead of looping.
    #[arg(long)]
    pub once: bool,
}

fn default_rules_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/inbox-triage/rules.json")
}
