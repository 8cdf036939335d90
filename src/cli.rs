//! CLI argument parsing module for modup

use crate::app::RunOptions;
use clap::Parser;
use std::path::PathBuf;

/// Check for updates to Go module dependencies
#[derive(Parser, Debug, Clone)]
#[command(
    name = "modup",
    version,
    about = "Check for updates to Go module dependencies",
    long_about = "modup lists available updates for the modules declared in go.mod,\n\
                  lets you select them interactively, and upgrades your go.mod file."
)]
pub struct CliArgs {
    /// Project directory containing go.mod (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Upgrade all listed packages to the latest version
    #[arg(short = 'u', long)]
    pub upgrade: bool,

    /// Interactive mode: select which updates to apply
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// Filter packages by substring or regular expression
    #[arg(short = 'f', long)]
    pub filter: Option<String>,

    /// Include transitive updates (not listed in go.mod)
    #[arg(long)]
    pub all: bool,

    /// Minimum age (days) for an update to be considered
    #[arg(short = 'c', long, default_value_t = 0)]
    pub cooldown: i64,

    /// Output format modifiers: group,lines,time (comma-delimited)
    #[arg(long, default_value = "")]
    pub format: String,

    /// Show vulnerability counts for current and updated versions
    #[arg(short = 'v', long)]
    pub vulnerabilities: bool,
}

impl CliArgs {
    /// Maps the parsed flags onto run options.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            project_dir: self.path.clone(),
            upgrade: self.upgrade,
            interactive: self.interactive,
            filter: self.filter.clone(),
            all: self.all,
            cooldown: self.cooldown,
            format: self.format.clone(),
            vulnerabilities: self.vulnerabilities,
        }
    }
}
