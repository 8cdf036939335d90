//! modup - Go module dependency update checker CLI tool
//!
//! Lists available updates for the modules declared in go.mod, lets you
//! select them interactively, and upgrades your go.mod file.

use chrono::Utc;
use clap::Parser;
use modup::app::{self, Deps};
use modup::cli::CliArgs;
use modup::interactive::PromptSelector;
use modup::scanner::Scanner;
use modup::updater::Upgrader;
use modup::vuln::OsvClient;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic: wire the real collaborators and run.
async fn run(args: CliArgs) -> anyhow::Result<()> {
    let opts = args.run_options();

    let scanner = Scanner::new();
    let upgrader = Upgrader::new();
    let vuln_client = OsvClient::new()?;
    let selector = PromptSelector;

    let mut stdout = io::stdout().lock();
    {
        let mut deps = Deps {
            out: &mut stdout,
            scanner: &scanner,
            upgrader: &upgrader,
            vuln: &vuln_client,
            selector: &selector,
            now: Utc::now(),
            show_progress: true,
        };
        app::run(&opts, &mut deps).await?;
    }
    stdout.flush()?;

    Ok(())
}
