//! Applying updates through the go toolchain
//!
//! Builds `go get path@version` argument lists from the selected modules
//! and runs `go get` followed by `go mod tidy`. Command execution goes
//! through the ToolRunner trait so tests can substitute a recorder.

use crate::error::UpgradeError;
use crate::scanner::Module;
use std::path::Path;
use std::process::Command;

/// Outcome of one go invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    /// Combined stdout and stderr
    pub output: String,
}

/// Executes the go toolchain on behalf of the upgrader
pub trait ToolRunner {
    fn run(&self, args: &[String], project_dir: &Path) -> Result<CommandOutput, UpgradeError>;
}

/// Runs the real `go` binary
#[derive(Debug, Default)]
pub struct GoTool;

impl ToolRunner for GoTool {
    fn run(&self, args: &[String], project_dir: &Path) -> Result<CommandOutput, UpgradeError> {
        let output = Command::new("go")
            .args(args)
            .current_dir(project_dir)
            .output()
            .map_err(|e| {
                UpgradeError::command_failed(format!("go {}", args.join(" ")), e.to_string())
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            success: output.status.success(),
            output: combined,
        })
    }
}

/// Applies selected updates to the project
pub struct Upgrader {
    runner: Box<dyn ToolRunner + Send + Sync>,
}

impl Upgrader {
    /// Creates an upgrader backed by the real go toolchain.
    pub fn new() -> Self {
        Self::with_runner(Box::new(GoTool))
    }

    /// Creates an upgrader with a custom tool runner (for testing).
    pub fn with_runner(runner: Box<dyn ToolRunner + Send + Sync>) -> Self {
        Self { runner }
    }

    /// Runs `go get` for every selected module at its update version,
    /// then `go mod tidy` to repair manifest consistency. No-op for an
    /// empty selection.
    pub fn apply(&self, modules: &[Module], project_dir: &Path) -> Result<(), UpgradeError> {
        if modules.is_empty() {
            return Ok(());
        }

        self.run_checked(&build_get_args(modules), project_dir)?;
        self.run_checked(
            &["mod".to_string(), "tidy".to_string()],
            project_dir,
        )?;
        Ok(())
    }

    fn run_checked(&self, args: &[String], project_dir: &Path) -> Result<(), UpgradeError> {
        let result = self.runner.run(args, project_dir)?;
        if !result.success {
            return Err(UpgradeError::command_failed(
                format!("go {}", args.join(" ")),
                result.output.trim().to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Upgrader {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the `go get` argument list. Modules with an update version are
/// pinned as path@version; modules without one fall back to the bare path.
pub fn build_get_args(modules: &[Module]) -> Vec<String> {
    let mut args = vec!["get".to_string()];
    for module in modules {
        match module.update.as_deref() {
            Some(update) if !update.version.is_empty() => {
                args.push(format!("{}@{}", module.path, update.version));
            }
            _ => args.push(module.path.clone()),
        }
    }
    args
}
