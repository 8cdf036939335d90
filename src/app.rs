//! Run orchestration: scan, annotate, present, upgrade
//!
//! All collaborators (scanner, upgrader, vulnerability client, selector,
//! clock, output writer) are injected through Deps; nothing here reaches
//! for globals, so the whole flow is drivable from tests.

use crate::diff;
use crate::error::AppError;
use crate::format::{self, FormatOptions};
use crate::interactive::{SelectOptions, UpdateSelector};
use crate::progress::Progress;
use crate::scanner::{Module, NameFilter, ScanOptions, Scanner};
use crate::updater::Upgrader;
use crate::vuln::VulnClient;
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// Options for one run, mirroring the CLI surface
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Project directory containing go.mod
    pub project_dir: PathBuf,
    /// Apply every listed update
    pub upgrade: bool,
    /// Select updates interactively
    pub interactive: bool,
    /// Name filter pattern (substring or regex)
    pub filter: Option<String>,
    /// Include transitive updates not listed in go.mod
    pub all: bool,
    /// Minimum update age in days
    pub cooldown: i64,
    /// Comma-delimited format modifiers
    pub format: String,
    /// Annotate results with vulnerability counts
    pub vulnerabilities: bool,
}

/// Injected collaborators
pub struct Deps<'a> {
    pub out: &'a mut dyn Write,
    pub scanner: &'a Scanner,
    pub upgrader: &'a Upgrader,
    pub vuln: &'a (dyn VulnClient + Send + Sync),
    pub selector: &'a dyn UpdateSelector,
    pub now: DateTime<Utc>,
    pub show_progress: bool,
}

/// Runs the full check/present/upgrade flow.
pub async fn run(opts: &RunOptions, deps: &mut Deps<'_>) -> Result<(), AppError> {
    let formats = FormatOptions::parse(&opts.format)?;

    // Fail fast on a bad pattern, before any scanning happens.
    let filter = match opts.filter.as_deref() {
        Some(pattern) if !pattern.is_empty() => Some(NameFilter::new(pattern)?),
        _ => None,
    };
    let scan_opts = ScanOptions {
        filter,
        include_all: opts.all,
        cooldown_days: opts.cooldown,
    };

    if !formats.lines {
        writeln!(deps.out, "Checking for updates...")?;
    }

    let mut modules = deps.scanner.scan(&opts.project_dir, &scan_opts, deps.now)?;

    if modules.is_empty() {
        if !formats.lines {
            writeln!(
                deps.out,
                "All dependencies match the latest package versions :)"
            )?;
        }
        return Ok(());
    }

    if opts.vulnerabilities {
        if !formats.lines {
            writeln!(deps.out, "Checking vulnerabilities...")?;
        }
        let mut progress = Progress::new(deps.show_progress && !formats.lines);
        progress.spinner("Querying vulnerability database...");
        annotate_vulnerabilities(&mut modules, deps.vuln).await;
        progress.finish_and_clear();
    }

    let (direct, indirect, transitive) = split_by_origin(modules);

    if opts.interactive {
        let chosen = deps.selector.select(
            direct,
            indirect,
            transitive,
            SelectOptions {
                group: formats.group,
                time: formats.time,
            },
        )?;
        if chosen.is_empty() {
            writeln!(deps.out, "No updates selected.")?;
            return Ok(());
        }
        writeln!(deps.out, "\nUpgrading...")?;
        deps.upgrader.apply(&chosen, &opts.project_dir)?;
        writeln!(deps.out, "Done.")?;
        return Ok(());
    }

    if formats.lines {
        print_lines(deps.out, &direct, &indirect, &transitive, opts.all)?;
        return Ok(());
    }

    writeln!(deps.out, "\nAvailable updates:")?;

    let pad = max_path_len(&direct, &indirect, &transitive);
    print_section(
        deps.out,
        "Direct dependencies (go.mod)",
        &direct,
        pad,
        &formats,
        opts.vulnerabilities,
        deps.now,
    )?;
    print_section(
        deps.out,
        "Indirect dependencies (go.mod // indirect)",
        &indirect,
        pad,
        &formats,
        opts.vulnerabilities,
        deps.now,
    )?;
    if opts.all {
        print_section(
            deps.out,
            "Transitive (not in go.mod)",
            &transitive,
            pad,
            &formats,
            opts.vulnerabilities,
            deps.now,
        )?;
    }

    if opts.upgrade {
        let mut selection: Vec<Module> = Vec::new();
        selection.extend(direct);
        selection.extend(indirect);
        if opts.all {
            selection.extend(transitive);
        }

        writeln!(deps.out, "\nUpgrading...")?;
        deps.upgrader.apply(&selection, &opts.project_dir)?;
        writeln!(deps.out, "Done.")?;
        return Ok(());
    }

    writeln!(
        deps.out,
        "\nRun with -u to upgrade, or -i for interactive mode."
    )?;
    Ok(())
}

/// Fetches severity counts for the current and update versions of each
/// module. A failed lookup leaves the counts at zero; it never aborts.
async fn annotate_vulnerabilities(modules: &mut [Module], client: &(dyn VulnClient + Send + Sync)) {
    for module in modules.iter_mut() {
        let update_version = match module.update.as_deref() {
            Some(update) => update.version.clone(),
            None => continue,
        };

        if let Ok(counts) = client.check_module(&module.path, &module.version).await {
            module.vuln_current = counts;
        }
        if let Ok(counts) = client.check_module(&module.path, &update_version).await {
            module.vuln_update = counts;
        }
    }
}

/// Splits modules into direct, indirect, and transitive categories.
fn split_by_origin(modules: Vec<Module>) -> (Vec<Module>, Vec<Module>, Vec<Module>) {
    let mut direct = Vec::new();
    let mut indirect = Vec::new();
    let mut transitive = Vec::new();

    for module in modules {
        if module.from_manifest {
            if module.indirect {
                indirect.push(module);
            } else {
                direct.push(module);
            }
        } else {
            transitive.push(module);
        }
    }

    (direct, indirect, transitive)
}

/// Longest module path across all groups, for column alignment.
fn max_path_len(direct: &[Module], indirect: &[Module], transitive: &[Module]) -> usize {
    [direct, indirect, transitive]
        .iter()
        .flat_map(|group| group.iter())
        .map(|m| m.path.len())
        .max()
        .unwrap_or(0)
}

/// Bare `path@version` output, one line per update.
fn print_lines(
    out: &mut dyn Write,
    direct: &[Module],
    indirect: &[Module],
    transitive: &[Module],
    include_all: bool,
) -> std::io::Result<()> {
    let mut all: Vec<&Module> = Vec::new();
    all.extend(direct);
    all.extend(indirect);
    if include_all {
        all.extend(transitive);
    }

    for module in all {
        if let Some(update) = module.update.as_deref() {
            writeln!(out, "{}@{}", module.path, update.version)?;
        }
    }
    Ok(())
}

/// Prints one titled section, grouped by diff label or as a flat list.
/// Empty sections are omitted entirely.
fn print_section(
    out: &mut dyn Write,
    title: &str,
    group: &[Module],
    pad: usize,
    formats: &FormatOptions,
    show_vulns: bool,
    now: DateTime<Utc>,
) -> std::io::Result<()> {
    if group.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n{}", title)?;

    if formats.group {
        let mut by_label: BTreeMap<(u8, &'static str), Vec<&Module>> = BTreeMap::new();
        for module in group {
            by_label
                .entry((format::group_sort_key(module), format::group_label(module)))
                .or_default()
                .push(module);
        }

        for ((_, label), members) in by_label {
            writeln!(out, "\n{}", label.dimmed())?;
            for module in members {
                writeln!(out, " {}", render_line(module, pad, formats, show_vulns, now))?;
            }
        }
        return Ok(());
    }

    for module in group {
        writeln!(out, " {}", render_line(module, pad, formats, show_vulns, now))?;
    }
    Ok(())
}

fn render_line(
    module: &Module,
    pad: usize,
    formats: &FormatOptions,
    show_vulns: bool,
    now: DateTime<Utc>,
) -> String {
    let update = module.update.as_deref();
    let new_version = update.map(|u| u.version.as_str()).unwrap_or("");

    let mut line = diff::format_update(&module.path, &module.version, new_version, pad);

    if show_vulns && module.vuln_current.total > 0 {
        line.push(' ');
        line.push_str(&diff::format_severity_transition(
            &module.vuln_current,
            &module.vuln_update,
        ));
    }

    if formats.time {
        if let Some(published) = update.and_then(|u| format::publish_time(&u.time, now)) {
            line.push_str(&format!("  {}", published.dimmed()));
        }
    }

    line
}
