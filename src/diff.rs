//! Version-delta classification and colored rendering of update lines

use crate::vuln::SeverityCounts;
use colored::Colorize;
use semver::Version;

/// Magnitude of the change between two version strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    Major,
    Minor,
    Patch,
    /// Identical release triples; never surfaced as a candidate state
    Same,
    /// Pseudo-versions and anything not cleanly parseable
    Unknown,
}

/// Classifies the delta between a current and an update version.
///
/// Pseudo-versions on either side are not comparable and classify Unknown.
/// Pre-release and build-metadata suffixes are ignored; only the numeric
/// MAJOR.MINOR.PATCH triple is compared, first differing component wins.
pub fn diff_type(current: &str, update: &str) -> DiffType {
    if is_pseudo_version(current) || is_pseudo_version(update) {
        return DiffType::Unknown;
    }
    if current == update {
        return DiffType::Same;
    }

    let (a, b) = match (release_triple(current), release_triple(update)) {
        (Some(a), Some(b)) => (a, b),
        _ => return DiffType::Unknown,
    };

    if a.0 != b.0 {
        DiffType::Major
    } else if a.1 != b.1 {
        DiffType::Minor
    } else if a.2 != b.2 {
        DiffType::Patch
    } else {
        DiffType::Same
    }
}

fn release_triple(v: &str) -> Option<(u64, u64, u64)> {
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    let v = v.strip_prefix('v').unwrap_or(v);
    let parsed = Version::parse(v).ok()?;
    Some((parsed.major, parsed.minor, parsed.patch))
}

/// Go pseudo-versions always carry two hyphen-separated suffix segments,
/// e.g. v1.2.3-0.20240101000000-abcdef123456.
pub fn is_pseudo_version(v: &str) -> bool {
    v.matches('-').count() >= 2
}

fn colorize_version(diff: DiffType, version: &str) -> String {
    match diff {
        DiffType::Major => version.red().to_string(),
        DiffType::Minor => version.cyan().to_string(),
        DiffType::Patch => version.green().to_string(),
        DiffType::Unknown => version.magenta().to_string(),
        DiffType::Same => version.normal().to_string(),
    }
}

/// Renders "path  v1.0.0  →  v2.0.0" with the path left-padded to
/// `pad_path` for column alignment and the target version colored by
/// delta magnitude.
pub fn format_update(path: &str, v_old: &str, v_new: &str, pad_path: usize) -> String {
    let diff = diff_type(v_old, v_new);
    let padded = format!("{:<width$}", path, width = pad_path);

    format!(
        "{}  {}  {}  {}",
        padded.cyan().bold(),
        v_old,
        "→".dimmed(),
        colorize_version(diff, v_new),
    )
}

/// Renders severity counts as "[L (1), M (2), H (1), C (1)]", empty when
/// there is nothing to show.
pub fn format_severity(info: &SeverityCounts) -> String {
    if info.total == 0 {
        return String::new();
    }

    let mut parts = Vec::new();
    if info.low > 0 {
        parts.push(format!("L ({})", info.low));
    }
    if info.medium > 0 {
        parts.push(format!("M ({})", info.medium).yellow().to_string());
    }
    if info.high > 0 {
        parts.push(format!("H ({})", info.high).bright_red().to_string());
    }
    if info.critical > 0 {
        parts.push(format!("C ({})", info.critical).red().bold().to_string());
    }

    if parts.is_empty() {
        return String::new();
    }
    format!("[{}]", parts.join(", "))
}

/// Renders the severity transition between the current and update
/// versions, e.g. "[M (2)] → ✓ (fixes 2)".
pub fn format_severity_transition(current: &SeverityCounts, update: &SeverityCounts) -> String {
    let current_str = format_severity(current);
    if current_str.is_empty() {
        return String::new();
    }

    let update_str = format_severity(update);
    let fixed = current.total as i64 - update.total as i64;

    if fixed > 0 {
        if update_str.is_empty() {
            return format!(
                "{} → {}",
                current_str,
                format!("✓ (fixes {})", fixed).green()
            );
        }
        return format!(
            "{} → {} {}",
            current_str,
            update_str,
            format!("(fixes {})", fixed).green()
        );
    }
    if fixed < 0 {
        return format!(
            "{} → {} {}",
            current_str,
            update_str,
            format!("(+{})", -fixed).red()
        );
    }
    if update.total > 0 {
        return format!("{} → {}", current_str, update_str);
    }
    current_str
}
