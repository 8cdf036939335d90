//! Output format modifiers and update grouping
//!
//! This module provides:
//! - `--format` token parsing (group, lines, time)
//! - publish-time display strings
//! - diff-group assignment with deterministic sort keys

use crate::diff::{self, DiffType};
use crate::error::ConfigError;
use crate::scanner::Module;
use chrono::{DateTime, Utc};

/// Parsed --format modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Organize each section by diff group
    pub group: bool,
    /// Print bare path@version lines only
    pub lines: bool,
    /// Append the update's publish time
    pub time: bool,
}

impl FormatOptions {
    /// Parses a comma-delimited modifier list. Empty input yields the
    /// defaults; an unknown token is a configuration error.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let mut out = Self::default();
        if s.trim().is_empty() {
            return Ok(out);
        }

        for part in s.split(',') {
            let token = part.trim().to_ascii_lowercase();
            match token.as_str() {
                "" => {}
                "group" => out.group = true,
                "lines" => out.lines = true,
                "time" => out.time = true,
                _ => return Err(ConfigError::unsupported_format_token(token)),
            }
        }
        Ok(out)
    }
}

/// Parses an RFC 3339 timestamp at either second or nanosecond precision.
pub fn parse_rfc3339ish(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Renders a publish timestamp as "2026-01-10 (7d ago)". Returns None when
/// the timestamp does not parse; day counts clamp at zero.
pub fn publish_time(update_time: &str, now: DateTime<Utc>) -> Option<String> {
    let t = parse_rfc3339ish(update_time)?;
    let days = now.signed_duration_since(t).num_days().max(0);
    Some(format!("{} ({}d ago)", t.format("%Y-%m-%d"), days))
}

/// Presentation group of an update, ordered by risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiffGroup {
    Major,
    Minor,
    Patch,
    Unknown,
}

/// Assigns a module to its diff group.
///
/// Minor bumps where both versions are pre-1.0 count as Major: v0 minor
/// releases conventionally carry breaking-change risk.
pub fn group_for_module(m: &Module) -> DiffGroup {
    let update = match m.update.as_deref() {
        Some(u) => u,
        None => return DiffGroup::Unknown,
    };

    match diff::diff_type(&m.version, &update.version) {
        DiffType::Major => DiffGroup::Major,
        DiffType::Minor => {
            if is_v0_pair(&m.version, &update.version) {
                DiffGroup::Major
            } else {
                DiffGroup::Minor
            }
        }
        DiffType::Patch => DiffGroup::Patch,
        _ => DiffGroup::Unknown,
    }
}

fn is_v0_pair(current: &str, update: &str) -> bool {
    is_v0(current) && is_v0(update)
}

fn is_v0(version: &str) -> bool {
    version
        .strip_prefix('v')
        .unwrap_or(version)
        .starts_with("0.")
}

/// Human-facing label for a module's diff group.
pub fn group_label(m: &Module) -> &'static str {
    let update = match m.update.as_deref() {
        Some(u) => u,
        None => return "Unknown",
    };

    match diff::diff_type(&m.version, &update.version) {
        DiffType::Major => "Major",
        DiffType::Minor => {
            if is_v0_pair(&m.version, &update.version) {
                "Major (v0)"
            } else {
                "Minor"
            }
        }
        DiffType::Patch => "Patch",
        _ => "Unknown",
    }
}

/// Total-order sort key: Major (and Major (v0)) = 0, Minor = 1, Patch = 2,
/// Unknown = 3.
pub fn group_sort_key(m: &Module) -> u8 {
    match group_for_module(m) {
        DiffGroup::Major => 0,
        DiffGroup::Minor => 1,
        DiffGroup::Patch => 2,
        DiffGroup::Unknown => 3,
    }
}
