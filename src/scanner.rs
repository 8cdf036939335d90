//! Update discovery by decoding and filtering the `go list` report
//!
//! This module provides:
//! - The Module record decoded from `go list -m -u -json all`
//! - Streaming decode of the concatenated-JSON report
//! - Annotation against the go.mod require index and option-driven
//!   filtering with defined precedence
//! - The Scanner with an injectable report producer

use crate::cooldown;
use crate::error::{AppError, ConfigError, ScanError};
use crate::manifest::RequireIndex;
use crate::vuln::SeverityCounts;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// A single Go module with version info, as reported by `go list`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Module {
    pub path: String,
    pub version: String,
    /// Publish timestamp of this version, RFC 3339
    pub time: String,
    /// Populated when a newer version is available
    pub update: Option<Box<Module>>,
    /// Indirect flag as self-reported by the version source; overwritten
    /// from go.mod during annotation when the module is declared there
    pub indirect: bool,

    /// True when the module is explicitly listed in go.mod. Populated by
    /// the annotation pass, not by `go list`.
    #[serde(skip)]
    pub from_manifest: bool,

    /// Vulnerability counts for the installed version
    #[serde(skip)]
    pub vuln_current: SeverityCounts,
    /// Vulnerability counts for the update version
    #[serde(skip)]
    pub vuln_update: SeverityCounts,
}

impl Module {
    /// The available update version, if any.
    pub fn update_version(&self) -> Option<&str> {
        self.update.as_deref().map(|u| u.version.as_str())
    }
}

/// Name filter over module paths: substring first as a fast path, regex
/// as the authoritative general case.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: String,
    regex: Regex,
}

impl NameFilter {
    /// Compiles the pattern. An uncompilable pattern is a hard error
    /// raised here, before any record is processed.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern)
            .map_err(|e| ConfigError::invalid_filter_pattern(pattern, e.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        path.contains(&self.pattern) || self.regex.is_match(path)
    }
}

/// Configures update discovery
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Keep only modules whose path matches
    pub filter: Option<NameFilter>,
    /// Also consider modules not declared in go.mod
    pub include_all: bool,
    /// Minimum publish age in days; non-positive disables the check
    pub cooldown_days: i64,
}

/// Decodes the report stream: zero or more consecutive JSON objects, no
/// enclosing array. Input order is preserved. An empty buffer yields an
/// empty vec; any invalid object aborts the whole decode.
pub fn decode_modules(data: &[u8]) -> Result<Vec<Module>, ScanError> {
    let mut modules = Vec::new();
    for record in serde_json::Deserializer::from_slice(data).into_iter::<Module>() {
        modules.push(record.map_err(|e| ScanError::decode(e.to_string()))?);
    }
    Ok(modules)
}

/// Applies go.mod classification and filters modules based on `opts`,
/// preserving relative order among survivors.
///
/// Per-record precedence: no update -> drop; manifest classification
/// overrides the stream's indirect flag; undeclared modules drop unless
/// include_all; name filter; cooldown.
pub fn annotate_and_filter(
    modules: Vec<Module>,
    idx: &RequireIndex,
    opts: &ScanOptions,
    now: DateTime<Utc>,
) -> Vec<Module> {
    let mut out = Vec::with_capacity(modules.len());

    for mut module in modules {
        let publish_time = match module.update.as_deref() {
            Some(update) => update.time.clone(),
            None => continue,
        };

        if let Some(indirect) = idx.get(&module.path) {
            module.from_manifest = true;
            module.indirect = indirect;
        }

        if !opts.include_all && !module.from_manifest {
            continue;
        }

        if let Some(filter) = &opts.filter {
            if !filter.matches(&module.path) {
                continue;
            }
        }

        if opts.cooldown_days > 0 && !cooldown::eligible(&publish_time, opts.cooldown_days, now)
        {
            continue;
        }

        out.push(module);
    }

    out
}

/// Produces the raw version-report stream for a project directory.
///
/// Injected into the Scanner so tests and advanced callers can substitute
/// the producer.
pub trait ReportProducer {
    fn produce(&self, project_dir: &Path) -> Result<Vec<u8>, ScanError>;
}

/// Runs `go list -m -u -json all` in the project directory.
#[derive(Debug, Default)]
pub struct GoListProducer;

impl ReportProducer for GoListProducer {
    fn produce(&self, project_dir: &Path) -> Result<Vec<u8>, ScanError> {
        let output = Command::new("go")
            .args(["list", "-m", "-u", "-json", "all"])
            .current_dir(project_dir)
            .output()
            .map_err(|e| ScanError::producer(e.to_string()))?;

        if !output.status.success() {
            return Err(ScanError::producer(format!(
                "go list exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Discovers available updates for a project
pub struct Scanner {
    producer: Box<dyn ReportProducer + Send + Sync>,
}

impl Scanner {
    /// Creates a scanner backed by the real `go list` invocation.
    pub fn new() -> Self {
        Self::with_producer(Box::new(GoListProducer))
    }

    /// Creates a scanner with a custom report producer (for testing).
    pub fn with_producer(producer: Box<dyn ReportProducer + Send + Sync>) -> Self {
        Self { producer }
    }

    /// Finds updates for the project rooted at `project_dir`, using its
    /// go.mod as the classification ground truth.
    ///
    /// By default only modules explicitly listed in go.mod are returned;
    /// with `include_all`, transitive modules are returned too, still
    /// annotated against go.mod.
    pub fn scan(
        &self,
        project_dir: &Path,
        opts: &ScanOptions,
        now: DateTime<Utc>,
    ) -> Result<Vec<Module>, AppError> {
        let idx = RequireIndex::from_file(&project_dir.join("go.mod"))?;
        let data = self.producer.produce(project_dir)?;
        let modules = decode_modules(&data)?;
        Ok(annotate_and_filter(modules, &idx, opts, now))
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 17, 0, 0, 0).unwrap()
    }

    struct StaticProducer(Vec<u8>);

    impl ReportProducer for StaticProducer {
        fn produce(&self, _project_dir: &Path) -> Result<Vec<u8>, ScanError> {
            Ok(self.0.clone())
        }
    }

    struct FailingProducer;

    impl ReportProducer for FailingProducer {
        fn produce(&self, _project_dir: &Path) -> Result<Vec<u8>, ScanError> {
            Err(ScanError::producer("exit status 1"))
        }
    }

    #[test]
    fn test_decode_empty_buffer() {
        let modules = decode_modules(b"").unwrap();
        assert!(modules.is_empty());
    }

    #[test]
    fn test_decode_back_to_back_objects() {
        let data = br#"{"Path":"a","Version":"v1.0.0","Update":{"Version":"v1.1.0","Time":"2020-01-01T00:00:00Z"}}{"Path":"b","Version":"v1.0.0"}"#;
        let modules = decode_modules(data).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].path, "a");
        assert_eq!(modules[1].path, "b");
        assert_eq!(modules[0].update_version(), Some("v1.1.0"));
        assert_eq!(modules[1].update_version(), None);
    }

    #[test]
    fn test_decode_newline_separated_objects() {
        let data = b"{\"Path\":\"a\",\"Version\":\"v1.0.0\"}\n{\"Path\":\"b\",\"Version\":\"v2.0.0\"}\n";
        let modules = decode_modules(data).unwrap();
        assert_eq!(modules.len(), 2);
    }

    #[test]
    fn test_decode_invalid_json_aborts() {
        let data = br#"{"Path":"a","Version":"v1.0.0"}{"Path":}"#;
        let err = decode_modules(data).unwrap_err();
        assert!(format!("{}", err).contains("failed to decode"));
    }

    #[test]
    fn test_decode_indirect_flag() {
        let data = br#"{"Path":"a","Version":"v1.0.0","Indirect":true}"#;
        let modules = decode_modules(data).unwrap();
        assert!(modules[0].indirect);
    }

    #[test]
    fn test_name_filter_substring_and_regex() {
        let filter = NameFilter::new("tr").unwrap();
        assert!(filter.matches("trans"));
        assert!(!filter.matches("direct"));

        let filter = NameFilter::new("^github\\.com/").unwrap();
        assert!(filter.matches("github.com/a/b"));
        assert!(!filter.matches("golang.org/x/text"));
    }

    #[test]
    fn test_name_filter_invalid_pattern() {
        let err = NameFilter::new("[unclosed").unwrap_err();
        assert!(format!("{}", err).contains("invalid filter pattern"));
    }

    #[test]
    fn test_annotate_and_filter_defaults() {
        let now = fixed_now();
        let data = br#"{"Path":"direct","Version":"v1.0.0","Update":{"Version":"v1.0.1","Time":"2025-01-01T00:00:00Z"}}{"Path":"trans","Version":"v1.0.0","Update":{"Version":"v1.0.1","Time":"2025-01-01T00:00:00Z"}}{"Path":"noupdate","Version":"v1.0.0"}"#;
        let modules = decode_modules(data).unwrap();
        let idx = RequireIndex::parse("require direct v1.0.0\n");

        let opts = ScanOptions {
            cooldown_days: 30,
            ..Default::default()
        };
        let out = annotate_and_filter(modules, &idx, &opts, now);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, "direct");
        assert!(out[0].from_manifest);
        assert!(!out[0].indirect);
    }

    #[test]
    fn test_annotate_and_filter_include_all_with_name_filter() {
        let now = fixed_now();
        let data = br#"{"Path":"direct","Version":"v1.0.0","Update":{"Version":"v1.0.1","Time":"2025-01-01T00:00:00Z"}}{"Path":"trans","Version":"v1.0.0","Update":{"Version":"v1.0.1","Time":"2025-01-01T00:00:00Z"}}"#;
        let modules = decode_modules(data).unwrap();
        let idx = RequireIndex::parse("require direct v1.0.0\n");

        let opts = ScanOptions {
            filter: Some(NameFilter::new("tr").unwrap()),
            include_all: true,
            cooldown_days: 0,
        };
        let out = annotate_and_filter(modules, &idx, &opts, now);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, "trans");
    }

    #[test]
    fn test_annotate_and_filter_manifest_overrides_indirect_flag() {
        let now = fixed_now();
        // go list reports the module as indirect; go.mod says direct
        let data = br#"{"Path":"a","Version":"v1.0.0","Indirect":true,"Update":{"Version":"v1.0.1"}}"#;
        let modules = decode_modules(data).unwrap();
        let idx = RequireIndex::parse("require a v1.0.0\n");

        let out = annotate_and_filter(modules, &idx, &ScanOptions::default(), now);
        assert_eq!(out.len(), 1);
        assert!(out[0].from_manifest);
        assert!(!out[0].indirect);
    }

    #[test]
    fn test_annotate_and_filter_cooldown_drops_recent() {
        let now = fixed_now();
        let recent = (now - chrono::Duration::days(5)).to_rfc3339();
        let old = (now - chrono::Duration::days(90)).to_rfc3339();
        let data = format!(
            r#"{{"Path":"fresh","Version":"v1.0.0","Update":{{"Version":"v1.0.1","Time":"{}"}}}}{{"Path":"aged","Version":"v1.0.0","Update":{{"Version":"v1.0.1","Time":"{}"}}}}"#,
            recent, old
        );
        let modules = decode_modules(data.as_bytes()).unwrap();
        let idx = RequireIndex::parse("require fresh v1.0.0\nrequire aged v1.0.0\n");

        let opts = ScanOptions {
            cooldown_days: 30,
            ..Default::default()
        };
        let out = annotate_and_filter(modules, &idx, &opts, now);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, "aged");
    }

    #[test]
    fn test_annotate_and_filter_preserves_order() {
        let now = fixed_now();
        let data = br#"{"Path":"b","Version":"v1.0.0","Update":{"Version":"v1.0.1"}}{"Path":"a","Version":"v1.0.0","Update":{"Version":"v1.0.1"}}"#;
        let modules = decode_modules(data).unwrap();
        let idx = RequireIndex::parse("require a v1.0.0\nrequire b v1.0.0\n");

        let out = annotate_and_filter(modules, &idx, &ScanOptions::default(), now);
        let paths: Vec<&str> = out.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["b", "a"]);
    }

    #[test]
    fn test_scan_with_injected_producer() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("go.mod"),
            "module example.com/foo\n\ngo 1.25\n\nrequire (\n\tgo.mod/direct v1.0.0\n\tgo.mod/indirect v1.0.0 // indirect\n)\n",
        )
        .unwrap();

        let now = fixed_now();
        let old = (now - chrono::Duration::days(60)).to_rfc3339();
        let stream = format!(
            r#"{{"Path":"go.mod/direct","Version":"v1.0.0","Update":{{"Version":"v1.0.1","Time":"{old}"}}}}{{"Path":"go.mod/indirect","Version":"v1.0.0","Update":{{"Version":"v1.1.0","Time":"{old}"}}}}{{"Path":"transitive","Version":"v1.0.0","Update":{{"Version":"v1.0.1","Time":"{old}"}}}}"#
        );

        let scanner = Scanner::with_producer(Box::new(StaticProducer(stream.into_bytes())));

        let opts = ScanOptions {
            cooldown_days: 30,
            ..Default::default()
        };
        let modules = scanner.scan(dir.path(), &opts, now).unwrap();
        assert_eq!(modules.len(), 2);
        assert!(modules.iter().all(|m| m.from_manifest));

        let opts_all = ScanOptions {
            include_all: true,
            cooldown_days: 30,
            ..Default::default()
        };
        let modules_all = scanner.scan(dir.path(), &opts_all, now).unwrap();
        assert_eq!(modules_all.len(), 3);
    }

    #[test]
    fn test_scan_missing_manifest_is_hard_error() {
        let dir = TempDir::new().unwrap();
        let scanner = Scanner::with_producer(Box::new(StaticProducer(Vec::new())));
        let err = scanner
            .scan(dir.path(), &ScanOptions::default(), fixed_now())
            .unwrap_err();
        assert!(format!("{}", err).contains("failed to read"));
    }

    #[test]
    fn test_scan_producer_failure_is_hard_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/foo\n").unwrap();

        let scanner = Scanner::with_producer(Box::new(FailingProducer));
        let err = scanner
            .scan(dir.path(), &ScanOptions::default(), fixed_now())
            .unwrap_err();
        assert!(format!("{}", err).contains("failed to run go list"));
    }
}
