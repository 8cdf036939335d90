//! Vulnerability lookups against the OSV database
//!
//! This module provides:
//! - SeverityCounts, the per-version severity bucket totals
//! - An async VulnClient trait, idempotent and safe for concurrent callers
//! - OsvClient: OSV.dev query client with a per-version result cache and
//!   semaphore-bounded request fan-out
//!
//! Lookup failures are returned to the caller, which recovers them as
//! zero-valued counts; they never abort a run.

use crate::error::VulnError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};

/// Default OSV query endpoint
pub const OSV_ENDPOINT: &str = "https://api.osv.dev/v1/query";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_IN_FLIGHT: usize = 4;
const USER_AGENT: &str = concat!("modup/", env!("CARGO_PKG_VERSION"));

/// Vulnerability counts by severity level for one module version.
/// Zero-valued when unknown or unavailable; never an error state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
    pub total: u32,
}

/// Vulnerability checking for module versions
#[async_trait]
pub trait VulnClient {
    /// Severity counts for one (module, version) pair. Idempotent and
    /// safe to call from multiple concurrent callers.
    async fn check_module(
        &self,
        module_path: &str,
        version: &str,
    ) -> Result<SeverityCounts, VulnError>;
}

/// OSV.dev-backed vulnerability client
pub struct OsvClient {
    http: reqwest::Client,
    endpoint: String,
    cache: Mutex<HashMap<String, SeverityCounts>>,
    in_flight: Semaphore,
}

impl OsvClient {
    /// Creates a client against the public OSV endpoint.
    pub fn new() -> Result<Self, VulnError> {
        Self::with_endpoint(OSV_ENDPOINT)
    }

    /// Creates a client against a custom endpoint (for testing).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, VulnError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VulnError::client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            cache: Mutex::new(HashMap::new()),
            in_flight: Semaphore::new(MAX_IN_FLIGHT),
        })
    }
}

#[derive(Debug, Serialize)]
struct OsvQuery<'a> {
    package: OsvPackage<'a>,
    version: &'a str,
}

#[derive(Debug, Serialize)]
struct OsvPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct OsvResponse {
    #[serde(default)]
    vulns: Vec<OsvVuln>,
}

#[derive(Debug, Deserialize)]
struct OsvVuln {
    #[serde(default)]
    database_specific: Option<DatabaseSpecific>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSpecific {
    #[serde(default)]
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    score: String,
}

#[async_trait]
impl VulnClient for OsvClient {
    async fn check_module(
        &self,
        module_path: &str,
        version: &str,
    ) -> Result<SeverityCounts, VulnError> {
        let cache_key = format!("{}@{}", module_path, version);
        if let Some(counts) = self.cache.lock().await.get(&cache_key) {
            return Ok(*counts);
        }

        let _permit = self.in_flight.acquire().await.unwrap();

        let query = OsvQuery {
            package: OsvPackage {
                name: module_path,
                ecosystem: "Go",
            },
            version,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&query)
            .send()
            .await
            .map_err(|e| VulnError::network(module_path, e.to_string()))?;

        if !response.status().is_success() {
            return Err(VulnError::status(module_path, response.status().as_u16()));
        }

        let body: OsvResponse = response
            .json()
            .await
            .map_err(|e| VulnError::invalid_response(module_path, e.to_string()))?;

        let counts = count_severities(&body);
        self.cache.lock().await.insert(cache_key, counts);
        Ok(counts)
    }
}

fn count_severities(response: &OsvResponse) -> SeverityCounts {
    let mut counts = SeverityCounts::default();

    for vuln in &response.vulns {
        counts.total += 1;

        let mut severity = vuln
            .database_specific
            .as_ref()
            .and_then(|db| db.severity.as_deref())
            .unwrap_or("")
            .to_ascii_uppercase();
        if severity.is_empty() {
            if let Some(first) = vuln.severity.first() {
                severity = severity_from_cvss(&first.score).to_string();
            }
        }

        match severity.as_str() {
            "LOW" => counts.low += 1,
            "MODERATE" | "MEDIUM" => counts.medium += 1,
            "HIGH" => counts.high += 1,
            "CRITICAL" => counts.critical += 1,
            // unknown severities count as medium
            _ => counts.medium += 1,
        }
    }

    counts
}

/// Severity from a CVSS vector string's impact metrics
/// (C/I/A, with a scope-change escalation), e.g.
/// "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H" -> CRITICAL.
fn severity_from_cvss(vector: &str) -> &'static str {
    if vector.is_empty() {
        return "MEDIUM";
    }

    let metrics = parse_cvss_vector(vector);

    let high_impacts = ["C", "I", "A"]
        .iter()
        .filter(|k| metrics.get(**k) == Some(&"H"))
        .count();
    let scope_changed = metrics.get("S") == Some(&"C");

    if high_impacts >= 2 || (high_impacts >= 1 && scope_changed) {
        return "CRITICAL";
    }
    if high_impacts == 1 {
        return "HIGH";
    }
    if ["C", "I", "A"].iter().any(|k| metrics.get(*k) == Some(&"M")) {
        return "MEDIUM";
    }
    if ["C", "I", "A"].iter().any(|k| metrics.get(*k) == Some(&"L")) {
        return "LOW";
    }
    "MEDIUM"
}

/// Parses "CVSS:3.1/AV:N/AC:L/..." into metric -> value pairs, skipping
/// the version indicator.
fn parse_cvss_vector(vector: &str) -> HashMap<&str, &str> {
    vector
        .split('/')
        .filter(|part| !part.starts_with("CVSS:"))
        .filter_map(|part| part.split_once(':'))
        .collect()
}
