//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: reading the go.mod require index
//! - ScanError: producing or decoding the version report
//! - ConfigError: user-supplied filter and format options
//! - UpgradeError: applying updates through the go toolchain
//! - VulnError: vulnerability lookups (recovered by the caller, never fatal)

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// go.mod related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Version report related errors
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Upgrade related errors
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),

    /// Interactive selection failed (no usable terminal, prompt error)
    #[error("interactive selection failed: {0}")]
    Selection(String),

    /// Output writing errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors related to the dependency manifest
///
/// Malformed content inside go.mod is never an error; only failing to
/// read the file itself is.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read the go.mod file
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to producing and decoding the version report
#[derive(Error, Debug)]
pub enum ScanError {
    /// The version-report producer could not be run or exited non-zero
    #[error("failed to run go list: {message}")]
    Producer { message: String },

    /// Invalid JSON in a non-empty report stream
    #[error("failed to decode version report: {message}")]
    Decode { message: String },
}

/// Errors related to user configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The --filter pattern does not compile as a regular expression
    #[error("invalid filter pattern '{pattern}': {message}")]
    InvalidFilterPattern { pattern: String, message: String },

    /// Unknown token in the --format flag
    #[error("unsupported --format value: \"{token}\" (supported: group, lines, time)")]
    UnsupportedFormatToken { token: String },
}

/// Errors related to applying updates through the go toolchain
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// A go command failed; output carries the combined stdout/stderr
    #[error("{command} failed: {output}")]
    CommandFailed { command: String, output: String },
}

/// Errors related to vulnerability lookups
#[derive(Error, Debug)]
pub enum VulnError {
    /// Failed to construct the HTTP client
    #[error("failed to create vulnerability client: {0}")]
    Client(String),

    /// Network request failed
    #[error("failed to query vulnerability database for '{package}': {message}")]
    Network { package: String, message: String },

    /// Non-success HTTP status
    #[error("vulnerability database returned status {status} for '{package}'")]
    Status { package: String, status: u16 },

    /// Response body could not be decoded
    #[error("invalid vulnerability response for '{package}': {message}")]
    InvalidResponse { package: String, message: String },
}

impl ManifestError {
    /// Creates a new Read error
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::Read {
            path: path.into(),
            source,
        }
    }
}

impl ScanError {
    /// Creates a new Producer error
    pub fn producer(message: impl Into<String>) -> Self {
        ScanError::Producer {
            message: message.into(),
        }
    }

    /// Creates a new Decode error
    pub fn decode(message: impl Into<String>) -> Self {
        ScanError::Decode {
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Creates a new InvalidFilterPattern error
    pub fn invalid_filter_pattern(
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidFilterPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Creates a new UnsupportedFormatToken error
    pub fn unsupported_format_token(token: impl Into<String>) -> Self {
        ConfigError::UnsupportedFormatToken {
            token: token.into(),
        }
    }
}

impl UpgradeError {
    /// Creates a new CommandFailed error
    pub fn command_failed(command: impl Into<String>, output: impl Into<String>) -> Self {
        UpgradeError::CommandFailed {
            command: command.into(),
            output: output.into(),
        }
    }
}

impl VulnError {
    /// Creates a new Client error
    pub fn client(message: impl Into<String>) -> Self {
        VulnError::Client(message.into())
    }

    /// Creates a new Network error
    pub fn network(package: impl Into<String>, message: impl Into<String>) -> Self {
        VulnError::Network {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Creates a new Status error
    pub fn status(package: impl Into<String>, status: u16) -> Self {
        VulnError::Status {
            package: package.into(),
            status,
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(package: impl Into<String>, message: impl Into<String>) -> Self {
        VulnError::InvalidResponse {
            package: package.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ManifestError::read("/project/go.mod", io_err);
        let msg = format!("{}", err);
        assert!(msg.contains("failed to read"));
        assert!(msg.contains("go.mod"));
    }

    #[test]
    fn test_scan_error_producer() {
        let err = ScanError::producer("exit status 1");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to run go list"));
        assert!(msg.contains("exit status 1"));
    }

    #[test]
    fn test_scan_error_decode() {
        let err = ScanError::decode("unexpected character at line 1");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to decode version report"));
        assert!(msg.contains("unexpected character"));
    }

    #[test]
    fn test_config_error_invalid_filter() {
        let err = ConfigError::invalid_filter_pattern("[unclosed", "missing ]");
        let msg = format!("{}", err);
        assert!(msg.contains("invalid filter pattern"));
        assert!(msg.contains("[unclosed"));
    }

    #[test]
    fn test_config_error_unsupported_format() {
        let err = ConfigError::unsupported_format_token("nope");
        let msg = format!("{}", err);
        assert!(msg.contains("unsupported --format value"));
        assert!(msg.contains("nope"));
        assert!(msg.contains("group, lines, time"));
    }

    #[test]
    fn test_upgrade_error_command_failed() {
        let err = UpgradeError::command_failed("go get", "module not found");
        let msg = format!("{}", err);
        assert!(msg.contains("go get failed"));
        assert!(msg.contains("module not found"));
    }

    #[test]
    fn test_vuln_error_network() {
        let err = VulnError::network("github.com/a/b", "connection refused");
        let msg = format!("{}", err);
        assert!(msg.contains("github.com/a/b"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_vuln_error_status() {
        let err = VulnError::status("github.com/a/b", 500);
        let msg = format!("{}", err);
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_app_error_from_manifest_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let app_err: AppError = ManifestError::read("/go.mod", io_err).into();
        assert!(format!("{}", app_err).contains("failed to read"));
    }

    #[test]
    fn test_app_error_from_scan_error() {
        let app_err: AppError = ScanError::decode("bad json").into();
        assert!(format!("{}", app_err).contains("failed to decode"));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::unsupported_format_token("x").into();
        assert!(format!("{}", app_err).contains("unsupported --format"));
    }

    #[test]
    fn test_app_error_from_upgrade_error() {
        let app_err: AppError = UpgradeError::command_failed("go mod tidy", "boom").into();
        assert!(format!("{}", app_err).contains("go mod tidy failed"));
    }

    #[test]
    fn test_error_debug_trait() {
        let err = ScanError::producer("x");
        let debug = format!("{:?}", err);
        assert!(debug.contains("Producer"));
    }
}
