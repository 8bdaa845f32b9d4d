//! Error types for race analysis.
//!
//! Errors fall into two groups. Partial failures (`InsufficientData`,
//! `MissingChannel`) describe a single unit of work (one driver, one lap,
//! one compound) and are absorbed by the analysis functions, which report
//! them through a [`SkipReport`](crate::analysis::SkipReport) instead of
//! failing the call. Fatal errors describe total data unavailability or a
//! broken precondition and are the only errors that reach callers.
//!
//! ```rust
//! use overcut::AnalysisError;
//!
//! let error = AnalysisError::insufficient_data("SOFT regression for VER", 4, 2);
//! assert!(!error.is_fatal());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

/// Main error type for analysis operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error("Insufficient data for {context}: need {required}, found {found}")]
    InsufficientData { context: String, required: usize, found: usize },

    #[error("Telemetry channel '{channel}' missing for {context}")]
    MissingChannel { channel: String, context: String },

    #[error("Session data unavailable: {reason}")]
    Upstream {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Driver '{driver}' not found in session")]
    DriverNotFound { driver: String },

    #[error("Lap {lap} not found for driver '{driver}'")]
    LapNotFound { driver: String, lap: u32 },

    #[error("Invalid analysis configuration: {details}")]
    Config { details: String },

    #[error("Session file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Analysis exceeded its budget of {duration:?}")]
    Timeout { duration: Duration },

    #[error("Analysis worker failed: {details}")]
    Worker { details: String },

    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Returns whether this error must surface to the caller.
    ///
    /// Non-fatal errors only ever describe one unit of work and are
    /// absorbed into a skip report.
    pub fn is_fatal(&self) -> bool {
        match self {
            AnalysisError::InsufficientData { .. } => false,
            AnalysisError::MissingChannel { .. } => false,
            AnalysisError::LapNotFound { .. } => false,
            AnalysisError::DriverNotFound { .. } => false,
            AnalysisError::Upstream { .. } => true,
            AnalysisError::Config { .. } => true,
            AnalysisError::File { .. } => true,
            AnalysisError::Parse { .. } => true,
            AnalysisError::Timeout { .. } => true,
            AnalysisError::Worker { .. } => true,
            AnalysisError::Cancelled => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AnalysisError::InsufficientData { .. } => vec![
                "Include more laps in the analysed window",
                "Relax lap filters such as the accurate-lap requirement",
                "Check the session finished loading before analysis",
            ],
            AnalysisError::MissingChannel { .. } => vec![
                "Verify the provider captured telemetry for this lap",
                "Request the distance channel when loading car data",
                "Pick another lap of the same driver",
            ],
            AnalysisError::Upstream { .. } => vec![
                "Check the session exists for the requested year and event",
                "Verify network access to the data provider",
                "Retry once the provider cache is populated",
            ],
            AnalysisError::DriverNotFound { .. } => vec![
                "Check the driver code spelling",
                "Use three-letter upper-case driver codes",
            ],
            AnalysisError::LapNotFound { .. } => vec![
                "List the driver's laps before requesting telemetry",
                "Lap numbers start at 1",
            ],
            AnalysisError::Config { .. } => vec![
                "Use finite, non-negative calibration constants",
                "Keep resolutions and micro-sector counts above zero",
                "Keep the confidence level strictly between 0 and 1",
            ],
            AnalysisError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            AnalysisError::Parse { .. } => vec![
                "Check the session document is valid YAML",
                "Verify field names match the session schema",
            ],
            AnalysisError::Timeout { .. } => vec![
                "Increase the analysis budget",
                "Lower the micro-sector count",
                "Reduce the number of drivers per request",
            ],
            AnalysisError::Worker { .. } => vec![
                "Check the input tables for malformed values",
                "Re-run the request with tracing enabled",
            ],
            AnalysisError::Cancelled => vec!["Re-issue the request on a live engine"],
        }
    }

    /// Helper constructor for insufficient data errors.
    pub fn insufficient_data(context: impl Into<String>, required: usize, found: usize) -> Self {
        AnalysisError::InsufficientData { context: context.into(), required, found }
    }

    /// Helper constructor for missing telemetry channels.
    pub fn missing_channel(channel: impl Into<String>, context: impl Into<String>) -> Self {
        AnalysisError::MissingChannel { channel: channel.into(), context: context.into() }
    }

    /// Helper constructor for upstream provider failures.
    pub fn upstream_failed(reason: impl Into<String>) -> Self {
        AnalysisError::Upstream { reason: reason.into(), source: None }
    }

    /// Helper constructor for upstream provider failures with source.
    pub fn upstream_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        AnalysisError::Upstream { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        AnalysisError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        AnalysisError::Config { details: details.into() }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for AnalysisError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        AnalysisError::Parse { context: "YAML document".to_string(), details: err.to_string() }
    }
}
