//! Typed errors for the odds extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers embedding
//! the extractor in a larger scheduler can decide retry/abort policy
//! themselves. Nothing in this crate terminates the process.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the browser automation collaborator.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The driver could not open a new session
    #[error("failed to start browser session: {0}")]
    SessionStart(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A driver call failed (transport error, stale element, disconnect)
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The session was used after `close()`
    #[error("browser session already closed")]
    SessionClosed,
}

impl BrowserError {
    /// Wrap any driver-side error.
    pub fn driver(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Driver(err.into())
    }
}

/// Navigation to a target URL failed.
///
/// Always fatal to the current attempt; the extractor retries while
/// attempts remain.
#[derive(Debug, Error)]
#[error("failed to navigate to {url}: {source}")]
pub struct NavigationError {
    pub url: String,
    #[source]
    pub source: BrowserError,
}

/// A displayed "last updated" string did not match the expected layout.
///
/// Fatal for the field being extracted: reloading will not fix a layout
/// mismatch, so the extractor does not retry on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampParseError {
    /// Fewer than two newline-separated segments
    #[error("expected at least 2 text segments, found {found}")]
    MissingSegment { found: usize },

    /// The trailing zone abbreviation was missing
    #[error("no zone abbreviation in {text:?}")]
    MissingZone { text: String },

    /// The date/time part did not parse
    #[error("{text:?} does not match \"<month> <day>, <hour>:<minute> <AM/PM> <zone>\": {reason}")]
    Layout { text: String, reason: String },

    /// The wall-clock time does not exist in the source zone (DST gap)
    #[error("{text:?} does not exist in {zone}")]
    NonexistentLocalTime { text: String, zone: String },

    /// An IANA zone name could not be resolved
    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),
}

/// Writing a diagnostic artifact failed.
///
/// Diagnostic-path only: logged and swallowed by the extractor, never
/// surfaced as the primary failure.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("failed to write diagnostic artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free artifact name for {stem} after {tries} tries")]
    NameExhausted { stem: String, tries: u32 },
}

/// Invalid scrape configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("target URL is empty")]
    EmptyTargetUrl,

    #[error("selector is empty")]
    EmptySelector,

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("unknown field kind: {0} (expected event-count, last-updated or text)")]
    UnknownFieldKind(String),

    #[error("invalid locator {0:?}")]
    InvalidLocator(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

/// Errors that stop a scrape before any extraction outcome exists.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The browser session could not be started
    #[error("browser session error: {0}")]
    Session(#[from] BrowserError),

    /// Configuration was rejected before starting
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for browser collaborator calls.
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Result type alias for configuration validation.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for timestamp normalization.
pub type TimestampResult<T> = std::result::Result<T, TimestampParseError>;
