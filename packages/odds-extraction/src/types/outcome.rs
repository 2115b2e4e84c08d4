//! Extraction outcomes - the terminal success and failure values.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::error::TimestampParseError;
use crate::types::target::ExtractionTarget;

/// The typed value parsed out of the raw element text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParsedValue {
    Count(u64),
    #[serde(serialize_with = "serialize_rfc3339")]
    Timestamp(DateTime<Tz>),
    Text(String),
}

impl ParsedValue {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Tz>> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}", n),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Text(s) => f.write_str(s),
        }
    }
}

fn serialize_rfc3339<S: Serializer>(ts: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339())
}

/// A successful extraction.
///
/// Only built from non-blank raw text; fields are read-only after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    run_id: Uuid,
    raw_text: String,
    value: ParsedValue,
    attempts: u32,
    extracted_at: DateTime<Utc>,
}

impl ExtractionResult {
    /// Returns `None` for blank text or a zero attempt count.
    pub(crate) fn new(
        run_id: Uuid,
        raw_text: impl Into<String>,
        value: ParsedValue,
        attempts: u32,
    ) -> Option<Self> {
        let raw_text = raw_text.into();
        if raw_text.trim().is_empty() || attempts == 0 {
            return None;
        }
        Some(Self {
            run_id,
            raw_text,
            value,
            attempts,
            extracted_at: Utc::now(),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Element text exactly as read, untrimmed.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn value(&self) -> &ParsedValue {
        &self.value
    }

    /// Navigation attempts used, at least 1.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }
}

/// Why an extraction ended without a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum FailureCause {
    /// Every attempt navigated but never read usable text
    Exhausted {
        /// Last navigation or driver error, if the final attempts hit one
        last_error: Option<String>,
    },

    /// Text was present but the timestamp layout did not match
    TimestampParse {
        #[serde(serialize_with = "serialize_display")]
        error: TimestampParseError,
    },

    /// The cancellation token fired
    Cancelled,
}

fn serialize_display<S: Serializer, T: fmt::Display>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { last_error: Some(e) } => write!(f, "attempts exhausted ({})", e),
            Self::Exhausted { last_error: None } => f.write_str("attempts exhausted"),
            Self::TimestampParse { error } => write!(f, "timestamp parse error: {}", error),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A terminal extraction failure with full context for the caller.
///
/// No retry state survives past this value.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("extracting {} from {} failed after {attempts} attempt(s): {cause}", .target.field_kind, .target.url)]
pub struct ExtractionFailure {
    pub run_id: Uuid,
    pub target: ExtractionTarget,
    pub attempts: u32,
    /// Last text read from the element, possibly empty
    pub last_raw_text: String,
    /// Set only when the page markup was captured successfully
    pub diagnostic_path: Option<PathBuf>,
    pub cause: FailureCause,
}

impl ExtractionFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, FailureCause::Cancelled)
    }
}

/// Outcome of one extraction run.
pub type ExtractionOutcome = std::result::Result<ExtractionResult, ExtractionFailure>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::target::Locator;
    use chrono::TimeZone;

    #[test]
    fn test_result_rejects_blank_text() {
        let run_id = Uuid::now_v7();
        assert!(ExtractionResult::new(run_id, "", ParsedValue::Text(String::new()), 1).is_none());
        assert!(
            ExtractionResult::new(run_id, " \n\t", ParsedValue::Text(String::new()), 1).is_none()
        );
        assert!(ExtractionResult::new(run_id, "2 Events", ParsedValue::Count(2), 0).is_none());

        let result = ExtractionResult::new(run_id, "2 Events", ParsedValue::Count(2), 1).unwrap();
        assert_eq!(result.raw_text(), "2 Events");
        assert_eq!(result.value().as_count(), Some(2));
        assert_eq!(result.attempts(), 1);
    }

    #[test]
    fn test_timestamp_value_serializes_as_rfc3339() {
        let ts = chrono_tz::UTC.with_ymd_and_hms(2024, 1, 15, 20, 4, 0).unwrap();
        let json = serde_json::to_value(ParsedValue::Timestamp(ts)).unwrap();
        assert_eq!(json["kind"], "timestamp");
        assert_eq!(json["value"], "2024-01-15T20:04:00+00:00");
    }

    #[test]
    fn test_failure_message_names_target() {
        let failure = ExtractionFailure {
            run_id: Uuid::now_v7(),
            target: ExtractionTarget::event_count("https://example.com/mlb", Locator::css("h2")),
            attempts: 3,
            last_raw_text: String::new(),
            diagnostic_path: None,
            cause: FailureCause::Exhausted { last_error: None },
        };

        let message = failure.to_string();
        assert!(message.contains("event-count"));
        assert!(message.contains("https://example.com/mlb"));
        assert!(message.contains("3 attempt(s)"));
        assert!(!failure.is_cancelled());
    }
}
