//! Configuration types for scraping and extraction.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::target::{ExtractionTarget, FieldKind, FormSelection, Locator};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_SETTLE_DELAY_SECONDS: u64 = 2;
pub const DEFAULT_DIAGNOSTIC_DIR: &str = "/tmp";
pub const DEFAULT_SOURCE_TIME_ZONE: &str = "America/New_York";
pub const DEFAULT_CANONICAL_TIME_ZONE: &str = "UTC";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Delay policy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Re-navigate immediately; only the wait step separates attempts
    None,

    /// `initial * multiplier^(n-1)` before attempt n+1, capped at `max`
    Exponential {
        initial_ms: u64,
        multiplier: f64,
        max_ms: u64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            initial_ms: 500,
            multiplier: 2.0,
            max_ms: 8_000,
        }
    }
}

impl Backoff {
    /// Delay to sleep after `completed` failed attempts (1-based).
    pub fn delay_after(&self, completed: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Exponential {
                initial_ms,
                multiplier,
                max_ms,
            } => {
                if completed == 0 {
                    return Duration::ZERO;
                }
                let exponent = i32::try_from(completed - 1).unwrap_or(i32::MAX);
                let ms = initial_ms as f64 * multiplier.max(1.0).powi(exponent);
                let ms = if ms.is_finite() { ms.min(max_ms as f64) } else { max_ms as f64 };
                Duration::from_millis(ms as u64)
            }
        }
    }
}

/// How the page waiter decides a freshly loaded page is ready to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Sleep a fixed interval after navigating
    Settle(Duration),

    /// Poll for the target element until present or `timeout` elapses
    PollForElement { interval: Duration, timeout: Duration },
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self::PollForElement {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECONDS),
        }
    }
}

/// Runtime configuration for the retrying extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Upper bound on navigation attempts (>= 1)
    pub max_attempts: u32,

    pub wait: WaitStrategy,

    pub backoff: Backoff,

    /// Where diagnostic artifacts are written on failure
    pub diagnostic_dir: PathBuf,

    /// Zone the page displays its timestamps in
    pub source_tz: Tz,

    /// Zone every extracted timestamp is normalized into
    pub canonical_tz: Tz,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wait: WaitStrategy::default(),
            backoff: Backoff::default(),
            diagnostic_dir: PathBuf::from(DEFAULT_DIAGNOSTIC_DIR),
            source_tz: chrono_tz::America::New_York,
            canonical_tz: chrono_tz::UTC,
        }
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_diagnostic_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostic_dir = dir.into();
        self
    }

    pub fn with_time_zones(mut self, source: Tz, canonical: Tz) -> Self {
        self.source_tz = source;
        self.canonical_tz = canonical;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }
}

/// Flat, serializable scrape configuration.
///
/// This is the option set a process entry point fills from flags or the
/// environment. `into_parts` validates it and splits it into the target
/// and the extractor runtime config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub target_url: String,

    /// Locator in textual form (`css:`, `id:`, `class:` or bare CSS)
    pub selector: String,

    pub field_kind: FieldKind,

    /// Default: 3
    pub max_attempts: u32,

    /// Fixed settle delay, also the poll timeout when polling. Default: 2
    pub settle_delay_seconds: u64,

    /// Default: /tmp
    pub diagnostic_dir: PathBuf,

    /// IANA name. Default: America/New_York
    pub source_time_zone: String,

    /// IANA name. Default: UTC
    pub canonical_time_zone: String,

    pub backoff: Backoff,

    /// Poll for the target element instead of sleeping blindly. Default: true
    pub poll_for_element: bool,

    /// Default: 250
    pub poll_interval_ms: u64,

    pub selections: Vec<FormSelection>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            selector: String::new(),
            field_kind: FieldKind::GenericText,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            settle_delay_seconds: DEFAULT_SETTLE_DELAY_SECONDS,
            diagnostic_dir: PathBuf::from(DEFAULT_DIAGNOSTIC_DIR),
            source_time_zone: DEFAULT_SOURCE_TIME_ZONE.to_string(),
            canonical_time_zone: DEFAULT_CANONICAL_TIME_ZONE.to_string(),
            backoff: Backoff::default(),
            poll_for_element: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            selections: Vec::new(),
        }
    }
}

impl ScrapeConfig {
    pub fn new(target_url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            selector: selector.into(),
            ..Default::default()
        }
    }

    pub fn with_field_kind(mut self, field_kind: FieldKind) -> Self {
        self.field_kind = field_kind;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_settle_delay_seconds(mut self, seconds: u64) -> Self {
        self.settle_delay_seconds = seconds;
        self
    }

    pub fn with_diagnostic_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostic_dir = dir.into();
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_poll_for_element(mut self, poll: bool) -> Self {
        self.poll_for_element = poll;
        self
    }

    pub fn with_selection(mut self, locator: Locator, option: impl Into<String>) -> Self {
        self.selections.push(FormSelection::new(locator, option));
        self
    }

    fn wait_strategy(&self) -> WaitStrategy {
        let settle = Duration::from_secs(self.settle_delay_seconds);
        if self.poll_for_element {
            WaitStrategy::PollForElement {
                interval: Duration::from_millis(self.poll_interval_ms.max(1)),
                timeout: settle,
            }
        } else {
            WaitStrategy::Settle(settle)
        }
    }

    /// Check every field without consuming the config.
    pub fn validate(&self) -> ConfigResult<()> {
        self.clone().into_parts().map(|_| ())
    }

    /// Validate and split into an extraction target and extractor config.
    pub fn into_parts(self) -> ConfigResult<(ExtractionTarget, ExtractorConfig)> {
        if self.target_url.trim().is_empty() {
            return Err(ConfigError::EmptyTargetUrl);
        }
        if self.selector.trim().is_empty() {
            return Err(ConfigError::EmptySelector);
        }

        let selector: Locator = self.selector.parse()?;
        let source_tz = parse_tz(&self.source_time_zone)?;
        let canonical_tz = parse_tz(&self.canonical_time_zone)?;

        let extractor = ExtractorConfig {
            max_attempts: self.max_attempts,
            wait: self.wait_strategy(),
            backoff: self.backoff,
            diagnostic_dir: self.diagnostic_dir,
            source_tz,
            canonical_tz,
        };
        extractor.validate()?;

        let mut target = ExtractionTarget::new(self.target_url.trim(), selector, self.field_kind);
        target.selections = self.selections;

        Ok((target, extractor))
    }
}

/// Resolve an IANA zone name.
pub fn parse_tz(name: &str) -> ConfigResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimeZone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ScrapeConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.settle_delay_seconds, 2);
        assert_eq!(config.diagnostic_dir, PathBuf::from("/tmp"));
        assert_eq!(config.source_time_zone, "America/New_York");
        assert_eq!(config.canonical_time_zone, "UTC");
    }

    #[test]
    fn test_into_parts_builds_target() {
        let (target, extractor) = ScrapeConfig::new("https://example.com/odds", "class:ts")
            .with_field_kind(FieldKind::LastUpdatedTimestamp)
            .with_max_attempts(5)
            .with_selection(Locator::id("bookType"), "Vegas")
            .into_parts()
            .unwrap();

        assert_eq!(target.url, "https://example.com/odds");
        assert_eq!(target.selector, Locator::class("ts"));
        assert_eq!(target.selections.len(), 1);
        assert_eq!(extractor.max_attempts, 5);
        assert_eq!(extractor.source_tz, chrono_tz::America::New_York);
        assert_eq!(
            extractor.wait,
            WaitStrategy::PollForElement {
                interval: Duration::from_millis(250),
                timeout: Duration::from_secs(2),
            }
        );
    }

    #[test]
    fn test_fixed_settle_when_polling_disabled() {
        let (_, extractor) = ScrapeConfig::new("https://example.com", "h2")
            .with_poll_for_element(false)
            .with_settle_delay_seconds(4)
            .into_parts()
            .unwrap();
        assert_eq!(extractor.wait, WaitStrategy::Settle(Duration::from_secs(4)));
    }

    #[test]
    fn test_into_parts_rejects_bad_values() {
        assert_eq!(
            ScrapeConfig::new("https://example.com", "h2")
                .with_max_attempts(0)
                .into_parts()
                .unwrap_err(),
            ConfigError::ZeroAttempts
        );
        assert_eq!(
            ScrapeConfig::new("  ", "h2").into_parts().unwrap_err(),
            ConfigError::EmptyTargetUrl
        );
        assert_eq!(
            ScrapeConfig::new("https://example.com", "").into_parts().unwrap_err(),
            ConfigError::EmptySelector
        );

        let mut config = ScrapeConfig::new("https://example.com", "h2");
        config.source_time_zone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(
            config.into_parts(),
            Err(ConfigError::UnknownTimeZone(_))
        ));
    }

    #[test]
    fn test_exponential_backoff_grows_and_caps() {
        let backoff = Backoff::Exponential {
            initial_ms: 500,
            multiplier: 2.0,
            max_ms: 3_000,
        };
        assert_eq!(backoff.delay_after(1), Duration::from_millis(500));
        assert_eq!(backoff.delay_after(2), Duration::from_millis(1_000));
        assert_eq!(backoff.delay_after(3), Duration::from_millis(2_000));
        assert_eq!(backoff.delay_after(4), Duration::from_millis(3_000));
        assert_eq!(backoff.delay_after(200), Duration::from_millis(3_000));
        assert_eq!(Backoff::None.delay_after(3), Duration::ZERO);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ScrapeConfig = serde_json::from_str(
            r#"{"target_url": "https://example.com", "selector": "id:count", "field_kind": "event-count"}"#,
        )
        .unwrap();
        assert_eq!(config.field_kind, FieldKind::EventCount);
        assert_eq!(config.max_attempts, 3);
        assert!(config.poll_for_element);
    }
}
