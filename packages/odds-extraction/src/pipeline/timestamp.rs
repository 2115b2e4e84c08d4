//! Timestamp normalizer for "last updated" displays.
//!
//! Odds pages show when their lines last moved as two lines of text, the
//! second shaped like `Jan 2, 3:04 PM ET`, with no year. The normalizer
//! infers the year from "now" in the source zone, parses the wall-clock
//! time in that zone, and converts the instant into the canonical zone.
//!
//! # Year inference
//!
//! The current year in the source zone, the year before, and the year after
//! are all tried. The latest candidate that is not more than one day in the
//! future wins. A December timestamp read on January 1st therefore lands in
//! the previous year instead of eleven months ahead. Candidates are compared
//! as wall-clock readings in the source zone; a reading that falls in the
//! chosen year's spring-forward gap is an error, not a reason to pick
//! another year.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{TimestampParseError, TimestampResult};

/// Layout of the second segment once a year is prepended and the zone
/// abbreviation removed: `2024 Jan 2, 3:04 PM`.
const LAYOUT: &str = "%Y %b %d, %I:%M %p";

/// Clock skew allowed between the page and this process, in days.
const FUTURE_TOLERANCE_DAYS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampNormalizer {
    source: Tz,
    canonical: Tz,
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self::new(chrono_tz::America::New_York, chrono_tz::UTC)
    }
}

impl TimestampNormalizer {
    pub fn new(source: Tz, canonical: Tz) -> Self {
        Self { source, canonical }
    }

    /// Build from IANA zone names.
    pub fn from_names(source: &str, canonical: &str) -> TimestampResult<Self> {
        Ok(Self::new(parse_zone(source)?, parse_zone(canonical)?))
    }

    pub fn source(&self) -> Tz {
        self.source
    }

    pub fn canonical(&self) -> Tz {
        self.canonical
    }

    /// Normalize relative to the current time.
    pub fn normalize(&self, display_text: &str) -> TimestampResult<DateTime<Tz>> {
        self.normalize_at(display_text, Utc::now())
    }

    /// Normalize relative to `now`.
    pub fn normalize_at(&self, display_text: &str, now: DateTime<Utc>) -> TimestampResult<DateTime<Tz>> {
        let segments: Vec<&str> = display_text.split('\n').collect();
        if segments.len() < 2 {
            return Err(TimestampParseError::MissingSegment {
                found: segments.len(),
            });
        }

        let shown = segments[1].trim();
        let wall_clock = strip_zone(shown)?;

        let now_local = now.with_timezone(&self.source).naive_local();
        let year = now_local.year();
        let mut layout_error = None;
        let mut candidates = Vec::with_capacity(3);

        for candidate_year in [year - 1, year, year + 1] {
            match NaiveDateTime::parse_from_str(&format!("{} {}", candidate_year, wall_clock), LAYOUT) {
                Ok(naive) => candidates.push(naive),
                Err(e) => {
                    // Feb 29 only parses in leap years, so keep trying
                    if candidate_year == year || layout_error.is_none() {
                        layout_error = Some(e.to_string());
                    }
                }
            }
        }

        // The year is chosen on the wall-clock reading; zone rules apply after
        let latest_allowed = now_local + Duration::days(FUTURE_TOLERANCE_DAYS);
        let chosen = candidates
            .iter()
            .filter(|c| **c <= latest_allowed)
            .max()
            .or_else(|| candidates.iter().min())
            .cloned();

        let Some(naive) = chosen else {
            return Err(TimestampParseError::Layout {
                text: shown.to_string(),
                reason: layout_error.unwrap_or_else(|| "no candidate year".to_string()),
            });
        };

        // Ambiguous wall-clock times (DST fall-back) take the earlier instant
        match self.source.from_local_datetime(&naive).earliest() {
            Some(local) => Ok(local.with_timezone(&self.canonical)),
            None => Err(TimestampParseError::NonexistentLocalTime {
                text: shown.to_string(),
                zone: self.source.name().to_string(),
            }),
        }
    }
}

/// Normalize `display_text` shown in `source_tz` into `canonical_tz`.
pub fn normalize(display_text: &str, source_tz: &str, canonical_tz: &str) -> TimestampResult<DateTime<Tz>> {
    TimestampNormalizer::from_names(source_tz, canonical_tz)?.normalize(display_text)
}

fn parse_zone(name: &str) -> TimestampResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TimestampParseError::UnknownTimeZone(name.to_string()))
}

/// Drop the trailing zone abbreviation (`ET`, `EST`, `EDT`...).
///
/// The abbreviation is informational: the wall-clock time is always
/// interpreted in the configured source zone.
fn strip_zone(shown: &str) -> TimestampResult<&str> {
    let missing = || TimestampParseError::MissingZone {
        text: shown.to_string(),
    };

    let (wall_clock, zone) = shown.rsplit_once(char::is_whitespace).ok_or_else(missing)?;
    let is_abbrev = (1..=5).contains(&zone.len())
        && zone.chars().all(|c| c.is_ascii_alphabetic())
        && !zone.eq_ignore_ascii_case("AM")
        && !zone.eq_ignore_ascii_case("PM");

    if !is_abbrev {
        return Err(missing());
    }
    Ok(wall_clock.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn new_york_to_utc() -> TimestampNormalizer {
        TimestampNormalizer::from_names("America/New_York", "UTC").unwrap()
    }

    #[test]
    fn test_winter_time_converts_to_utc() {
        let ts = new_york_to_utc()
            .normalize_at("Header\nJan 15, 3:04 PM ET", utc(2024, 6, 1, 12, 0))
            .unwrap();

        let expected = DateTime::parse_from_rfc3339("2024-01-15T15:04:00-05:00").unwrap();
        assert_eq!(ts, expected);
        assert_eq!(ts.timezone(), chrono_tz::UTC);
        assert_eq!(ts.to_rfc3339(), "2024-01-15T20:04:00+00:00");
    }

    #[test]
    fn test_summer_time_uses_daylight_offset() {
        let ts = new_york_to_utc()
            .normalize_at("Last Updated\nJul 4, 9:30 AM ET", utc(2024, 7, 4, 18, 0))
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-07-04T13:30:00+00:00");
    }

    #[test]
    fn test_single_digit_day_and_hour() {
        let ts = new_york_to_utc()
            .normalize_at("Updated\nJan 2, 3:04 PM ET", utc(2024, 1, 3, 0, 0))
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-02T20:04:00+00:00");
    }

    #[test]
    fn test_single_line_fails() {
        let err = new_york_to_utc()
            .normalize_at("Jan 15, 3:04 PM ET", utc(2024, 6, 1, 12, 0))
            .unwrap_err();
        assert_eq!(err, TimestampParseError::MissingSegment { found: 1 });
    }

    #[test]
    fn test_layout_mismatch_fails() {
        let err = new_york_to_utc()
            .normalize_at("Updated\n15 January at 15:04 ET", utc(2024, 6, 1, 12, 0))
            .unwrap_err();
        assert!(matches!(err, TimestampParseError::Layout { .. }), "{:?}", err);
    }

    #[test]
    fn test_missing_zone_fails() {
        let err = new_york_to_utc()
            .normalize_at("Updated\nJan 15, 3:04 PM", utc(2024, 6, 1, 12, 0))
            .unwrap_err();
        assert!(matches!(err, TimestampParseError::MissingZone { .. }));
    }

    #[test]
    fn test_december_read_on_new_years_day_is_previous_year() {
        // 05:00 UTC on Jan 1 is midnight in New York
        let ts = new_york_to_utc()
            .normalize_at("Updated\nDec 31, 11:50 PM ET", utc(2024, 1, 1, 5, 0))
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T04:50:00+00:00");
        assert_eq!(ts.with_timezone(&chrono_tz::America::New_York).year(), 2023);
    }

    #[test]
    fn test_year_comes_from_source_zone_not_utc() {
        // Still Dec 31 in New York although UTC already says 2025
        let ts = new_york_to_utc()
            .normalize_at("Updated\nDec 31, 8:00 PM ET", utc(2025, 1, 1, 2, 0))
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-01-01T01:00:00+00:00");
    }

    #[test]
    fn test_slight_future_within_tolerance_keeps_current_year() {
        let ts = new_york_to_utc()
            .normalize_at("Updated\nMar 10, 1:00 PM ET", utc(2024, 3, 10, 12, 0))
            .unwrap();
        assert_eq!(ts.with_timezone(&chrono_tz::America::New_York).year(), 2024);
    }

    #[test]
    fn test_leap_day_resolves_to_leap_year() {
        let ts = new_york_to_utc()
            .normalize_at("Updated\nFeb 29, 10:00 AM ET", utc(2025, 1, 10, 12, 0))
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-02-29T15:00:00+00:00");
    }

    #[test]
    fn test_spring_forward_gap_is_rejected_in_current_year() {
        // 2:30 AM never happens in New York on 2024-03-10
        let err = new_york_to_utc()
            .normalize_at("Updated\nMar 10, 2:30 AM ET", utc(2024, 3, 10, 12, 0))
            .unwrap_err();
        assert_eq!(
            err,
            TimestampParseError::NonexistentLocalTime {
                text: "Mar 10, 2:30 AM ET".to_string(),
                zone: "America/New_York".to_string(),
            }
        );
    }

    #[test]
    fn test_canonical_zone_is_honoured() {
        let normalizer = TimestampNormalizer::new(chrono_tz::America::New_York, chrono_tz::Europe::London);
        let ts = normalizer
            .normalize_at("Updated\nJan 15, 3:04 PM ET", utc(2024, 6, 1, 12, 0))
            .unwrap();
        assert_eq!(ts.timezone(), chrono_tz::Europe::London);
        assert_eq!(ts.to_rfc3339(), "2024-01-15T20:04:00+00:00");
    }

    #[test]
    fn test_unknown_zone_name() {
        assert_eq!(
            TimestampNormalizer::from_names("Eastern", "UTC").unwrap_err(),
            TimestampParseError::UnknownTimeZone("Eastern".to_string())
        );
        assert!(normalize("Updated\nJan 15, 3:04 PM ET", "America/New_York", "Nowhere").is_err());
    }
}
