//! Compiled-in site targets.
//!
//! Each preset is a full `ScrapeConfig`, so a caller can override any field
//! (attempts, delays, diagnostics directory) before running it.

use crate::error::{ConfigError, ConfigResult};
use crate::types::config::ScrapeConfig;
use crate::types::target::{FieldKind, Locator};

pub const BOVADA_MLB: &str = "bovada-mlb";
pub const COVERS_MLB: &str = "covers-mlb";

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &[BOVADA_MLB, COVERS_MLB];

/// Number of MLB events listed on Bovada's game lines page.
pub fn bovada_mlb_event_count() -> ScrapeConfig {
    ScrapeConfig::new(
        "https://sports.bovada.lv/baseball/mlb/game-lines-market-group",
        "css:#spaNavigationComponents_content_center > div > section > div > div > h2",
    )
    .with_field_kind(FieldKind::EventCount)
}

/// "Last updated" time of the covers.com MLB moneyline odds table.
///
/// The page keeps its table options in four `<select>` inputs; they are
/// set to Vegas books, current competition, moneyline, and American odds
/// after every load.
pub fn covers_mlb_moneyline_last_updated() -> ScrapeConfig {
    ScrapeConfig::new(
        "https://www.covers.com/Sports/MLB/Odds/US/MONEYLINE/competition/Online/ML",
        "class:covers-CoversOdds-lastUpdated",
    )
    .with_field_kind(FieldKind::LastUpdatedTimestamp)
    .with_selection(Locator::id("bookType"), "Vegas")
    .with_selection(Locator::id("oddScope"), "competition")
    .with_selection(Locator::id("oddType"), "MONEYLINE")
    .with_selection(Locator::id("oddConverter"), "ML")
}

pub fn by_name(name: &str) -> ConfigResult<ScrapeConfig> {
    match name.trim().to_ascii_lowercase().as_str() {
        BOVADA_MLB => Ok(bovada_mlb_event_count()),
        COVERS_MLB => Ok(covers_mlb_moneyline_last_updated()),
        other => Err(ConfigError::UnknownPreset(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for name in NAMES {
            let config = by_name(name).unwrap();
            assert!(config.into_parts().is_ok(), "{} should validate", name);
        }
    }

    #[test]
    fn test_covers_selections_in_page_order() {
        let (target, _) = covers_mlb_moneyline_last_updated().into_parts().unwrap();
        let ids: Vec<_> = target.selections.iter().map(|s| s.locator.value()).collect();
        assert_eq!(ids, ["bookType", "oddScope", "oddType", "oddConverter"]);
        assert_eq!(target.selector, Locator::class("covers-CoversOdds-lastUpdated"));
    }

    #[test]
    fn test_unknown_preset() {
        assert_eq!(
            by_name("pinnacle").unwrap_err(),
            ConfigError::UnknownPreset("pinnacle".to_string())
        );
    }
}
