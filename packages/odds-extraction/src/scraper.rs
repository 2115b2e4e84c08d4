//! Session-scoped scraping.
//!
//! A `Scraper` owns a browser driver and runs one extraction per session.
//! The session is closed on every exit path; a close failure is logged and
//! never replaces the extraction outcome.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ConfigResult, ScrapeError};
use crate::pipeline::RetryingExtractor;
use crate::traits::browser::{BrowserDriver, BrowserSession};
use crate::types::config::{ExtractorConfig, ScrapeConfig};
use crate::types::outcome::ExtractionOutcome;
use crate::types::target::ExtractionTarget;

pub struct Scraper<D: BrowserDriver> {
    driver: D,
    extractor: RetryingExtractor,
}

impl<D: BrowserDriver> Scraper<D> {
    pub fn new(driver: D, config: ExtractorConfig) -> ConfigResult<Self> {
        Ok(Self {
            driver,
            extractor: RetryingExtractor::new(config)?,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn extractor(&self) -> &RetryingExtractor {
        &self.extractor
    }

    /// Start a session, extract `target`, close the session.
    ///
    /// Only a failure to start the session is an `Err`; every extraction
    /// outcome, success or failure, comes back inside `Ok`.
    pub async fn run(
        &self,
        target: &ExtractionTarget,
        cancel: &CancellationToken,
    ) -> Result<ExtractionOutcome, ScrapeError> {
        info!(driver = self.driver.name(), url = %target.url, "Starting browser session");
        let mut session = self.driver.start_session().await?;

        let outcome = self.extractor.extract_with_cancel(&session, target, cancel).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }
        Ok(outcome)
    }
}

/// Validate `config`, then run it once with `driver`.
pub async fn scrape<D: BrowserDriver>(
    driver: D,
    config: ScrapeConfig,
    cancel: &CancellationToken,
) -> Result<ExtractionOutcome, ScrapeError> {
    let (target, extractor) = config.into_parts()?;
    Scraper::new(driver, extractor)?.run(&target, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBrowserCall, MockDriver, MockPage};
    use crate::types::config::{Backoff, WaitStrategy};
    use crate::types::target::Locator;
    use std::time::Duration;

    fn config(dir: &std::path::Path) -> ExtractorConfig {
        ExtractorConfig::new()
            .with_wait(WaitStrategy::Settle(Duration::ZERO))
            .with_backoff(Backoff::None)
            .with_diagnostic_dir(dir)
    }

    #[tokio::test]
    async fn test_session_closed_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let driver = MockDriver::new(vec![MockPage::new().with_text(Locator::css("h2"), "9 Events")]);
        let scraper = Scraper::new(driver.clone(), config(dir.path())).unwrap();
        let target = ExtractionTarget::event_count("https://example.com", Locator::css("h2"));

        let outcome = scraper.run(&target, &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.unwrap().value().as_count(), Some(9));
        assert_eq!(driver.count(&MockBrowserCall::StartSession), 1);
        assert_eq!(driver.count(&MockBrowserCall::Close), 1);
        assert_eq!(driver.calls().last(), Some(&MockBrowserCall::Close));
    }

    #[tokio::test]
    async fn test_session_closed_after_exhaustion() {
        let dir = tempfile::tempdir().unwrap();
        let driver = MockDriver::new(vec![MockPage::navigation_failure("net::ERR_NAME_NOT_RESOLVED")]);
        let scraper = Scraper::new(driver.clone(), config(dir.path())).unwrap();
        let target = ExtractionTarget::event_count("https://example.invalid", Locator::css("h2"));

        let failure = scraper
            .run(&target, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap_err();

        assert_eq!(failure.attempts, 3);
        assert_eq!(driver.count(&MockBrowserCall::Close), 1);
    }

    #[tokio::test]
    async fn test_start_failure_is_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let driver = MockDriver::failing_start("chromedriver not running");
        let scraper = Scraper::new(driver.clone(), config(dir.path())).unwrap();
        let target = ExtractionTarget::event_count("https://example.com", Locator::css("h2"));

        let err = scraper.run(&target, &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Session(_)));
        assert_eq!(driver.count(&MockBrowserCall::Close), 0);
    }

    #[tokio::test]
    async fn test_scrape_rejects_invalid_config_before_starting() {
        let driver = MockDriver::new(vec![]);
        let err = scrape(
            driver.clone(),
            ScrapeConfig::new("https://example.com", "h2").with_max_attempts(0),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ScrapeError::Config(_)));
        assert!(driver.calls().is_empty());
    }
}
