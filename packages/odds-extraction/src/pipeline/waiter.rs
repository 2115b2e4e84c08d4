//! Page waiter - navigation plus a readiness wait.
//!
//! Target pages are JavaScript-rendered single-page apps with no reliable
//! "loaded" signal exposed to the automation layer. After navigating, the
//! waiter either sleeps a fixed settle interval or polls for the target
//! element with a timeout.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::error::NavigationError;
use crate::traits::browser::BrowserSession;
use crate::types::config::WaitStrategy;
use crate::types::target::Locator;

#[derive(Debug, Clone, Copy)]
pub struct PageWaiter {
    strategy: WaitStrategy,
}

impl Default for PageWaiter {
    fn default() -> Self {
        Self::new(WaitStrategy::default())
    }
}

impl PageWaiter {
    pub fn new(strategy: WaitStrategy) -> Self {
        Self { strategy }
    }

    /// A waiter that always sleeps `settle` after navigating.
    pub fn fixed(settle: Duration) -> Self {
        Self::new(WaitStrategy::Settle(settle))
    }

    pub fn strategy(&self) -> WaitStrategy {
        self.strategy
    }

    /// Navigate to `url`, then block for the settle interval.
    ///
    /// With a polling strategy the poll timeout is used as the settle
    /// interval, since there is no element to look for.
    pub async fn await_page<S>(&self, session: &S, url: &str) -> Result<(), NavigationError>
    where
        S: BrowserSession + ?Sized,
    {
        navigate(session, url).await?;
        tokio::time::sleep(self.settle_interval()).await;
        Ok(())
    }

    /// Navigate to `url`, then wait until `locator` is likely rendered.
    ///
    /// Returns whether the element was observed. Not seeing it within the
    /// poll timeout is not an error; the reader reports absence and the
    /// extractor decides whether to retry.
    pub async fn await_element<S>(
        &self,
        session: &S,
        url: &str,
        locator: &Locator,
    ) -> Result<bool, NavigationError>
    where
        S: BrowserSession + ?Sized,
    {
        navigate(session, url).await?;

        match self.strategy {
            WaitStrategy::Settle(settle) => {
                tokio::time::sleep(settle).await;
                Ok(false)
            }
            WaitStrategy::PollForElement { interval, timeout } => {
                Ok(poll_for(session, locator, interval, timeout).await)
            }
        }
    }

    fn settle_interval(&self) -> Duration {
        match self.strategy {
            WaitStrategy::Settle(settle) => settle,
            WaitStrategy::PollForElement { timeout, .. } => timeout,
        }
    }
}

async fn navigate<S>(session: &S, url: &str) -> Result<(), NavigationError>
where
    S: BrowserSession + ?Sized,
{
    session.navigate(url).await.map_err(|source| NavigationError {
        url: url.to_string(),
        source,
    })?;

    // Informational only: a redirect is logged, never an error
    match session.current_url().await {
        Ok(landed) if landed != url => debug!(requested = url, %landed, "Navigation redirected"),
        Ok(_) => {}
        Err(e) => debug!(error = %e, "Could not read current URL"),
    }
    Ok(())
}

/// Bounded polling loop. Driver errors during polling count as "not yet".
async fn poll_for<S>(session: &S, locator: &Locator, interval: Duration, timeout: Duration) -> bool
where
    S: BrowserSession + ?Sized,
{
    let deadline = Instant::now() + timeout;
    let mut polls = 0u32;

    loop {
        polls += 1;
        match session.find_first(locator).await {
            Ok(Some(_)) => {
                debug!(selector = %locator, polls, "Element present");
                return true;
            }
            Ok(None) => {}
            Err(e) => debug!(selector = %locator, error = %e, "Poll lookup failed"),
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(selector = %locator, polls, timeout_ms = timeout.as_millis() as u64, "Element not present before timeout");
            return false;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBrowserCall, MockPage, MockSession};

    #[tokio::test]
    async fn test_navigation_failure_is_typed() {
        let session = MockSession::new(vec![MockPage::navigation_failure("dns lookup failed")]);
        let waiter = PageWaiter::fixed(Duration::ZERO);

        let err = waiter
            .await_page(&session, "https://example.com/mlb")
            .await
            .unwrap_err();

        assert_eq!(err.url, "https://example.com/mlb");
        assert!(err.to_string().contains("dns lookup failed"));
    }

    #[tokio::test]
    async fn test_fixed_settle_waits_after_navigating() {
        let session = MockSession::new(vec![MockPage::new()]);
        let waiter = PageWaiter::fixed(Duration::from_millis(30));

        let start = std::time::Instant::now();
        waiter.await_page(&session, "https://example.com").await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(
            session.calls(),
            vec![
                MockBrowserCall::Navigate {
                    url: "https://example.com".to_string()
                },
                MockBrowserCall::CurrentUrl,
            ]
        );
    }

    #[tokio::test]
    async fn test_landed_url_checked_only_after_successful_navigation() {
        let session = MockSession::new(vec![MockPage::navigation_failure("net::ERR_ABORTED")]);
        let waiter = PageWaiter::fixed(Duration::ZERO);

        assert!(waiter.await_page(&session, "https://example.com").await.is_err());
        assert!(!session.calls().contains(&MockBrowserCall::CurrentUrl));
    }

    #[tokio::test]
    async fn test_poll_returns_as_soon_as_element_present() {
        let session = MockSession::new(vec![MockPage::new().with_text(Locator::css("h2"), "3 Events")]);
        let waiter = PageWaiter::new(WaitStrategy::PollForElement {
            interval: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
        });

        let start = std::time::Instant::now();
        let seen = waiter
            .await_element(&session, "https://example.com", &Locator::css("h2"))
            .await
            .unwrap();

        assert!(seen);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_poll_times_out_without_error() {
        let session = MockSession::new(vec![MockPage::new()]);
        let waiter = PageWaiter::new(WaitStrategy::PollForElement {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(25),
        });

        let seen = waiter
            .await_element(&session, "https://example.com", &Locator::css("h2"))
            .await
            .unwrap();

        assert!(!seen);
        let lookups = session
            .calls()
            .iter()
            .filter(|c| matches!(c, MockBrowserCall::FindFirst { .. }))
            .count();
        assert!(lookups >= 2, "expected repeated polling, saw {}", lookups);
    }
}
