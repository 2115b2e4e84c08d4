//! Browser automation collaborator traits.
//!
//! The extraction core never drives a browser directly. It consumes this
//! narrow interface, which a WebDriver client (see `drivers::webdriver`) or
//! a scripted mock (see `testing`) implements.
//!
//! # Usage
//!
//! ```rust,ignore
//! use odds_extraction::traits::browser::{BrowserDriver, BrowserSession};
//! use odds_extraction::types::target::Locator;
//!
//! let mut session = driver.start_session().await?;
//! session.navigate("https://example.com").await?;
//! if let Some(el) = session.find_first(&Locator::css("h2")).await? {
//!     println!("{}", el.text().await?);
//! }
//! session.close().await?;
//! ```

use async_trait::async_trait;

use crate::error::BrowserResult;
use crate::types::target::Locator;

/// Starts browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    type Session: BrowserSession;

    /// Open a new, exclusively owned session.
    async fn start_session(&self) -> BrowserResult<Self::Session>;

    /// Driver name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// One controlled browser tab.
///
/// Not reentrant: a session is driven by a single sequential workflow.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url`. Fails on network error, invalid URL, or driver disconnect.
    async fn navigate(&self, url: &str) -> BrowserResult<()>;

    /// First element matching `locator`, or `None` when nothing matches.
    async fn find_first(&self, locator: &Locator) -> BrowserResult<Option<Box<dyn ElementHandle>>>;

    /// Full markup of the current page.
    async fn full_markup(&self) -> BrowserResult<String>;

    /// URL the session currently shows.
    async fn current_url(&self) -> BrowserResult<String>;

    /// Release the session. Later calls fail with `SessionClosed`.
    async fn close(&mut self) -> BrowserResult<()>;
}

/// A located DOM element.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Rendered text, untrimmed.
    async fn text(&self) -> BrowserResult<String>;

    /// Attribute value, or `None` when the attribute is not set.
    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>>;

    /// Choose the `<option>` whose visible text equals `option`.
    async fn select_option(&self, option: &str) -> BrowserResult<()>;
}
