//! ChromeDriver-backed browser using `thirtyfour`.
//!
//! Every session is a separate Chrome instance started by the WebDriver
//! server at `server_url`. Closing the session quits the browser.

use async_trait::async_trait;
use thirtyfour::prelude::*;
use tracing::debug;

use crate::error::{BrowserError, BrowserResult};
use crate::traits::browser::{BrowserDriver, BrowserSession, ElementHandle};
use crate::types::target::Locator;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

const CHROME_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--window-size=1920,1080",
    "--disable-blink-features=AutomationControlled",
];

/// Starts Chrome sessions through a WebDriver server.
#[derive(Debug, Clone)]
pub struct WebDriverBrowser {
    server_url: String,
    headless: bool,
}

impl Default for WebDriverBrowser {
    fn default() -> Self {
        Self::new(DEFAULT_WEBDRIVER_URL)
    }
}

impl WebDriverBrowser {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            headless: true,
        }
    }

    /// Show the browser window (useful when debugging selectors).
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn chrome_args(&self) -> Vec<&'static str> {
        let mut args = Vec::with_capacity(CHROME_ARGS.len() + 1);
        if self.headless {
            args.push("--headless=new");
        }
        args.extend_from_slice(CHROME_ARGS);
        args
    }
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
    type Session = WebDriverSession;

    async fn start_session(&self) -> BrowserResult<WebDriverSession> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option("args", self.chrome_args())
            .map_err(|e| BrowserError::SessionStart(Box::new(e)))?;

        let driver = WebDriver::new(self.server_url.as_str(), caps)
            .await
            .map_err(|e| BrowserError::SessionStart(Box::new(e)))?;

        debug!(server = %self.server_url, headless = self.headless, "WebDriver session started");
        Ok(WebDriverSession { driver: Some(driver) })
    }

    fn name(&self) -> &str {
        "chromedriver"
    }
}

/// One Chrome window. `None` once closed.
pub struct WebDriverSession {
    driver: Option<WebDriver>,
}

impl WebDriverSession {
    fn driver(&self) -> BrowserResult<&WebDriver> {
        self.driver.as_ref().ok_or(BrowserError::SessionClosed)
    }
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::Css(v) => By::Css(v.as_str()),
        Locator::Id(v) => By::Id(v.as_str()),
        Locator::Class(v) => By::ClassName(v.as_str()),
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        self.driver()?.goto(url).await.map_err(BrowserError::driver)
    }

    async fn find_first(&self, locator: &Locator) -> BrowserResult<Option<Box<dyn ElementHandle>>> {
        let found = self
            .driver()?
            .find_all(by(locator))
            .await
            .map_err(BrowserError::driver)?;

        Ok(found
            .into_iter()
            .next()
            .map(|element| Box::new(WebDriverElement { element }) as Box<dyn ElementHandle>))
    }

    async fn full_markup(&self) -> BrowserResult<String> {
        self.driver()?.source().await.map_err(BrowserError::driver)
    }

    async fn current_url(&self) -> BrowserResult<String> {
        let url = self.driver()?.current_url().await.map_err(BrowserError::driver)?;
        Ok(url.to_string())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        match self.driver.take() {
            Some(driver) => driver.quit().await.map_err(BrowserError::driver),
            None => Ok(()),
        }
    }
}

struct WebDriverElement {
    element: WebElement,
}

#[async_trait]
impl ElementHandle for WebDriverElement {
    async fn text(&self) -> BrowserResult<String> {
        self.element.text().await.map_err(BrowserError::driver)
    }

    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
        self.element.attr(name).await.map_err(BrowserError::driver)
    }

    async fn select_option(&self, option: &str) -> BrowserResult<()> {
        let xpath = format!(".//option[normalize-space(.)={}]", xpath_literal(option.trim()));
        let choice = self
            .element
            .find(By::XPath(xpath.as_str()))
            .await
            .map_err(BrowserError::driver)?;
        choice.click().await.map_err(BrowserError::driver)
    }
}

/// Quote `s` as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so text holding both quote kinds is
/// built with `concat()`.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{}'", s);
    }
    if !s.contains('"') {
        return format!("\"{}\"", s);
    }

    let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
