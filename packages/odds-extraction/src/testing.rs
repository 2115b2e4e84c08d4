//! Testing utilities including mock browser implementations.
//!
//! These are useful for testing applications that use the extraction
//! library without launching a real browser. A `MockSession` is scripted
//! with one `MockPage` per navigation; the last page repeats once the
//! script runs out.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{BrowserError, BrowserResult};
use crate::traits::browser::{BrowserDriver, BrowserSession, ElementHandle};
use crate::types::target::Locator;

/// Record of a call made to the mock browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBrowserCall {
    StartSession,
    Navigate { url: String },
    FindFirst { locator: Locator },
    Text { locator: Locator },
    Attribute { locator: Locator, name: String },
    SelectOption { locator: Locator, option: String },
    FullMarkup,
    CurrentUrl,
    Close,
}

/// A scripted element on a mock page.
#[derive(Debug, Clone)]
pub struct MockElement {
    /// `Err` simulates a driver failure when reading text
    pub text: Result<String, String>,
    pub attributes: HashMap<String, String>,
    /// Visible texts of `<option>` children, for select elements
    pub options: Vec<String>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            text: Ok(String::new()),
            attributes: HashMap::new(),
            options: Vec::new(),
        }
    }
}

impl MockElement {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Ok(text.into()),
            ..Default::default()
        }
    }
}

/// What the session shows after one navigation.
#[derive(Debug, Clone)]
pub struct MockPage {
    /// `Err` makes the navigation itself fail
    pub navigation: Result<(), String>,
    pub elements: HashMap<Locator, MockElement>,
    pub markup: Result<String, String>,
}

impl Default for MockPage {
    fn default() -> Self {
        Self {
            navigation: Ok(()),
            elements: HashMap::new(),
            markup: Ok("<html><body></body></html>".to_string()),
        }
    }
}

impl MockPage {
    /// A page that loads but contains no elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// A page whose navigation fails with `message`.
    pub fn navigation_failure(message: impl Into<String>) -> Self {
        Self {
            navigation: Err(message.into()),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, locator: Locator, text: impl Into<String>) -> Self {
        self.elements
            .entry(locator)
            .or_default()
            .text = Ok(text.into());
        self
    }

    /// The element exists but reading its text fails.
    pub fn with_text_error(mut self, locator: Locator, message: impl Into<String>) -> Self {
        self.elements
            .entry(locator)
            .or_default()
            .text = Err(message.into());
        self
    }

    pub fn with_attribute(
        mut self,
        locator: Locator,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.elements
            .entry(locator)
            .or_insert_with(|| MockElement::with_text(""))
            .attributes
            .insert(name.into(), value.into());
        self
    }

    /// A `<select>` element offering `options`.
    pub fn with_select(mut self, locator: Locator, options: &[&str]) -> Self {
        let element = self
            .elements
            .entry(locator)
            .or_insert_with(|| MockElement::with_text(""));
        element.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = Ok(markup.into());
        self
    }

    pub fn with_markup_error(mut self, message: impl Into<String>) -> Self {
        self.markup = Err(message.into());
        self
    }
}

#[derive(Debug, Default)]
struct SessionState {
    pages: Vec<MockPage>,
    navigations: usize,
    current_url: String,
    /// Selected option per locator; cleared on every navigation
    selected: HashMap<Locator, String>,
    closed: bool,
}

impl SessionState {
    fn current_page(&self) -> Option<&MockPage> {
        if self.navigations == 0 || self.pages.is_empty() {
            return None;
        }
        let idx = (self.navigations - 1).min(self.pages.len() - 1);
        self.pages.get(idx)
    }

    fn ensure_open(&self) -> BrowserResult<()> {
        if self.closed {
            Err(BrowserError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

/// A scripted browser session for testing.
///
/// Clones share state, so a test can keep a handle while the code under
/// test owns the session.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<RwLock<SessionState>>,
    calls: Arc<RwLock<Vec<MockBrowserCall>>>,
}

impl MockSession {
    /// Create a session that shows `pages[n]` after the (n+1)th navigation.
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState {
                pages,
                ..Default::default()
            })),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn with_calls(pages: Vec<MockPage>, calls: Arc<RwLock<Vec<MockBrowserCall>>>) -> Self {
        let session = Self::new(pages);
        Self { calls, ..session }
    }

    fn record(&self, call: MockBrowserCall) {
        self.calls.write().unwrap().push(call);
    }

    /// Get all calls made to this session.
    pub fn calls(&self) -> Vec<MockBrowserCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of navigations performed (successful or not).
    pub fn navigation_count(&self) -> usize {
        self.state.read().unwrap().navigations
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().unwrap().closed
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        self.record(MockBrowserCall::Navigate {
            url: url.to_string(),
        });

        let mut state = self.state.write().unwrap();
        state.ensure_open()?;
        state.navigations += 1;
        state.selected.clear();

        let outcome = state
            .current_page()
            .map(|p| p.navigation.clone())
            .unwrap_or(Ok(()));

        match outcome {
            Ok(()) => {
                state.current_url = url.to_string();
                Ok(())
            }
            Err(message) => Err(BrowserError::driver(message)),
        }
    }

    async fn find_first(&self, locator: &Locator) -> BrowserResult<Option<Box<dyn ElementHandle>>> {
        self.record(MockBrowserCall::FindFirst {
            locator: locator.clone(),
        });

        let state = self.state.read().unwrap();
        state.ensure_open()?;

        let found = state
            .current_page()
            .and_then(|p| p.elements.get(locator))
            .cloned();

        Ok(found.map(|element| {
            Box::new(MockElementHandle {
                locator: locator.clone(),
                element,
                session: self.clone(),
            }) as Box<dyn ElementHandle>
        }))
    }

    async fn full_markup(&self) -> BrowserResult<String> {
        self.record(MockBrowserCall::FullMarkup);

        let state = self.state.read().unwrap();
        state.ensure_open()?;

        match state.current_page() {
            Some(page) => page.markup.clone().map_err(BrowserError::driver),
            None => Ok(String::new()),
        }
    }

    async fn current_url(&self) -> BrowserResult<String> {
        self.record(MockBrowserCall::CurrentUrl);

        let state = self.state.read().unwrap();
        state.ensure_open()?;
        Ok(state.current_url.clone())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.record(MockBrowserCall::Close);
        self.state.write().unwrap().closed = true;
        Ok(())
    }
}

struct MockElementHandle {
    locator: Locator,
    element: MockElement,
    session: MockSession,
}

#[async_trait]
impl ElementHandle for MockElementHandle {
    async fn text(&self) -> BrowserResult<String> {
        self.session.record(MockBrowserCall::Text {
            locator: self.locator.clone(),
        });
        self.element.text.clone().map_err(BrowserError::driver)
    }

    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
        self.session.record(MockBrowserCall::Attribute {
            locator: self.locator.clone(),
            name: name.to_string(),
        });

        if name == "value" {
            if let Some(selected) = self.session.state.read().unwrap().selected.get(&self.locator) {
                return Ok(Some(selected.clone()));
            }
        }
        Ok(self.element.attributes.get(name).cloned())
    }

    async fn select_option(&self, option: &str) -> BrowserResult<()> {
        self.session.record(MockBrowserCall::SelectOption {
            locator: self.locator.clone(),
            option: option.to_string(),
        });

        if !self.element.options.iter().any(|o| o == option) {
            return Err(BrowserError::driver(format!(
                "no option {:?} under {}",
                option, self.locator
            )));
        }
        self.session
            .state
            .write()
            .unwrap()
            .selected
            .insert(self.locator.clone(), option.to_string());
        Ok(())
    }
}

/// A mock driver handing out scripted sessions.
///
/// Every session started gets a fresh copy of the page script; calls from
/// all sessions are recorded in one list.
#[derive(Clone, Default)]
pub struct MockDriver {
    pages: Vec<MockPage>,
    start_failure: Option<String>,
    calls: Arc<RwLock<Vec<MockBrowserCall>>>,
}

impl MockDriver {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Make `start_session` fail with `message`.
    pub fn failing_start(message: impl Into<String>) -> Self {
        Self {
            start_failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Get all calls made through this driver and its sessions.
    pub fn calls(&self) -> Vec<MockBrowserCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &MockBrowserCall) -> usize {
        self.calls.read().unwrap().iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    type Session = MockSession;

    async fn start_session(&self) -> BrowserResult<MockSession> {
        self.calls.write().unwrap().push(MockBrowserCall::StartSession);

        if let Some(message) = &self.start_failure {
            return Err(BrowserError::SessionStart(message.clone().into()));
        }
        Ok(MockSession::with_calls(self.pages.clone(), Arc::clone(&self.calls)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_advances_per_navigation_and_repeats_last() {
        let h2 = Locator::css("h2");
        let session = MockSession::new(vec![
            MockPage::new(),
            MockPage::new().with_text(h2.clone(), "4 Events"),
        ]);

        assert!(session.find_first(&h2).await.unwrap().is_none());

        session.navigate("https://example.com").await.unwrap();
        assert!(session.find_first(&h2).await.unwrap().is_none());

        session.navigate("https://example.com").await.unwrap();
        let el = session.find_first(&h2).await.unwrap().unwrap();
        assert_eq!(el.text().await.unwrap(), "4 Events");

        session.navigate("https://example.com").await.unwrap();
        assert!(session.find_first(&h2).await.unwrap().is_some());
        assert_eq!(session.navigation_count(), 3);
    }

    #[tokio::test]
    async fn test_selection_is_read_back_and_reset_on_navigation() {
        let book = Locator::id("bookType");
        let session = MockSession::new(vec![MockPage::new().with_select(book.clone(), &["Vegas", "Offshore"])]);

        session.navigate("https://example.com").await.unwrap();
        let el = session.find_first(&book).await.unwrap().unwrap();
        el.select_option("Vegas").await.unwrap();
        assert_eq!(el.attribute("value").await.unwrap(), Some("Vegas".to_string()));
        assert!(el.select_option("Moon").await.is_err());

        session.navigate("https://example.com").await.unwrap();
        let el = session.find_first(&book).await.unwrap().unwrap();
        assert_eq!(el.attribute("value").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let mut session = MockSession::new(vec![MockPage::new()]);
        session.close().await.unwrap();

        assert!(matches!(
            session.navigate("https://example.com").await,
            Err(BrowserError::SessionClosed)
        ));
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_driver_shares_call_log_with_sessions() {
        let driver = MockDriver::new(vec![MockPage::new()]);
        let mut session = driver.start_session().await.unwrap();
        session.navigate("https://example.com").await.unwrap();
        session.close().await.unwrap();

        assert_eq!(driver.count(&MockBrowserCall::StartSession), 1);
        assert_eq!(driver.count(&MockBrowserCall::Close), 1);
        assert_eq!(driver.calls().len(), 3);
    }
}
