//! Element reader - text and attribute lookups on the current page.
//!
//! Absence is a normal outcome (the page has not rendered yet), so lookups
//! return `Ok(None)` rather than an error. Whitespace is never trimmed here;
//! callers decide how to interpret blank text.

use tracing::debug;

use crate::error::BrowserResult;
use crate::traits::browser::BrowserSession;
use crate::types::target::{FormSelection, Locator};

/// What happened when a form selection was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// No element matched the locator
    Missing,

    /// The option was chosen; `value` is the element's read-back value
    Applied { value: Option<String> },
}

impl SelectionOutcome {
    /// True when the read-back value equals the requested option.
    pub fn confirms(&self, option: &str) -> bool {
        matches!(self, Self::Applied { value: Some(v) } if v == option)
    }
}

pub struct ElementReader<'s, S: ?Sized> {
    session: &'s S,
}

impl<'s, S> ElementReader<'s, S>
where
    S: BrowserSession + ?Sized,
{
    pub fn new(session: &'s S) -> Self {
        Self { session }
    }

    /// Text of the first element matching `locator`.
    ///
    /// `Ok(None)` means no element matched; `Ok(Some(""))` means an element
    /// matched but rendered no text.
    pub async fn read_text(&self, locator: &Locator) -> BrowserResult<Option<String>> {
        match self.session.find_first(locator).await? {
            Some(element) => element.text().await.map(Some),
            None => {
                debug!(selector = %locator, "Element not found");
                Ok(None)
            }
        }
    }

    /// Value of attribute `name` on the first element matching `locator`.
    ///
    /// `Ok(None)` covers both a missing element and a missing attribute.
    /// Public reader API for callers reading attributes directly; the
    /// extractor itself only reads text.
    pub async fn read_attribute(&self, locator: &Locator, name: &str) -> BrowserResult<Option<String>> {
        match self.session.find_first(locator).await? {
            Some(element) => element.attribute(name).await,
            None => {
                debug!(selector = %locator, attribute = name, "Element not found");
                Ok(None)
            }
        }
    }

    /// Choose an option on a `<select>` element and read back its value.
    pub async fn select(&self, selection: &FormSelection) -> BrowserResult<SelectionOutcome> {
        let Some(element) = self.session.find_first(&selection.locator).await? else {
            return Ok(SelectionOutcome::Missing);
        };

        element.select_option(&selection.option).await?;
        let value = element.attribute("value").await?;
        Ok(SelectionOutcome::Applied { value })
    }
}
