//! Extraction targets - what to load and which element to read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A locator identifying a DOM node.
///
/// The textual form is `css:<selector>`, `id:<id>` or `class:<class name>`.
/// A string without a recognised prefix is treated as a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    Css(String),
    Id(String),
    Class(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn class(class_name: impl Into<String>) -> Self {
        Self::Class(class_name.into())
    }

    /// The raw selector/id/class value without its kind prefix.
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v) | Self::Id(v) | Self::Class(v) => v,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(v) => write!(f, "css:{}", v),
            Self::Id(v) => write!(f, "id:{}", v),
            Self::Class(v) => write!(f, "class:{}", v),
        }
    }
}

impl FromStr for Locator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidLocator(s.to_string());

        if let Some(id) = s.strip_prefix("id:") {
            return single_token(id).map(Self::id).ok_or_else(invalid);
        }
        if let Some(class_name) = s.strip_prefix("class:") {
            return single_token(class_name).map(Self::class).ok_or_else(invalid);
        }

        let css = s.strip_prefix("css:").unwrap_or(s).trim();
        if css.is_empty() {
            return Err(invalid());
        }
        Ok(Self::css(css))
    }
}

/// Ids and class names are single tokens.
fn single_token(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty() && !s.contains(char::is_whitespace)).then_some(s)
}

impl TryFrom<String> for Locator {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

/// How the text of the target element is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// First whitespace-delimited token is an integer count ("12 Events")
    #[serde(rename = "event-count")]
    EventCount,

    /// Two-line "last updated" display without a year
    #[serde(rename = "last-updated")]
    LastUpdatedTimestamp,

    /// Any non-blank text
    #[serde(rename = "text")]
    GenericText,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventCount => "event-count",
            Self::LastUpdatedTimestamp => "last-updated",
            Self::GenericText => "text",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event-count" | "event_count" | "count" => Ok(Self::EventCount),
            "last-updated" | "last_updated" | "timestamp" => Ok(Self::LastUpdatedTimestamp),
            "text" | "generic" => Ok(Self::GenericText),
            other => Err(ConfigError::UnknownFieldKind(other.to_string())),
        }
    }
}

/// A `<select>` option to choose after each page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSelection {
    pub locator: Locator,
    /// Visible text of the option to choose
    pub option: String,
}

impl FormSelection {
    pub fn new(locator: Locator, option: impl Into<String>) -> Self {
        Self {
            locator,
            option: option.into(),
        }
    }
}

/// A single scrape request: page, element, and how to read it.
///
/// Immutable once built; the extractor only borrows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionTarget {
    pub url: String,
    pub selector: Locator,
    pub field_kind: FieldKind,

    /// Applied in order after every navigation, before reading
    #[serde(default)]
    pub selections: Vec<FormSelection>,
}

impl ExtractionTarget {
    pub fn new(url: impl Into<String>, selector: Locator, field_kind: FieldKind) -> Self {
        Self {
            url: url.into(),
            selector,
            field_kind,
            selections: Vec::new(),
        }
    }

    pub fn event_count(url: impl Into<String>, selector: Locator) -> Self {
        Self::new(url, selector, FieldKind::EventCount)
    }

    pub fn last_updated(url: impl Into<String>, selector: Locator) -> Self {
        Self::new(url, selector, FieldKind::LastUpdatedTimestamp)
    }

    pub fn text(url: impl Into<String>, selector: Locator) -> Self {
        Self::new(url, selector, FieldKind::GenericText)
    }

    /// Add a form selection applied after each load.
    pub fn with_selection(mut self, locator: Locator, option: impl Into<String>) -> Self {
        self.selections.push(FormSelection::new(locator, option));
        self
    }
}
