//! Odds Page Extraction Library
//!
//! Reads one value from a JavaScript-rendered sportsbook page and turns it
//! into a typed result: an event count, a "last updated" instant in a
//! canonical time zone, or plain text.
//!
//! # Design Philosophy
//!
//! - Pages are flaky: every read is bounded by a retry budget, and a blank
//!   read always triggers a fresh load
//! - Failures carry evidence: the page markup is saved before reporting
//! - Library reports, caller decides: no error here ends the process
//! - Browser automation is a trait, so the core runs against mocks
//!
//! # Usage
//!
//! ```rust,ignore
//! use odds_extraction::{presets, Scraper, WebDriverBrowser};
//! use tokio_util::sync::CancellationToken;
//!
//! let (target, config) = presets::bovada_mlb_event_count().into_parts()?;
//! let scraper = Scraper::new(WebDriverBrowser::default(), config)?;
//!
//! match scraper.run(&target, &CancellationToken::new()).await? {
//!     Ok(result) => println!("{} events", result.value()),
//!     Err(failure) => eprintln!("{}", failure),
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Browser automation abstractions (driver, session, element)
//! - [`types`] - Targets, outcomes, and configuration
//! - [`pipeline`] - Waiter, reader, timestamp normalizer, dumper, retrying extractor
//! - [`scraper`] - Session lifecycle around one extraction
//! - [`presets`] - Compiled-in site targets
//! - [`drivers`] - Browser implementations (ChromeDriver)
//! - [`testing`] - Mock implementations for testing

pub mod drivers;
pub mod error;
pub mod pipeline;
pub mod presets;
pub mod scraper;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    BrowserError, ConfigError, DiagnosticError, NavigationError, ScrapeError, TimestampParseError,
};
pub use pipeline::{
    normalize, parse_event_count, DiagnosticDumper, ElementReader, PageWaiter, RetryingExtractor,
    TimestampNormalizer,
};
pub use scraper::{scrape, Scraper};
pub use traits::browser::{BrowserDriver, BrowserSession, ElementHandle};
pub use types::{
    config::{Backoff, ExtractorConfig, ScrapeConfig, WaitStrategy},
    outcome::{ExtractionFailure, ExtractionOutcome, ExtractionResult, FailureCause, ParsedValue},
    target::{ExtractionTarget, FieldKind, FormSelection, Locator},
};

#[cfg(feature = "webdriver")]
pub use drivers::WebDriverBrowser;
