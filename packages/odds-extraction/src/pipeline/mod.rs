//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Navigation and readiness waits (`PageWaiter`)
//! - Element lookups that report absence distinctly (`ElementReader`)
//! - Bounded retries with backoff and cancellation (`RetryingExtractor`)
//! - Year inference and zone conversion for "last updated" text (`TimestampNormalizer`)
//! - Page markup snapshots on failure (`DiagnosticDumper`)

pub mod diagnostics;
pub mod extractor;
pub mod reader;
pub mod timestamp;
pub mod waiter;

pub use diagnostics::DiagnosticDumper;
pub use extractor::{parse_event_count, FieldRead, RetryingExtractor};
pub use reader::{ElementReader, SelectionOutcome};
pub use timestamp::{normalize, TimestampNormalizer};
pub use waiter::PageWaiter;
