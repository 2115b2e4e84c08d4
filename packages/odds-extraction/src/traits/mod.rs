//! Core trait abstractions for the extraction library.
//!
//! These traits define the browser automation capability the extractor
//! consumes. Applications implement them or enable the `webdriver` feature.

pub mod browser;
