//! Browser driver implementations.
//!
//! - `WebDriverBrowser` - Chrome through a running ChromeDriver (`webdriver` feature)
//!
//! Tests use `testing::MockDriver` instead.

#[cfg(feature = "webdriver")]
pub mod webdriver;

#[cfg(feature = "webdriver")]
pub use webdriver::{WebDriverBrowser, WebDriverSession};
