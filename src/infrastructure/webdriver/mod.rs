//! W3C WebDriver backend
//!
//! Drives Firefox through geckodriver or Chrome through chromedriver over the
//! WebDriver HTTP protocol. Browser differences are confined to
//! [`browser`] (capabilities, executable discovery, driver arguments).

pub mod browser;
pub mod client;
pub mod process;
pub mod types;

pub use client::WebDriverClient;
pub use process::DriverProcess;
