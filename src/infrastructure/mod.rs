//! Infrastructure layer module
//!
//! External integrations behind the domain ports:
//! - W3C WebDriver client and driver process management
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;
pub mod webdriver;

pub use config::{ConfigError, ConfigLoader};
pub use logging::LoggerImpl;
pub use webdriver::{DriverProcess, WebDriverClient};
