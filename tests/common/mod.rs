//! Common test utilities for integration tests
//!
//! Shared fixtures for driving the engine against the scripted UI.

use dateinsert::adapters::ScriptedDriver;
use dateinsert::domain::models::{
    CalendarDate, Config, ExtractedFact, LocalizedTimeOfDay, WaitConfig,
};

/// A shooting timestamp from 24-hour components.
#[allow(dead_code)]
pub fn fact(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> ExtractedFact {
    ExtractedFact::new(
        CalendarDate::from_ymd(year, month, day).expect("valid test date"),
        LocalizedTimeOfDay::from_24h(hour, minute).expect("valid test time"),
    )
}

/// Configuration pointed at the scripted collection with every wait collapsed.
#[allow(dead_code)]
pub fn fast_config(driver: &ScriptedDriver) -> Config {
    Config {
        target_url: driver.collection_url(),
        initial_wait_ms: 0,
        waits: WaitConfig::immediate(),
        ..Default::default()
    }
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
