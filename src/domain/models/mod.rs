//! Domain models for dateinsert
//!
//! Value types shared by the reconciliation engine and its adapters.

pub mod config;
pub mod fact;
pub mod outcome;
pub mod ui;

pub use config::{
    BrowserConfig, BrowserKind, Config, LocaleConfig, LoggingConfig, UiSelectors, WaitConfig,
    DEFAULT_FILENAME_PATTERN,
};
pub use fact::{CalendarDate, ExtractedFact, Half, HourConvention, LocalizedTimeOfDay, TimeLabels};
pub use outcome::{
    CurrentState, FailureReason, HaltReason, ItemOutcome, ItemReport, PassResult, RunSummary,
    SkipReason, WriteAction,
};
pub use ui::{ContextHandle, ElementHandle, Locator, WaitCondition};
