//! dateinsert - photo shooting timestamp reconciliation
//!
//! Walks a photo collection in a web photo library through a browser and makes
//! every photo's stored shooting date and time agree with the timestamp encoded
//! in its filename. Passes repeat until one changes nothing.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): value types, errors and the `UiDriver` port
//! - **Service Layer** (`services`): extraction, readiness, state reading,
//!   per-item reconciliation and the pass controller
//! - **Adapters** (`adapters`): the in-memory scripted UI
//! - **Infrastructure Layer** (`infrastructure`): WebDriver client, driver
//!   process, configuration and logging
//! - **Application Layer** (`application`): session lifecycle and run orchestration
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{Runner, UiSession};
pub use domain::errors::{DriverError, ReconcileError, RunError};
pub use domain::models::{
    CalendarDate, Config, CurrentState, ExtractedFact, HaltReason, HourConvention, ItemOutcome,
    LocalizedTimeOfDay, PassResult, RunSummary,
};
pub use domain::ports::UiDriver;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{FactExtractor, PassController, Reconciler};
