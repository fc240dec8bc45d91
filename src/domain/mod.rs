//! Domain layer for dateinsert
//!
//! This module contains the value types, errors and the UI driver port.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DriverError, DriverResult, ReconcileError, RunError, RunResult};
