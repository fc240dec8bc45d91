//! Application layer
//!
//! Session lifecycle and run orchestration on top of the reconciliation services.

pub mod runner;
pub mod session;

pub use runner::Runner;
pub use session::UiSession;
