//! Reconciliation engine services.

pub mod fact_extractor;
pub mod pass_controller;
pub mod readiness;
pub mod reconciler;
pub mod state_reader;

pub use fact_extractor::{FactExtractor, PatternError};
pub use pass_controller::PassController;
pub use readiness::ReadinessWaiter;
pub use reconciler::Reconciler;
pub use state_reader::StateReader;
