//! Port trait definitions (Hexagonal Architecture)
//!
//! - UiDriver: the capability surface the engine needs from a browser
//!
//! The reconciliation services depend only on these traits, never on a
//! concrete backend.

pub mod ui_driver;

pub use ui_driver::UiDriver;
