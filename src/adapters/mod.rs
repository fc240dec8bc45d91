//! Adapters implementing domain ports without external systems.

pub mod scripted;

pub use scripted::{ScriptedDriver, ScriptedPhoto};
