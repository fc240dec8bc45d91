//! Command-line interface
//!
//! `dateinsert [--config PATH] [--json] <run|extract|init>`

pub mod commands;
pub mod output;
pub mod types;

use console::style;

pub use types::{Cli, Commands};

use crate::domain::errors::RunError;

/// Exit status for a failed command: 130 after Ctrl-C, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RunError>() {
        Some(RunError::Interrupted) => 130,
        _ => 1,
    }
}

/// Print the error chain and exit with the matching status.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": causes,
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("{} {err:#}", style("Error:").red().bold());
    }
    std::process::exit(exit_code(&err));
}
