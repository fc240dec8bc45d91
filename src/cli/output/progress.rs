//! Spinner shown while the collection page loads

use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner for indeterminate operations
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        spinner.set_style(style.tick_chars(SPINNER_CHARS));
    }
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Create a spinner with a custom message
pub fn create_spinner_with_message(message: impl Into<String>) -> ProgressBar {
    let spinner = create_spinner();
    spinner.set_message(message.into());
    spinner
}

/// Spinners only make sense on an interactive stderr.
pub fn spinner_enabled(json_mode: bool) -> bool {
    !json_mode && Term::stderr().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_disabled_in_json_mode() {
        assert!(!spinner_enabled(true));
    }

    #[test]
    fn test_spinner_message() {
        let spinner = create_spinner_with_message("Opening the collection...");
        assert_eq!(spinner.message(), "Opening the collection...");
        spinner.finish_and_clear();
    }
}
