//! Table output formatting for CLI commands
//!
//! Pass summaries and extraction results rendered with comfy-table.

use std::env;

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::domain::models::PassResult;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    pub const fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// One row per pass over the collection
    pub fn format_passes(&self, passes: &[PassResult]) -> String {
        let mut table = Self::create_base_table();

        table.set_header(header(&[
            "Pass",
            "Items",
            "Created",
            "Updated",
            "Unchanged",
            "Skipped",
            "Failed",
            "Retryable",
        ]));

        for pass in passes {
            let failed = if self.use_colors && pass.failed > 0 {
                Cell::new(pass.failed).fg(Color::Red)
            } else {
                Cell::new(pass.failed)
            };
            let changed = |count: usize| {
                if self.use_colors && count > 0 {
                    Cell::new(count).fg(Color::Green)
                } else {
                    Cell::new(count)
                }
            };

            table.add_row(vec![
                Cell::new(pass.pass),
                Cell::new(pass.item_count),
                changed(pass.created),
                changed(pass.updated),
                Cell::new(pass.unchanged),
                Cell::new(pass.skipped),
                failed,
                Cell::new(pass.retryable_failures),
            ]);
        }

        table.to_string()
    }

    /// Filename, date and rendered time per extracted filename
    pub fn format_extractions(&self, rows: &[(String, Option<(String, String)>)]) -> String {
        let mut table = Self::create_base_table();

        table.set_header(header(&["Filename", "Date", "Time"]));

        for (filename, fact) in rows {
            match fact {
                Some((date, time)) => table.add_row(vec![
                    Cell::new(filename),
                    Cell::new(date),
                    Cell::new(time),
                ]),
                None => {
                    let no_match = if self.use_colors {
                        Cell::new("no match").fg(Color::Yellow)
                    } else {
                        Cell::new("no match")
                    };
                    table.add_row(vec![Cell::new(filename), no_match, Cell::new("-")])
                }
            };
        }

        table.to_string()
    }

    fn create_base_table() -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check for dumb terminal
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}
