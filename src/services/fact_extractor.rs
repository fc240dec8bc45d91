//! Derives the desired shooting timestamp from a photo's filename.

use regex::Regex;

use crate::domain::models::{CalendarDate, ExtractedFact, LocalizedTimeOfDay};

/// Minimum number of capture groups: year, month, day, hour, minute.
pub const REQUIRED_GROUPS: usize = 5;

/// Errors compiling a user-supplied capture pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid {what} pattern: {source}")]
    Regex {
        what: &'static str,
        source: regex::Error,
    },

    #[error("The {what} pattern has {found} capture groups, at least {required} are required")]
    TooFewGroups {
        what: &'static str,
        found: usize,
        required: usize,
    },
}

/// Compile `pattern` and require at least `required` capture groups.
pub fn compile_pattern(
    what: &'static str,
    pattern: &str,
    required: usize,
) -> Result<Regex, PatternError> {
    let regex = Regex::new(pattern).map_err(|source| PatternError::Regex { what, source })?;
    let found = regex.captures_len() - 1;
    if found < required {
        return Err(PatternError::TooFewGroups {
            what,
            found,
            required,
        });
    }
    Ok(regex)
}

/// Pure filename → timestamp extraction.
///
/// The pattern captures year, month, day, hour and minute in that order; a
/// sixth group (seconds) may be present and is ignored.
#[derive(Debug, Clone)]
pub struct FactExtractor {
    pattern: Regex,
}

impl FactExtractor {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: compile_pattern("filename", pattern, REQUIRED_GROUPS)?,
        })
    }

    /// Extract the shooting timestamp, or `None` when the filename does not
    /// match or encodes an impossible date/time.
    pub fn extract(&self, filename: &str) -> Option<ExtractedFact> {
        let caps = self.pattern.captures(filename)?;
        let group = |i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };

        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let date = CalendarDate::from_ymd(year, group(2)?, group(3)?)?;
        let time = LocalizedTimeOfDay::from_24h(group(4)?, group(5)?)?;

        Some(ExtractedFact::new(date, time))
    }
}

impl Default for FactExtractor {
    fn default() -> Self {
        Self {
            pattern: Regex::new(crate::domain::models::DEFAULT_FILENAME_PATTERN)
                .expect("default filename pattern is valid"),
        }
    }
}
