//! Reads the shooting timestamp currently stored for the open photo.

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, trace};

use crate::domain::errors::{DriverResult, ReconcileError};
use crate::domain::models::{
    CalendarDate, CurrentState, ElementHandle, ExtractedFact, LocaleConfig, LocalizedTimeOfDay,
    Locator, UiSelectors,
};
use crate::domain::ports::UiDriver;
use crate::services::fact_extractor::{compile_pattern, PatternError};

/// Year, month and day groups of the rendered date label.
pub const DATE_GROUPS: usize = 3;

/// Reads the stored date/time of the item shown in the active context.
#[derive(Clone)]
pub struct StateReader {
    driver: Arc<dyn UiDriver>,
    edit_button: Locator,
    date_label: Locator,
    time_label: Locator,
    locale: LocaleConfig,
    date_pattern: Regex,
}

impl StateReader {
    pub fn new(
        driver: Arc<dyn UiDriver>,
        selectors: &UiSelectors,
        locale: &LocaleConfig,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            driver,
            edit_button: Locator::css(&selectors.date_edit_button),
            date_label: Locator::css(&selectors.date_label),
            time_label: Locator::css(&selectors.time_label),
            locale: locale.clone(),
            date_pattern: compile_pattern("date label", &locale.date_pattern, DATE_GROUPS)?,
        })
    }

    /// `Unset` when no edit affordance is shown, otherwise the parsed stored value.
    ///
    /// An edit affordance next to unreadable text is a parse error, never
    /// `Unset`, so a malformed label cannot lead to a second "add".
    pub async fn read_current(&self) -> Result<CurrentState, ReconcileError> {
        if self.edit_affordance().await?.is_none() {
            debug!("no stored timestamp");
            return Ok(CurrentState::Unset);
        }

        let date_text = self.label_text(&self.date_label, "date label").await?;
        let time_text = self.label_text(&self.time_label, "time label").await?;
        trace!(date_text, time_text, "stored timestamp text");

        let date = self
            .parse_date(&date_text)
            .ok_or_else(|| ReconcileError::parse("date label", &date_text))?;
        let time = self
            .parse_time(&time_text)
            .ok_or_else(|| ReconcileError::parse("time label", &time_text))?;

        Ok(CurrentState::Set(ExtractedFact::new(date, time)))
    }

    /// The edit button, if present and labelled as such.
    pub async fn edit_affordance(&self) -> DriverResult<Option<ElementHandle>> {
        labelled(self.driver.as_ref(), &self.edit_button, &self.locale.edit_label).await
    }

    /// Parse a rendered date such as `2025年5月15日`.
    pub fn parse_date(&self, text: &str) -> Option<CalendarDate> {
        let caps = self.date_pattern.captures(text.trim())?;
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2)?.as_str().parse().ok()?;
        let day = caps.get(3)?.as_str().parse().ok()?;
        CalendarDate::from_ymd(year, month, day)
    }

    /// Parse a rendered time such as `木曜日, 午後9時10分`; the prefix up to
    /// the first separator is dropped.
    pub fn parse_time(&self, text: &str) -> Option<LocalizedTimeOfDay> {
        let text = text.trim();
        let time = text
            .split_once(self.locale.prefix_separator.as_str())
            .map_or(text, |(_, rest)| rest);
        LocalizedTimeOfDay::parse(time, &self.locale.time)
    }

    async fn label_text(
        &self,
        locator: &Locator,
        what: &'static str,
    ) -> Result<String, ReconcileError> {
        let Some(element) = self.driver.find(locator).await? else {
            return Err(ReconcileError::parse(what, ""));
        };
        let text = self.driver.text(&element).await?;
        if text.trim().is_empty() {
            return Err(ReconcileError::parse(what, text));
        }
        Ok(text)
    }
}

/// First element matching `locator` whose text contains `label`.
pub(crate) async fn labelled(
    driver: &dyn UiDriver,
    locator: &Locator,
    label: &str,
) -> DriverResult<Option<ElementHandle>> {
    for element in driver.find_all(locator).await? {
        match driver.text(&element).await {
            Ok(text) if text.contains(label) => return Ok(Some(element)),
            Ok(_) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => trace!(%locator, error = %err, "skipping unreadable candidate"),
        }
    }
    Ok(None)
}

impl std::fmt::Debug for StateReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateReader")
            .field("driver", &self.driver.name())
            .field("edit_button", &self.edit_button)
            .field("date_pattern", &self.date_pattern.as_str())
            .finish_non_exhaustive()
    }
}
