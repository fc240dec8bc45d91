//! Per-photo reconciliation state machine.
//!
//! ```text
//! Start -> PanelOpened -> FactKnown -> Unset       -> FormOpened   -\
//!                                   -> SetDiffers  -> EditorOpened -+-> FieldsFilled -> Saved
//!                                   -> SetMatches  -> Unchanged
//! ```
//!
//! A write is attempted only when the stored timestamp is absent or differs
//! from the one in the filename. Item-local problems end up as
//! [`ItemOutcome::Failed`]; only fatal driver errors are returned.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DriverError, DriverResult, ReconcileError};
use crate::domain::models::{
    Config, CurrentState, ElementHandle, ExtractedFact, FailureReason, HourConvention,
    ItemOutcome, ItemReport, Locator, SkipReason, TimeLabels, WaitCondition, WaitConfig,
    WriteAction,
};
use crate::domain::ports::UiDriver;
use crate::services::fact_extractor::{FactExtractor, PatternError};
use crate::services::readiness::ReadinessWaiter;
use crate::services::state_reader::{labelled, StateReader};

/// Date-piece inputs in fill order.
const FIELD_NAMES: [&str; 4] = ["year", "month", "day", "time"];

#[derive(Debug, Clone)]
struct Locators {
    info_button: Locator,
    filename_label: Locator,
    add_button: Locator,
    fields: [Locator; 4],
    save_button: Locator,
}

/// Brings one photo's stored timestamp in line with its filename.
#[derive(Clone)]
pub struct Reconciler {
    driver: Arc<dyn UiDriver>,
    waiter: ReadinessWaiter,
    extractor: FactExtractor,
    reader: StateReader,
    locators: Locators,
    add_label: String,
    labels: TimeLabels,
    convention: HourConvention,
    waits: WaitConfig,
}

impl Reconciler {
    pub fn new(driver: Arc<dyn UiDriver>, config: &Config) -> Result<Self, PatternError> {
        let ui = &config.ui;
        Ok(Self {
            waiter: ReadinessWaiter::new(driver.clone(), &config.waits),
            extractor: FactExtractor::new(&config.filename_pattern)?,
            reader: StateReader::new(driver.clone(), ui, &config.locale)?,
            locators: Locators {
                info_button: Locator::css(&ui.info_button),
                filename_label: Locator::css(&ui.filename_label),
                add_button: Locator::css(&ui.add_button),
                fields: [
                    Locator::css(&ui.year_input),
                    Locator::css(&ui.month_input),
                    Locator::css(&ui.day_input),
                    Locator::css(&ui.time_input),
                ],
                save_button: Locator::css(&ui.save_button),
            },
            add_label: config.locale.add_label.clone(),
            labels: config.locale.time.clone(),
            convention: config.hour_convention,
            waits: config.waits.clone(),
            driver,
        })
    }

    /// Reconcile the photo shown in the active context.
    ///
    /// # Errors
    ///
    /// Only fatal driver errors (driver unreachable, session lost).
    #[instrument(skip(self, url), fields(item = %url))]
    pub async fn reconcile(&self, url: &str) -> DriverResult<ItemReport> {
        let mut report = ItemReport::new(url, ItemOutcome::Unchanged);

        report.outcome = match self.drive(&mut report).await {
            Ok(outcome) => outcome,
            Err(ReconcileError::Driver(err)) if err.is_fatal() => return Err(err),
            Err(err) => ItemOutcome::failed(FailureReason::Transient(err.to_string()), true),
        };

        log_decision(&report);
        Ok(report)
    }

    async fn drive(&self, report: &mut ItemReport) -> Result<ItemOutcome, ReconcileError> {
        // Start -> PanelOpened
        match self
            .waiter
            .await_element(&self.locators.info_button, WaitCondition::Clickable)
            .await?
        {
            Some(info) => self.driver.click(&info).await?,
            None => debug!("info affordance not shown, assuming panel is open"),
        }

        // PanelOpened -> FactKnown
        let Some(filename) = self.read_filename().await? else {
            return Ok(ItemOutcome::Skipped {
                reason: SkipReason::MissingFilename,
            });
        };
        report.filename = Some(filename.clone());

        let Some(fact) = self.extractor.extract(&filename) else {
            return Ok(ItemOutcome::Skipped {
                reason: SkipReason::UnrecognizedFilename,
            });
        };
        report.extracted = Some(fact);

        let current = match self.reader.read_current().await {
            Ok(current) => current,
            Err(err @ ReconcileError::Parse { .. }) => {
                return Ok(ItemOutcome::failed(
                    FailureReason::UnreadableCurrentState(err.to_string()),
                    false,
                ));
            }
            Err(err) => return Err(err),
        };
        report.current = Some(current);

        let action = match current {
            CurrentState::Set(stored) if stored == fact => return Ok(ItemOutcome::Unchanged),
            CurrentState::Set(_) => {
                let Some(edit) = self.reader.edit_affordance().await? else {
                    return Ok(ItemOutcome::failed(FailureReason::EditAffordanceMissing, true));
                };
                self.driver.click(&edit).await?;
                WriteAction::Updated
            }
            CurrentState::Unset => {
                let Some(add) = self.add_affordance().await? else {
                    return Ok(ItemOutcome::failed(
                        FailureReason::CreateAffordanceMissing,
                        true,
                    ));
                };
                self.driver.click(&add).await?;
                WriteAction::Created
            }
        };
        sleep(self.waits.affordance_settle()).await;

        // FormOpened / EditorOpened -> FieldsFilled
        if let Some(reason) = self.fill_fields(&fact).await? {
            return Ok(ItemOutcome::failed(reason, true));
        }

        // FieldsFilled -> Saved
        let Some(save) = self
            .waiter
            .await_condition(&self.locators.save_button, WaitCondition::Clickable)
            .await?
        else {
            return Ok(ItemOutcome::failed(FailureReason::SaveAffordanceMissing, true));
        };
        self.driver.click(&save).await?;
        sleep(self.waits.save_settle()).await;

        Ok(ItemOutcome::Changed { action })
    }

    async fn read_filename(&self) -> Result<Option<String>, ReconcileError> {
        let Some(label) = self
            .waiter
            .await_element(&self.locators.filename_label, WaitCondition::Visible)
            .await?
        else {
            return Ok(None);
        };
        let filename = self.driver.text(&label).await?;
        let filename = filename.trim();
        Ok((!filename.is_empty()).then(|| filename.to_string()))
    }

    async fn add_affordance(&self) -> DriverResult<Option<ElementHandle>> {
        if self
            .waiter
            .await_element(&self.locators.add_button, WaitCondition::Present)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        labelled(self.driver.as_ref(), &self.locators.add_button, &self.add_label).await
    }

    /// Clear and type every date piece. `Some(reason)` when a field is missing.
    async fn fill_fields(
        &self,
        fact: &ExtractedFact,
    ) -> Result<Option<FailureReason>, ReconcileError> {
        let [year_locator, rest @ ..] = &self.locators.fields;
        let Some(year) = self
            .waiter
            .await_element(year_locator, WaitCondition::Visible)
            .await?
        else {
            return Ok(Some(FailureReason::FieldMissing(FIELD_NAMES[0].to_string())));
        };

        let mut fields = vec![year];
        for (name, locator) in FIELD_NAMES[1..].iter().zip(rest) {
            match self.driver.find(locator).await? {
                Some(element) => fields.push(element),
                None => return Ok(Some(FailureReason::FieldMissing((*name).to_string()))),
            }
        }

        self.log_field_values("before fill", &fields).await?;

        let values = [
            fact.date.year_field(),
            fact.date.month_field(),
            fact.date.day_field(),
            fact.time.render(&self.labels, self.convention),
        ];
        for ((name, element), value) in FIELD_NAMES.iter().zip(&fields).zip(&values) {
            self.driver.clear(element).await?;
            self.driver.send_keys(element, value).await?;
            debug!(field = name, value = %value, "field typed");
        }

        // The time field only commits its pending edit when it loses focus.
        if let Some(time) = fields.last() {
            self.driver.blur(time).await?;
        }
        sleep(self.waits.fill_settle()).await;

        self.log_field_values("after fill", &fields).await?;
        Ok(None)
    }

    async fn log_field_values(
        &self,
        stage: &'static str,
        fields: &[ElementHandle],
    ) -> Result<(), DriverError> {
        for (name, element) in FIELD_NAMES.iter().zip(fields) {
            match self.driver.attribute(element, "value").await {
                Ok(value) => debug!(stage, field = name, value = ?value, "field value"),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => debug!(stage, field = name, error = %err, "field value unreadable"),
            }
        }
        Ok(())
    }
}

fn log_decision(report: &ItemReport) {
    let filename = report.filename.as_deref().unwrap_or("-");
    let extracted = report
        .extracted
        .map_or_else(|| "-".to_string(), |fact| fact.to_string());
    let current = report
        .current
        .map_or_else(|| "-".to_string(), |state| state.to_string());

    match &report.outcome {
        ItemOutcome::Changed { action } => {
            info!(filename, %extracted, %current, ?action, "timestamp written");
        }
        ItemOutcome::Unchanged => info!(filename, %extracted, %current, "already up to date"),
        ItemOutcome::Skipped { reason } => info!(filename, ?reason, "skipped"),
        ItemOutcome::Failed { reason, retryable } => {
            warn!(filename, %extracted, %current, %reason, retryable, "item failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedDriver, ScriptedPhoto};
    use crate::domain::models::{CalendarDate, LocalizedTimeOfDay};

    fn config() -> Config {
        Config {
            waits: WaitConfig::immediate(),
            ..Default::default()
        }
    }

    fn fact(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> ExtractedFact {
        ExtractedFact::new(
            CalendarDate::from_ymd(y, mo, d).unwrap(),
            LocalizedTimeOfDay::from_24h(h, mi).unwrap(),
        )
    }

    async fn reconcile_first(driver: &Arc<ScriptedDriver>) -> ItemReport {
        let reconciler = Reconciler::new(driver.clone(), &config()).unwrap();
        let url = driver.item_url(0);
        driver.open_context(&url).await.unwrap();
        let report = reconciler.reconcile(&url).await.unwrap();
        driver.close_context().await.unwrap();
        report
    }

    #[tokio::test]
    async fn test_unset_item_is_created() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_14-05-00.png",
        )]));

        let report = reconcile_first(&driver).await;

        assert_eq!(
            report.outcome,
            ItemOutcome::Changed {
                action: WriteAction::Created
            }
        );
        assert_eq!(report.current, Some(CurrentState::Unset));
        assert_eq!(driver.stored(0), Some(fact(2024, 3, 25, 14, 5)));
        assert_eq!(driver.save_count(), 1);
    }

    #[tokio::test]
    async fn test_differing_item_is_updated() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_14-05-00.png",
        )
        .with_stored(fact(2024, 3, 26, 9, 0))]));

        let report = reconcile_first(&driver).await;

        assert_eq!(
            report.outcome,
            ItemOutcome::Changed {
                action: WriteAction::Updated
            }
        );
        assert_eq!(driver.stored(0), Some(fact(2024, 3, 25, 14, 5)));
    }

    #[tokio::test]
    async fn test_matching_item_is_untouched_twice() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_00-30-00.png",
        )
        .with_stored(fact(2024, 3, 25, 0, 30))]));

        for _ in 0..2 {
            let report = reconcile_first(&driver).await;
            assert_eq!(report.outcome, ItemOutcome::Unchanged);
        }
        assert_eq!(driver.save_count(), 0);
        assert_eq!(driver.field_write_count(), 0);
    }

    #[tokio::test]
    async fn test_unrecognized_filename_is_skipped() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "Screenshot_2024-03-25.png",
        )]));

        let report = reconcile_first(&driver).await;

        assert_eq!(
            report.outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::UnrecognizedFilename
            }
        );
        assert_eq!(driver.field_write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_filename_is_skipped() {
        let driver = Arc::new(ScriptedDriver::new(vec![
            ScriptedPhoto::new("VRChat_2024-03-25_14-05-00.png").without_filename(),
        ]));

        let report = reconcile_first(&driver).await;

        assert_eq!(
            report.outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::MissingFilename
            }
        );
    }

    #[tokio::test]
    async fn test_unreadable_state_is_not_retried() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_14-05-00.png",
        )
        .with_stored(fact(2024, 3, 26, 9, 0))
        .with_malformed_date()]));

        let report = reconcile_first(&driver).await;

        assert!(matches!(
            report.outcome,
            ItemOutcome::Failed {
                reason: FailureReason::UnreadableCurrentState(_),
                retryable: false
            }
        ));
        assert_eq!(driver.field_write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_save_button_is_retryable() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_14-05-00.png",
        )
        .without_save_button()]));

        let report = reconcile_first(&driver).await;

        assert_eq!(
            report.outcome,
            ItemOutcome::failed(FailureReason::SaveAffordanceMissing, true)
        );
        assert_eq!(driver.stored(0), None);
    }

    #[tokio::test]
    async fn test_transient_click_failure_is_retryable() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_14-05-00.png",
        )]));
        driver.fail_next_clicks(1);

        let report = reconcile_first(&driver).await;

        assert!(report.outcome.is_retryable_failure());
    }

    #[tokio::test]
    async fn test_twelve_based_convention_writes_twelve() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_12-07-00.png",
        )]));
        let config = Config {
            hour_convention: HourConvention::TwelveBased,
            ..config()
        };
        let reconciler = Reconciler::new(driver.clone(), &config).unwrap();
        let url = driver.item_url(0);
        driver.open_context(&url).await.unwrap();
        reconciler.reconcile(&url).await.unwrap();

        assert_eq!(driver.time_text(0).as_deref(), Some("午後12時7分"));
        assert_eq!(driver.stored(0), Some(fact(2024, 3, 25, 12, 7)));
    }

    #[tokio::test]
    async fn test_fatal_error_propagates() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_14-05-00.png",
        )]));
        let reconciler = Reconciler::new(driver.clone(), &config()).unwrap();
        let url = driver.item_url(0);
        driver.open_context(&url).await.unwrap();
        driver.quit().await.unwrap();

        let err = reconciler.reconcile(&url).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
