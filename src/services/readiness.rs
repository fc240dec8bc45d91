//! Bounded waiting for UI elements.
//!
//! Two polling policies are offered, both expressed as [`Backoff`]
//! implementations so the wait loop itself stays policy agnostic:
//!
//! - [`EscalatingSchedule`]: lookups at fixed elapsed offsets (1, 2, 3, 5 and
//!   10 seconds by default), used for elements that usually render quickly.
//! - [`BoundedPoll`]: a single deadline with a constant poll interval, used
//!   when a specific condition must hold.
//!
//! Not finding an element is an expected outcome (`Ok(None)`). Only fatal
//! driver errors (unreachable driver, lost session) are returned as errors.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::domain::errors::DriverResult;
use crate::domain::models::{ElementHandle, Locator, WaitCondition, WaitConfig};
use crate::domain::ports::UiDriver;

/// Attempts at fixed offsets measured from the start of the wait.
#[derive(Debug, Clone)]
pub struct EscalatingSchedule {
    offsets: Vec<Duration>,
    next: usize,
    elapsed: Duration,
}

impl EscalatingSchedule {
    pub fn new(offsets: Vec<Duration>) -> Self {
        Self {
            offsets,
            next: 0,
            elapsed: Duration::ZERO,
        }
    }
}

impl Backoff for EscalatingSchedule {
    fn next_backoff(&mut self) -> Option<Duration> {
        let offset = *self.offsets.get(self.next)?;
        self.next += 1;
        let gap = offset.saturating_sub(self.elapsed);
        self.elapsed = self.elapsed.max(offset);
        Some(gap)
    }

    fn reset(&mut self) {
        self.next = 0;
        self.elapsed = Duration::ZERO;
    }
}

/// Immediate first attempt, then one attempt per `interval` until `timeout`.
#[derive(Debug, Clone)]
pub struct BoundedPoll {
    timeout: Duration,
    interval: Duration,
    deadline: Option<Instant>,
}

impl BoundedPoll {
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            deadline: None,
        }
    }
}

impl Backoff for BoundedPoll {
    fn next_backoff(&mut self) -> Option<Duration> {
        let Some(deadline) = self.deadline else {
            self.deadline = Some(Instant::now() + self.timeout);
            return Some(Duration::ZERO);
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return None;
        }
        Some(self.interval.min(remaining))
    }

    fn reset(&mut self) {
        self.deadline = None;
    }
}

/// Waits for elements to become present, visible or clickable.
#[derive(Clone)]
pub struct ReadinessWaiter {
    driver: Arc<dyn UiDriver>,
    schedule: Vec<Duration>,
    condition_timeout: Duration,
    poll_interval: Duration,
}

impl ReadinessWaiter {
    pub fn new(driver: Arc<dyn UiDriver>, waits: &WaitConfig) -> Self {
        Self {
            driver,
            schedule: waits.schedule(),
            condition_timeout: waits.condition_timeout(),
            poll_interval: waits.poll_interval(),
        }
    }

    /// Wait using the escalating schedule.
    pub async fn await_element(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> DriverResult<Option<ElementHandle>> {
        self.wait(locator, condition, EscalatingSchedule::new(self.schedule.clone()))
            .await
    }

    /// Single bounded wait with the configured timeout and poll interval.
    pub async fn await_condition(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> DriverResult<Option<ElementHandle>> {
        self.await_within(locator, condition, self.condition_timeout, self.poll_interval)
            .await
    }

    /// Single bounded wait with an explicit timeout and poll interval.
    pub async fn await_within(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
        poll_interval: Duration,
    ) -> DriverResult<Option<ElementHandle>> {
        self.wait(locator, condition, BoundedPoll::new(timeout, poll_interval))
            .await
    }

    /// One lookup, no waiting.
    pub async fn probe(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> DriverResult<Option<ElementHandle>> {
        let Some(element) = tolerate(self.driver.find(locator).await, None)? else {
            return Ok(None);
        };

        let ready = match condition {
            WaitCondition::Present => true,
            WaitCondition::Visible => {
                tolerate(self.driver.is_displayed(&element).await.map(Some), None)?
                    .unwrap_or(false)
            }
            WaitCondition::Clickable => {
                let displayed = tolerate(self.driver.is_displayed(&element).await.map(Some), None)?
                    .unwrap_or(false);
                displayed
                    && tolerate(self.driver.is_enabled(&element).await.map(Some), None)?
                        .unwrap_or(false)
            }
        };

        Ok(ready.then_some(element))
    }

    async fn wait<B: Backoff>(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        mut backoff: B,
    ) -> DriverResult<Option<ElementHandle>> {
        let mut attempts = 0u32;
        while let Some(delay) = backoff.next_backoff() {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            attempts += 1;
            if let Some(element) = self.probe(locator, condition).await? {
                trace!(%locator, ?condition, attempts, "element ready");
                return Ok(Some(element));
            }
        }

        debug!(%locator, ?condition, attempts, "element not ready");
        Ok(None)
    }
}

/// Non-fatal driver errors during a probe mean "not ready yet".
fn tolerate<T>(result: DriverResult<T>, fallback: T) -> DriverResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            trace!(error = %err, "probe failed, treating as not ready");
            Ok(fallback)
        }
    }
}

impl std::fmt::Debug for ReadinessWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessWaiter")
            .field("driver", &self.driver.name())
            .field("schedule", &self.schedule)
            .field("condition_timeout", &self.condition_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedDriver, ScriptedPhoto};
    use crate::domain::models::UiSelectors;

    const PHOTO: &str = "VRChat_2024-03-25_14-05-00.png";

    fn waits(schedule_ms: Vec<u64>) -> WaitConfig {
        WaitConfig {
            schedule_ms,
            ..WaitConfig::immediate()
        }
    }

    async fn on_detail_page(photo: ScriptedPhoto) -> Arc<ScriptedDriver> {
        let driver = Arc::new(ScriptedDriver::new(vec![photo]));
        driver.open_context(&driver.item_url(0)).await.unwrap();
        driver
    }

    /// Open the info panel and the add form so the save button exists.
    async fn open_form(driver: &ScriptedDriver) {
        let ui = UiSelectors::default();
        for selector in [&ui.info_button, &ui.add_button] {
            let button = driver.find(&Locator::css(selector)).await.unwrap().unwrap();
            driver.click(&button).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_late_element_is_found() {
        let driver =
            on_detail_page(ScriptedPhoto::new(PHOTO).with_render_delay(Duration::from_millis(80)))
                .await;
        let waiter = ReadinessWaiter::new(driver.clone(), &waits(vec![20, 50, 100, 200]));
        let info = Locator::css(&UiSelectors::default().info_button);

        assert!(waiter.probe(&info, WaitCondition::Present).await.unwrap().is_none());
        let found = waiter
            .await_element(&info, WaitCondition::Clickable)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_absent_element_is_none_after_schedule() {
        let driver = on_detail_page(ScriptedPhoto::new(PHOTO)).await;
        let waiter = ReadinessWaiter::new(driver.clone(), &waits(vec![0, 1, 2]));
        let nowhere = Locator::css(".nowhere");

        let started = Instant::now();
        assert_eq!(
            waiter.await_element(&nowhere, WaitCondition::Present).await.unwrap(),
            None
        );
        assert!(started.elapsed() >= Duration::from_millis(2));
        assert_eq!(
            waiter.await_condition(&nowhere, WaitCondition::Visible).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_clickable_requires_enabled() {
        let driver = on_detail_page(ScriptedPhoto::new(PHOTO).with_disabled_save_button()).await;
        open_form(&driver).await;
        let waiter = ReadinessWaiter::new(driver.clone(), &WaitConfig::immediate());
        let save = Locator::css(&UiSelectors::default().save_button);

        assert!(waiter.probe(&save, WaitCondition::Present).await.unwrap().is_some());
        assert!(waiter.probe(&save, WaitCondition::Visible).await.unwrap().is_some());
        assert!(waiter
            .await_condition(&save, WaitCondition::Clickable)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_visible_requires_displayed() {
        let driver = on_detail_page(ScriptedPhoto::new(PHOTO).with_hidden_save_button()).await;
        open_form(&driver).await;
        let waiter = ReadinessWaiter::new(driver.clone(), &WaitConfig::immediate());
        let save = Locator::css(&UiSelectors::default().save_button);

        assert!(waiter.probe(&save, WaitCondition::Present).await.unwrap().is_some());
        assert!(waiter.probe(&save, WaitCondition::Visible).await.unwrap().is_none());
        assert!(waiter.probe(&save, WaitCondition::Clickable).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transient_probe_errors_mean_not_ready() {
        let driver = on_detail_page(ScriptedPhoto::new(PHOTO)).await;
        driver.fail_next_lookups(2);
        let waiter = ReadinessWaiter::new(driver.clone(), &waits(vec![0, 1, 2]));
        let info = Locator::css(&UiSelectors::default().info_button);

        let found = waiter
            .await_element(&info, WaitCondition::Present)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_fatal_probe_error_is_returned() {
        let driver = on_detail_page(ScriptedPhoto::new(PHOTO)).await;
        driver.quit().await.unwrap();
        let waiter = ReadinessWaiter::new(driver.clone(), &waits(vec![0, 1, 2]));
        let info = Locator::css(&UiSelectors::default().info_button);

        let err = waiter
            .await_element(&info, WaitCondition::Present)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_escalating_schedule_gaps() {
        let mut schedule = EscalatingSchedule::new(
            [1, 2, 3, 5, 10].into_iter().map(Duration::from_secs).collect(),
        );
        let gaps: Vec<_> = std::iter::from_fn(|| schedule.next_backoff()).collect();
        assert_eq!(
            gaps,
            [1, 1, 1, 2, 5].into_iter().map(Duration::from_secs).collect::<Vec<_>>()
        );

        schedule.reset();
        assert_eq!(schedule.next_backoff(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_escalating_schedule_tolerates_unsorted_offsets() {
        let mut schedule =
            EscalatingSchedule::new(vec![Duration::from_secs(3), Duration::from_secs(1)]);
        assert_eq!(schedule.next_backoff(), Some(Duration::from_secs(3)));
        assert_eq!(schedule.next_backoff(), Some(Duration::ZERO));
        assert_eq!(schedule.next_backoff(), None);
    }

    #[tokio::test]
    async fn test_bounded_poll_first_attempt_is_immediate() {
        let mut poll = BoundedPoll::new(Duration::from_millis(20), Duration::from_millis(5));
        assert_eq!(poll.next_backoff(), Some(Duration::ZERO));
        let next = poll.next_backoff().unwrap();
        assert!(next <= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_bounded_poll_stops_after_deadline() {
        let mut poll = BoundedPoll::new(Duration::from_millis(5), Duration::from_millis(1));
        assert_eq!(poll.next_backoff(), Some(Duration::ZERO));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(poll.next_backoff(), None);
    }
}
