//! Drives the whole collection to a fixed point.
//!
//! Each pass enumerates the collection fresh, reconciles every item serially in
//! its own context and tallies the outcomes. Another pass follows only while
//! the previous one changed something or left a retryable failure behind, and
//! never more than `max_passes` in total.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::domain::errors::{DriverResult, RunError, RunResult};
use crate::domain::models::{
    Config, ContextHandle, FailureReason, HaltReason, ItemOutcome, ItemReport, Locator,
    PassResult, RunSummary,
};
use crate::domain::ports::UiDriver;
use crate::services::fact_extractor::PatternError;
use crate::services::reconciler::Reconciler;

/// Serial multi-pass controller over the collection view.
#[derive(Clone)]
pub struct PassController {
    driver: Arc<dyn UiDriver>,
    reconciler: Reconciler,
    photo_links: Locator,
    config: Config,
}

impl PassController {
    pub fn new(driver: Arc<dyn UiDriver>, config: &Config) -> Result<Self, PatternError> {
        Ok(Self {
            reconciler: Reconciler::new(driver.clone(), config)?,
            photo_links: Locator::css(&config.ui.photo_links),
            config: config.clone(),
            driver,
        })
    }

    /// Open the collection and run passes until nothing is left to do.
    pub async fn run_until_fixed_point(&self, max_passes: u32) -> RunResult<RunSummary> {
        let home = self.open_collection().await?;
        self.run_passes(&home, max_passes).await
    }

    /// Navigate to the collection, let it render and make sure we are signed in.
    ///
    /// Returns the collection context that items are opened from.
    #[instrument(skip(self), fields(url = %self.config.target_url))]
    pub async fn open_collection(&self) -> RunResult<ContextHandle> {
        self.driver.navigate(&self.config.target_url).await?;
        sleep(self.config.initial_wait()).await;
        self.ensure_signed_in().await?;
        let home = self.driver.current_context().await?;
        info!(context = %home, "collection opened");
        Ok(home)
    }

    /// Passes over an already opened collection.
    pub async fn run_passes(
        &self,
        home: &ContextHandle,
        max_passes: u32,
    ) -> RunResult<RunSummary> {
        let max_passes = max_passes.max(1);
        let mut passes = Vec::new();

        for pass in 1..=max_passes {
            let urls = match self.load_items(pass).await {
                Ok(urls) => urls,
                Err(RunError::Driver(err)) if !err.is_fatal() => {
                    warn!(pass, error = %err, "collection unavailable, pass left unresolved");
                    let mut result = PassResult::new(pass);
                    result.record_unresolved();
                    passes.push(result);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if urls.is_empty() {
                info!(pass, "collection is empty");
                return Ok(RunSummary {
                    passes,
                    halt: HaltReason::EmptyCollection,
                });
            }

            let result = self
                .run_pass(pass, home, &urls)
                .instrument(info_span!("pass", pass, items = urls.len()))
                .await?;
            let again = result.needs_another_pass();
            passes.push(result);

            if !again {
                info!(pass, "fixed point reached");
                return Ok(RunSummary {
                    passes,
                    halt: HaltReason::FixedPoint,
                });
            }
        }

        warn!(max_passes, "pass limit reached with work remaining");
        Ok(RunSummary {
            passes,
            halt: HaltReason::PassCap,
        })
    }

    /// Current item URLs, in page order. Links without an href are ignored.
    pub async fn enumerate(&self) -> DriverResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for link in self.driver.find_all(&self.photo_links).await? {
            match self.driver.attribute(&link, "href").await {
                Ok(Some(href)) if !href.trim().is_empty() => {
                    if seen.insert(href.clone()) {
                        urls.push(href);
                    }
                }
                Ok(_) => debug!("collection link without href"),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => debug!(error = %err, "collection link vanished"),
            }
        }

        debug!(count = urls.len(), "collection enumerated");
        Ok(urls)
    }

    async fn run_pass(
        &self,
        pass: u32,
        home: &ContextHandle,
        urls: &[String],
    ) -> RunResult<PassResult> {
        let mut result = PassResult::new(pass);
        info!("pass started");

        for url in urls {
            let report = self.visit(url, home).await?;
            result.record(&report.outcome);
        }

        info!(
            created = result.created,
            updated = result.updated,
            unchanged = result.unchanged,
            skipped = result.skipped,
            failed = result.failed,
            retryable = result.retryable_failures,
            "pass finished"
        );
        Ok(result)
    }

    /// Open `url` in its own context, reconcile it and come back.
    async fn visit(&self, url: &str, home: &ContextHandle) -> RunResult<ItemReport> {
        let mut report = match self.driver.open_context(url).await {
            Ok(_) => {
                sleep(self.config.waits.context_settle()).await;
                let mut report = self.reconciler.reconcile(url).await?;
                if let Err(err) = self.driver.close_context().await {
                    if err.is_fatal() {
                        return Err(err.into());
                    }
                    warn!(item = url, error = %err, "closing item context failed");
                    mark_context_failure(&mut report, format!("closing item context: {err}"));
                }
                report
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(item = url, error = %err, "opening item context failed");
                let mut report = ItemReport::new(url, ItemOutcome::Unchanged);
                mark_context_failure(&mut report, format!("opening item context: {err}"));
                report
            }
        };

        if let Err(err) = self.driver.switch_context(home).await {
            if err.is_fatal() {
                return Err(err.into());
            }
            warn!(error = %err, "switching back to the collection failed");
            mark_context_failure(&mut report, format!("returning to collection: {err}"));
        }

        Ok(report)
    }

    /// Item URLs for `pass`, reloading the collection after the first pass.
    async fn load_items(&self, pass: u32) -> RunResult<Vec<String>> {
        if pass > 1 {
            self.reload_collection().await?;
        }
        Ok(self.enumerate().await?)
    }

    async fn reload_collection(&self) -> RunResult<()> {
        debug!("refreshing collection");
        self.driver.refresh().await?;
        sleep(self.config.initial_wait()).await;
        self.ensure_signed_in().await
    }

    async fn ensure_signed_in(&self) -> RunResult<()> {
        let url = self.driver.current_url().await?;
        if self.config.is_auth_redirect(&url) {
            return Err(RunError::AuthenticationRedirect { url });
        }
        Ok(())
    }
}

/// Context handling failures make the item retryable unless it already is.
fn mark_context_failure(report: &mut ItemReport, message: String) {
    if !report.outcome.is_retryable_failure() {
        report.outcome = ItemOutcome::failed(FailureReason::Transient(message), true);
    }
}
