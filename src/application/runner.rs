//! One reconciliation run over a browser session
//!
//! Opens the collection, drives it to a fixed point and releases the session
//! afterwards, on success, on error and on Ctrl-C alike.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::session::UiSession;
use crate::domain::errors::{RunError, RunResult};
use crate::domain::models::{Config, RunSummary};
use crate::services::PassController;

/// Run orchestrator
pub struct Runner {
    config: Config,
    run_id: Uuid,
    spinner: Option<ProgressBar>,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            run_id: Uuid::new_v4(),
            spinner: None,
        }
    }

    /// Show `spinner` while the collection page loads.
    #[must_use]
    pub fn with_spinner(mut self, spinner: ProgressBar) -> Self {
        self.spinner = Some(spinner);
        self
    }

    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Reconcile the collection, racing the run against Ctrl-C.
    ///
    /// The session is released exactly once before this returns.
    pub async fn run(&self, session: UiSession) -> Result<RunSummary> {
        let span = info_span!("run", run_id = %self.run_id);

        let controller = match PassController::new(session.driver(), &self.config) {
            Ok(controller) => controller,
            Err(err) => {
                session.release().await;
                return Err(err).context("Invalid pattern in configuration");
            }
        };

        let outcome = tokio::select! {
            result = self.drive(&controller).instrument(span.clone()) => result,
            _ = tokio::signal::ctrl_c() => {
                warn!(parent: &span, "interrupted, releasing the browser session");
                Err(RunError::Interrupted)
            }
        };

        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
        session.release().instrument(span).await;

        Ok(outcome?)
    }

    async fn drive(&self, controller: &PassController) -> RunResult<RunSummary> {
        info!(
            target_url = %self.config.target_url,
            max_passes = self.config.max_passes,
            "starting reconciliation"
        );

        if let Some(spinner) = &self.spinner {
            spinner.set_message("Opening the collection...");
        }
        let home = controller.open_collection().await?;
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }

        let summary = controller.run_passes(&home, self.config.max_passes).await?;
        info!(
            passes = summary.pass_count(),
            changed = summary.total_changed(),
            failed = summary.total_failed(),
            halt = %summary.halt,
            "reconciliation finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::scripted::{ScriptedDriver, ScriptedPhoto};
    use crate::domain::models::{HaltReason, WaitConfig};

    fn config_for(driver: &ScriptedDriver) -> Config {
        Config {
            target_url: driver.collection_url(),
            initial_wait_ms: 0,
            max_passes: 5,
            waits: WaitConfig::immediate(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_releases_session_after_success() {
        let driver = Arc::new(ScriptedDriver::new(vec![
            ScriptedPhoto::new("VRChat_2024-03-25_14-05-00.png"),
            ScriptedPhoto::new("VRChat_2023-12-31_23-59-59.png"),
        ]));
        let runner = Runner::new(config_for(&driver));

        let summary = runner
            .run(UiSession::attach(driver.clone()))
            .await
            .unwrap();

        assert_eq!(summary.halt, HaltReason::FixedPoint);
        assert_eq!(summary.total_changed(), 2);
        assert_eq!(driver.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_run_releases_session_after_auth_redirect() {
        let driver = Arc::new(
            ScriptedDriver::new(vec![ScriptedPhoto::new("VRChat_2024-03-25_14-05-00.png")])
                .with_auth_redirect(),
        );
        let runner = Runner::new(config_for(&driver));

        let err = runner
            .run(UiSession::attach(driver.clone()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RunError>(),
            Some(RunError::AuthenticationRedirect { .. })
        ));
        assert_eq!(driver.enumeration_count(), 0);
        assert_eq!(driver.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_pattern_still_releases_session() {
        let driver = Arc::new(ScriptedDriver::new(vec![]));
        let mut config = config_for(&driver);
        config.filename_pattern = "(".to_string();

        let result = Runner::new(config).run(UiSession::attach(driver.clone())).await;

        assert!(result.is_err());
        assert_eq!(driver.quit_count(), 1);
    }
}
