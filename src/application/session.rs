//! Browser session lifecycle
//!
//! A session is acquired once per run and released exactly once, whatever way
//! the run ends. Releasing quits the WebDriver session and then stops the
//! driver server if this process spawned it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::{RunError, RunResult};
use crate::domain::models::BrowserConfig;
use crate::domain::ports::UiDriver;
use crate::infrastructure::webdriver::browser::{capabilities, resolve_binary};
use crate::infrastructure::webdriver::{DriverProcess, WebDriverClient};

/// An open UI session plus the driver process backing it, if any.
pub struct UiSession {
    driver: Arc<dyn UiDriver>,
    process: Option<DriverProcess>,
}

impl UiSession {
    /// Start a browser session as configured.
    ///
    /// Connects to `driver_url` when set, otherwise spawns the driver server
    /// first. The browser executable is resolved before anything is spawned.
    pub async fn start(config: &BrowserConfig) -> RunResult<Self> {
        let binary = resolve_binary(config)?;
        let caps = capabilities(config, &binary);

        let (base_url, mut process) = match &config.driver_url {
            Some(url) => (url.clone(), None),
            None => {
                let process = DriverProcess::spawn(config).await?;
                (process.base_url().to_string(), Some(process))
            }
        };

        match WebDriverClient::new_session(&base_url, caps, config.request_timeout()).await {
            Ok(client) => {
                info!(
                    browser = config.kind.as_str(),
                    session_id = client.session_id(),
                    "browser session started"
                );
                Ok(Self {
                    driver: Arc::new(client),
                    process,
                })
            }
            Err(err) => {
                if let Some(process) = process.as_mut() {
                    process.stop().await;
                }
                Err(RunError::SessionStart(err.to_string()))
            }
        }
    }

    /// Wrap an already connected driver that needs no process management.
    pub fn attach(driver: Arc<dyn UiDriver>) -> Self {
        Self {
            driver,
            process: None,
        }
    }

    pub fn driver(&self) -> Arc<dyn UiDriver> {
        self.driver.clone()
    }

    /// Quit the session and stop the driver server.
    pub async fn release(mut self) {
        if let Err(err) = self.driver.quit().await {
            warn!(error = %err, driver = self.driver.name(), "failed to quit browser session");
        }
        if let Some(process) = self.process.as_mut() {
            process.stop().await;
        }
        info!("browser session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedDriver, ScriptedPhoto};

    #[tokio::test]
    async fn test_release_quits_attached_driver_once() {
        let driver = Arc::new(ScriptedDriver::new(vec![ScriptedPhoto::new(
            "VRChat_2024-03-25_14-05-00.png",
        )]));
        let session = UiSession::attach(driver.clone());

        session.release().await;
        assert_eq!(driver.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_driver_url_is_session_start_error() {
        let browser = tempfile::NamedTempFile::new().unwrap();
        let config = BrowserConfig {
            binary_path: Some(browser.path().to_path_buf()),
            driver_url: Some("http://127.0.0.1:1".to_string()),
            ..Default::default()
        };

        let err = UiSession::start(&config).await.err().unwrap();
        assert!(matches!(err, RunError::SessionStart(_)));
    }
}
