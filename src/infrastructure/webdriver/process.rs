//! WebDriver server process manager
//!
//! Spawns geckodriver/chromedriver on a local port, waits until it reports
//! ready and stops it again when the session is released.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use super::browser::driver_args;
use super::client::WebDriverClient;
use crate::domain::errors::{RunError, RunResult};
use crate::domain::models::BrowserConfig;

/// Grace period between the termination signal and a hard kill.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A running driver server owned by this process.
#[derive(Debug)]
pub struct DriverProcess {
    child: Option<Child>,
    path: PathBuf,
    base_url: String,
}

impl DriverProcess {
    /// Spawn the configured driver and wait until `/status` reports ready.
    pub async fn spawn(config: &BrowserConfig) -> RunResult<Self> {
        let path = config.driver_path();
        let args = driver_args(config.kind, config.driver_port);
        info!(path = %path.display(), ?args, "Starting WebDriver server");

        let child = Command::new(&path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => RunError::MissingBinary {
                    what: config.kind.driver_binary().to_string(),
                    path: Some(path.clone()),
                },
                _ => RunError::SessionStart(format!("failed to spawn {}: {e}", path.display())),
            })?;

        let mut process = Self {
            child: Some(child),
            path,
            base_url: format!("http://127.0.0.1:{}", config.driver_port),
        };

        if let Err(err) = process.wait_ready(config.startup_timeout()).await {
            process.stop().await;
            return Err(err);
        }

        info!(base_url = %process.base_url, "WebDriver server ready");
        Ok(process)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn wait_ready(&mut self, timeout: Duration) -> RunResult<()> {
        let http_client = WebDriverClient::http_client(Duration::from_secs(2))?;
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(50))
            .with_max_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(timeout))
            .build();

        let http_client = &http_client;
        let base_url = self.base_url.as_str();
        let child = &mut self.child;
        backoff::future::retry(policy, || {
            let exited = child.as_mut().and_then(|c| c.try_wait().ok().flatten());
            async move {
                if let Some(status) = exited {
                    return Err(backoff::Error::permanent(RunError::SessionStart(format!(
                        "driver exited during startup ({status})"
                    ))));
                }
                match WebDriverClient::status(http_client, base_url).await {
                    Ok(status) if status.ready => Ok(()),
                    Ok(status) => Err(backoff::Error::transient(RunError::SessionStart(
                        format!("driver not ready: {}", status.message),
                    ))),
                    Err(err) => Err(backoff::Error::transient(RunError::SessionStart(
                        format!("driver not reachable: {err}"),
                    ))),
                }
            }
        })
        .await
    }

    /// Stop the driver: a termination signal first, a hard kill after the grace period.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        debug!(path = %self.path.display(), "Stopping WebDriver server");

        terminate(&mut child);

        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => info!(?status, "WebDriver server exited"),
            Ok(Err(e)) => error!(error = ?e, "Error waiting for WebDriver server to exit"),
            Err(_) => {
                warn!("WebDriver server shutdown timeout, forcing kill");
                let _ = child.kill().await;
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        warn!(error = %e, "Failed to send SIGTERM to WebDriver server");
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = ?e, "Failed to kill WebDriver server");
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_driver_binary() {
        let config = BrowserConfig {
            driver_path: Some(PathBuf::from("/nonexistent/geckodriver-for-tests")),
            ..Default::default()
        };

        let err = DriverProcess::spawn(&config).await.unwrap_err();
        assert!(matches!(err, RunError::MissingBinary { .. }));
        assert!(err.to_string().contains("geckodriver-for-tests"));
    }
}
