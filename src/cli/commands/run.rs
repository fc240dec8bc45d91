//! Implementation of the `dateinsert run` command.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use uuid::Uuid;

use crate::application::{Runner, UiSession};
use crate::cli::output::progress::{create_spinner_with_message, spinner_enabled};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{BrowserKind, Config, HaltReason, PassResult, RunSummary};
use crate::infrastructure::{ConfigLoader, LoggerImpl};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Upper bound on passes over the collection
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_passes: Option<u32>,

    /// Collection page to reconcile
    #[arg(long)]
    pub target_url: Option<String>,

    /// Browser to drive (firefox or chrome)
    #[arg(long)]
    pub browser: Option<BrowserKind>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(max_passes) = self.max_passes {
            config.max_passes = max_passes;
        }
        if let Some(url) = &self.target_url {
            config.target_url.clone_from(url);
        }
        if let Some(kind) = self.browser {
            config.browser.kind = kind;
        }
        if self.headless {
            config.browser.headless = true;
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub run_id: Uuid,
    pub halt: HaltReason,
    pub total_changed: usize,
    pub total_failed: usize,
    pub passes: Vec<PassResult>,
}

impl RunOutput {
    pub fn new(run_id: Uuid, summary: RunSummary) -> Self {
        Self {
            run_id,
            halt: summary.halt,
            total_changed: summary.total_changed(),
            total_failed: summary.total_failed(),
            passes: summary.passes,
        }
    }
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if !self.passes.is_empty() {
            lines.push(TableFormatter::new().format_passes(&self.passes));
        }

        let halt = match self.halt {
            HaltReason::FixedPoint => style(self.halt.to_string()).green(),
            HaltReason::EmptyCollection | HaltReason::PassCap => {
                style(self.halt.to_string()).yellow()
            }
        };
        lines.push(format!(
            "{} after {} pass(es): {} changed, {} failed",
            halt.bold(),
            self.passes.len(),
            self.total_changed,
            self.total_failed
        ));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let mut config = ConfigLoader::load(config_path)?;
    args.apply(&mut config);
    ConfigLoader::validate(&config).context("Invalid command-line override")?;

    let _logger = LoggerImpl::init(&config.logging).context("Failed to initialize logging")?;

    let session = UiSession::start(&config.browser)
        .await
        .context("Failed to start the browser session")?;

    let mut runner = Runner::new(config);
    if spinner_enabled(json_mode) {
        runner = runner.with_spinner(create_spinner_with_message("Starting..."));
    }
    let run_id = runner.run_id();

    let summary = runner
        .run(session)
        .await
        .context("Reconciliation run failed")?;

    output(&RunOutput::new(run_id, summary), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let args = RunArgs {
            max_passes: Some(2),
            target_url: Some("https://photos.example.test/all".to_string()),
            browser: Some(BrowserKind::Chrome),
            headless: true,
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.max_passes, 2);
        assert_eq!(config.target_url, "https://photos.example.test/all");
        assert_eq!(config.browser.kind, BrowserKind::Chrome);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        RunArgs::default().apply(&mut config);
        assert_eq!(config.max_passes, Config::default().max_passes);
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_run_output_json() {
        let mut pass = PassResult::new(1);
        pass.item_count = 1;
        pass.created = 1;
        pass.any_changed = true;
        let summary = RunSummary {
            passes: vec![pass, PassResult::new(2)],
            halt: HaltReason::FixedPoint,
        };

        let json = RunOutput::new(Uuid::nil(), summary).to_json();
        assert_eq!(json["halt"], "fixed_point");
        assert_eq!(json["total_changed"], 1);
        assert_eq!(json["passes"].as_array().unwrap().len(), 2);
    }
}
