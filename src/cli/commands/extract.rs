//! Implementation of the `dateinsert extract` command.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, Half};
use crate::infrastructure::ConfigLoader;
use crate::services::FactExtractor;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Filenames to extract a shooting timestamp from
    #[arg(required = true)]
    pub filenames: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Extraction {
    pub filename: String,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half: Option<Half>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractOutput {
    pub results: Vec<Extraction>,
}

impl CommandOutput for ExtractOutput {
    fn to_human(&self) -> String {
        let rows: Vec<_> = self
            .results
            .iter()
            .map(|r| {
                let fact = r.date.clone().zip(r.display.clone());
                (r.filename.clone(), fact)
            })
            .collect();
        TableFormatter::new().format_extractions(&rows)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run every filename through the configured extractor.
pub fn extract_all(config: &Config, filenames: &[String]) -> Result<ExtractOutput> {
    let extractor = FactExtractor::new(&config.filename_pattern)
        .context("Invalid filename pattern in configuration")?;

    let results = filenames
        .iter()
        .map(|filename| match extractor.extract(filename) {
            Some(fact) => Extraction {
                filename: filename.clone(),
                matched: true,
                date: Some(fact.date.to_string()),
                half: Some(fact.time.half()),
                hour: Some(fact.time.hour()),
                minute: Some(fact.time.minute()),
                display: Some(fact.time.render(&config.locale.time, config.hour_convention)),
            },
            None => Extraction {
                filename: filename.clone(),
                matched: false,
                date: None,
                half: None,
                hour: None,
                minute: None,
                display: None,
            },
        })
        .collect();

    Ok(ExtractOutput { results })
}

pub fn execute(args: ExtractArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let result = extract_all(&config, &args.filenames)?;
    output(&result, json_mode);
    Ok(())
}
