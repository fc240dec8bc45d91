//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::extract::ExtractArgs;
use super::commands::init::InitArgs;
use super::commands::run::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "dateinsert")]
#[command(
    about = "Set photo shooting timestamps in a web photo library from their filenames",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./dateinsert.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile every photo in the collection until nothing changes
    Run(RunArgs),

    /// Show the timestamp extracted from filenames
    Extract(ExtractArgs),

    /// Write the default configuration file
    Init(InitArgs),
}
