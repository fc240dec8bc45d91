//! Implementation of the `dateinsert init` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{ConfigLoader, DEFAULT_CONFIG_FILE};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long, short)]
    pub force: bool,

    /// Where to write the file (defaults to --config or ./dateinsert.yaml)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub path: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        format!("{} ({})", self.message, self.path.display())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Write the default configuration unless one exists and `force` is off.
pub fn init_config(path: &Path, force: bool) -> Result<InitOutput> {
    let existed = path.exists();
    if existed && !force {
        return Ok(InitOutput {
            success: false,
            message: "Configuration already exists. Use --force to overwrite.".to_string(),
            path: path.to_path_buf(),
        });
    }

    ConfigLoader::write_default(path, force)?;

    Ok(InitOutput {
        success: true,
        message: if existed {
            "Configuration overwritten with defaults.".to_string()
        } else {
            "Default configuration written.".to_string()
        },
        path: path.to_path_buf(),
    })
}

pub fn execute(args: InitArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let path = args
        .path
        .as_deref()
        .or(config_path)
        .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let result = init_config(path, args.force)?;
    output(&result, json_mode);
    Ok(())
}
