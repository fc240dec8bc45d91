//! dateinsert CLI entry point.

use clap::Parser;

use dateinsert::cli::commands::{extract, init, run};
use dateinsert::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => run::execute(args, config_path, cli.json).await,
        Commands::Extract(args) => extract::execute(args, config_path, cli.json),
        Commands::Init(args) => init::execute(args, config_path, cli.json),
    };

    if let Err(err) = result {
        dateinsert::cli::handle_error(err, cli.json);
    }
}
