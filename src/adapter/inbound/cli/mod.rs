//! Command-line interface: `serve`, `optimize` and `check-config`.

pub mod check;
pub mod command;
pub mod optimize;
pub mod output;
pub mod serve;

use std::path::Path;

pub use command::{Cli, Commands};

use crate::error::Result;
use crate::infrastructure::config::Config;

/// Load the configuration file.
///
/// With `required == false` a missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file is required and missing, or if it exists
/// and fails to parse or validate.
pub fn load_config(path: &Path, required: bool) -> Result<Config> {
    if !required && !path.exists() {
        return Ok(Config::default());
    }
    Config::load(path)
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns the error of the failed command.
pub async fn run(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));
    match cli.command {
        Commands::Serve(args) => serve::execute(&cli.config, args).await,
        Commands::Optimize(args) => optimize::execute(&cli.config, &args).await,
        Commands::CheckConfig => check::execute(&cli.config),
    }
}
