//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Algorithm;

/// Buylist price scanner and purchase-plan optimizer
#[derive(Parser, Debug)]
#[command(name = "buylist")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Optimize a purchase plan from a request file
    Optimize(OptimizeArgs),

    /// Validate the configuration file
    CheckConfig,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Override `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// JSON file with `card_list`, `listings` and optional `optimization_config`
    #[arg(long, short)]
    pub input: PathBuf,

    /// Algorithm to run, overriding the request and config
    #[arg(long, value_parser = parse_algorithm)]
    pub algorithm: Option<Algorithm>,

    /// Seed for the evolutionary algorithms
    #[arg(long)]
    pub seed: Option<u64>,

    /// Time limit in seconds, overriding the request and config
    #[arg(long)]
    pub time_limit: Option<u64>,
}

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    s.parse().map_err(|e: crate::domain::DomainError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn optimize_parses_algorithm_aliases() {
        let cli = Cli::try_parse_from([
            "buylist",
            "optimize",
            "--input",
            "request.json",
            "--algorithm",
            "NSGA-II",
            "--seed",
            "42",
            "--json",
        ])
        .unwrap();
        let Commands::Optimize(args) = cli.command else {
            panic!("expected optimize");
        };
        assert_eq!(args.algorithm, Some(Algorithm::Nsga2));
        assert_eq!(args.seed, Some(42));
        assert!(cli.json);
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let result = Cli::try_parse_from([
            "buylist",
            "optimize",
            "--input",
            "r.json",
            "--algorithm",
            "simplex",
        ]);
        assert!(result.is_err());
    }
}
