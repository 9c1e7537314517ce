// docpush CLI entry point.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;

use exit_code::ExitCode;

const LOG_FILTER_ENV: &str = "DOCPUSH_LOG_FILTER";

#[derive(Parser)]
#[command(name = "docpush", about = "Republish a Google Doc as a static page in a git repository")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> process::ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable in JSON mode.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match commands::run(cli.command) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => ExitCode::from_error(&error).into(),
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_each_subcommand_with_json_flag() {
        for name in ["watch", "publish", "config"] {
            Cli::try_parse_from(["docpush", name, "--json"])
                .unwrap_or_else(|error| panic!("`{name} --json` should parse: {error}"));
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["docpush", "serve"]).is_err());
    }
}
