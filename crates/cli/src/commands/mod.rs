// CLI subcommand dispatch.

use std::future::Future;

use anyhow::Context;
use clap::Subcommand;
use docpush_bridge::config::BridgeConfig;
use serde::Serialize;
use tracing::debug;

use crate::output::{self, OutputFormat};

pub mod config;
pub mod publish;
pub mod watch;

#[derive(Subcommand)]
pub enum Command {
    /// Register the document's push channel once
    Watch(watch::WatchArgs),
    /// Fetch, patch and publish the document now
    Publish(publish::PublishArgs),
    /// Validate configuration and show non-secret settings
    Config(config::ConfigArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Watch(args) => watch::run(args),
        Command::Publish(args) => publish::run(args),
        Command::Config(args) => config::run(args),
    }
}

pub(crate) fn load_config() -> anyhow::Result<BridgeConfig> {
    let config = BridgeConfig::from_env().context("invalid docpush configuration")?;
    debug!(?config, "loaded configuration");
    Ok(config)
}

/// Drive one async command to completion on a fresh current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// Print a command's result or its error in `format`; the error is passed on.
pub(crate) fn report<T, F>(
    format: OutputFormat,
    result: anyhow::Result<T>,
    human_fn: F,
) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match result {
        Ok(value) => {
            output::print_output(format, &value, human_fn)?;
            Ok(())
        }
        Err(error) => {
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}
