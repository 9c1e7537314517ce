// `docpush watch`: register the document push channel.

use anyhow::Context;
use clap::Args;
use docpush_bridge::config::BridgeConfig;
use docpush_bridge::handler::Bridge;
use serde::{Deserialize, Serialize};

use super::{block_on, load_config, report};
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchResult {
    pub document_id: String,
    pub channel_id: String,
    pub callback_url: String,
    pub status: String,
}

pub fn run(args: WatchArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = load_config().and_then(|config| block_on(register(config))?);
    report(format, result, format_human)
}

async fn register(config: BridgeConfig) -> anyhow::Result<WatchResult> {
    let bridge = Bridge::from_config(&config).context("failed to build document bridge")?;
    let status = bridge
        .renew_subscription()
        .await
        .context("failed to register the document push channel")?;

    Ok(WatchResult {
        document_id: config.document_id,
        channel_id: config.channel_id,
        callback_url: config.callback_url.clone(),
        status: status.as_str().to_string(),
    })
}

fn format_human(result: &WatchResult) -> String {
    let verb = match result.status.as_str() {
        "already_registered" => "already delivering",
        _ => "now delivering",
    };
    format!(
        "Channel {} {verb} changes of {} to {}",
        result.channel_id, result.document_id, result.callback_url
    )
}
