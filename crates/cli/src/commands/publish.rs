// `docpush publish`: fetch, patch and publish the document without waiting for a webhook.

use anyhow::Context;
use clap::Args;
use docpush_bridge::config::BridgeConfig;
use docpush_bridge::git::publisher::PublishOutcome;
use docpush_bridge::handler::Bridge;
use serde::{Deserialize, Serialize};

use super::{block_on, load_config, report};
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishResult {
    pub document_id: String,
    pub repo_url: String,
    pub target_file: String,
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl PublishResult {
    fn new(config: &BridgeConfig, outcome: &PublishOutcome) -> Self {
        let commit = match outcome {
            PublishOutcome::Pushed { commit } => Some(commit.clone()),
            PublishOutcome::Unchanged => None,
        };
        Self {
            document_id: config.document_id.clone(),
            repo_url: config.repo_url.clone(),
            target_file: config.target_file.to_string_lossy().into_owned(),
            outcome: outcome.as_str().to_string(),
            commit,
        }
    }
}

pub fn run(args: PublishArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = load_config().and_then(|config| block_on(publish(config))?);
    report(format, result, format_human)
}

async fn publish(config: BridgeConfig) -> anyhow::Result<PublishResult> {
    let bridge = Bridge::from_config(&config).context("failed to build document bridge")?;
    let outcome = bridge.sync_now().await.context("publish failed")?;
    Ok(PublishResult::new(&config, &outcome))
}

fn format_human(result: &PublishResult) -> String {
    match &result.commit {
        Some(commit) => format!(
            "Published {} to {} ({}) as {}",
            result.document_id,
            result.target_file,
            result.repo_url,
            short_commit(commit)
        ),
        None => format!(
            "{} in {} already matches {}; nothing to publish",
            result.target_file, result.repo_url, result.document_id
        ),
    }
}

fn short_commit(commit: &str) -> &str {
    commit.get(..12).unwrap_or(commit)
}
