// `docpush config`: validate configuration and show non-secret settings.

use clap::Args;
use docpush_bridge::config::BridgeConfig;
use docpush_bridge::git::ssh::{ssh_host_of, KnownHosts, PrivateKey};
use docpush_bridge::google::credentials::ServiceAccountKey;
use serde::{Deserialize, Serialize};

use super::{load_config, report};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigSummary {
    pub listen_addr: String,
    pub log_filter: String,
    pub document_id: String,
    pub channel_id: String,
    pub callback_url: String,
    pub drive_api_base: String,
    pub repo_name: String,
    pub repo_url: String,
    pub target_file: String,
    pub scratch_root: String,
    pub checks: Vec<Check>,
}

/// One credential sanity check. Secrets are never echoed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn from_result<T, E: std::fmt::Display>(
        name: &str,
        result: Result<T, E>,
        describe: impl FnOnce(T) -> String,
    ) -> Self {
        match result {
            Ok(value) => Self { name: name.to_string(), ok: true, detail: describe(value) },
            Err(error) => Self { name: name.to_string(), ok: false, detail: error.to_string() },
        }
    }
}

impl ConfigSummary {
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(|check| check.ok)
    }
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = load_config().map(|config| summarize(&config));
    let failed = result.as_ref().map(|summary| !summary.all_ok()).unwrap_or(false);

    report(format, result, format_human)?;
    if failed {
        let message = "configuration loaded but some credential checks failed";
        output::print_error(format, "CONFIG_CHECK_FAILED", message);
        anyhow::bail!(message);
    }
    Ok(())
}

pub(crate) fn summarize(config: &BridgeConfig) -> ConfigSummary {
    let mut checks = vec![
        Check::from_result(
            "service_account_key",
            ServiceAccountKey::from_json(&config.service_account_key),
            |key| format!("{} via {}", key.client_email(), key.token_uri()),
        ),
        Check::from_result("ssh_private_key", PrivateKey::parse(&config.ssh_private_key), |key| {
            format!("{} key", key.format().as_str())
        }),
    ];

    let known_hosts = KnownHosts::parse(&config.ssh_known_hosts);
    checks.push(match (&known_hosts, ssh_host_of(&config.repo_url)) {
        (Ok(hosts), Some(host)) => Check::from_result(
            "ssh_known_hosts",
            hosts.ensure_may_cover(&host),
            |()| format!("{} entries, {host} listed", hosts.entries().len()),
        ),
        (Ok(hosts), None) => Check {
            name: "ssh_known_hosts".into(),
            ok: true,
            detail: format!("{} entries, remote does not use ssh", hosts.entries().len()),
        },
        (Err(error), _) => {
            Check { name: "ssh_known_hosts".into(), ok: false, detail: error.to_string() }
        }
    });

    ConfigSummary {
        listen_addr: config.listen_addr.to_string(),
        log_filter: config.log_filter.clone(),
        document_id: config.document_id.clone(),
        channel_id: config.channel_id.clone(),
        callback_url: config.callback_url.clone(),
        drive_api_base: config.drive_api_base.clone(),
        repo_name: config.repo_name.clone(),
        repo_url: config.repo_url.clone(),
        target_file: config.target_file.to_string_lossy().into_owned(),
        scratch_root: config.scratch_root.display().to_string(),
        checks,
    }
}

fn format_human(summary: &ConfigSummary) -> String {
    let mut lines = vec![
        format!("document     {}", summary.document_id),
        format!("channel      {} -> {}", summary.channel_id, summary.callback_url),
        format!("drive api    {}", summary.drive_api_base),
        format!("repository   {} ({})", summary.repo_name, summary.repo_url),
        format!("target file  {}", summary.target_file),
        format!("scratch      {}", summary.scratch_root),
        format!("listen       {} (log filter `{}`)", summary.listen_addr, summary.log_filter),
        String::new(),
    ];
    for check in &summary.checks {
        let mark = if check.ok { "ok  " } else { "FAIL" };
        lines.push(format!("[{mark}] {}: {}", check.name, check.detail));
    }
    lines.join("\n")
}
