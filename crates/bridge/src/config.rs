// Bridge configuration.
//
// Everything comes from environment variables. Deployment-specific values
// (document, channel, repository, key material) are required; server and
// endpoint settings fall back to production defaults.

use std::fmt::{Debug, Formatter};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use url::Url;

pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_GIT_HOST: &str = "github.com";
pub const DEFAULT_TARGET_FILE: &str = "index.html";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Settings for one deployment: which document feeds which repository.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Listen address (host:port).
    pub listen_addr: SocketAddr,
    /// Log filter directive (e.g. `info`, `docpush_bridge=debug`).
    pub log_filter: String,
    /// Drive file id of the watched document.
    pub document_id: String,
    /// Caller-chosen push channel id.
    pub channel_id: String,
    /// Address Drive posts notifications to, registered exactly as configured.
    pub callback_url: String,
    /// Service-account JSON key, verbatim.
    pub service_account_key: String,
    /// Drive v3 API base, without a trailing slash.
    pub drive_api_base: String,
    /// `owner/name` of the target repository.
    pub repo_name: String,
    /// Remote the publisher clones and pushes.
    pub repo_url: String,
    /// SSH host named in [`BridgeConfig::repo_url`].
    pub git_host: String,
    /// Private key with newlines still escaped as `\n`.
    pub ssh_private_key: String,
    /// Known-hosts text.
    pub ssh_known_hosts: String,
    /// File written inside the working copy.
    pub target_file: PathBuf,
    /// Parent of per-invocation scratch directories.
    pub scratch_root: PathBuf,
}

impl Debug for BridgeConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("listen_addr", &self.listen_addr)
            .field("log_filter", &self.log_filter)
            .field("document_id", &self.document_id)
            .field("channel_id", &self.channel_id)
            .field("callback_url", &self.callback_url)
            .field("service_account_key", &"<redacted>")
            .field("drive_api_base", &self.drive_api_base)
            .field("repo_name", &self.repo_name)
            .field("repo_url", &self.repo_url)
            .field("git_host", &self.git_host)
            .field("ssh_private_key", &"<redacted>")
            .field("ssh_known_hosts", &"<redacted>")
            .field("target_file", &self.target_file)
            .field("scratch_root", &self.scratch_root)
            .finish()
    }
}

impl BridgeConfig {
    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `DOCPUSH_DOCUMENT_ID` | *(required)* |
    /// | `DOCPUSH_CHANNEL_ID` | *(required)* |
    /// | `DOCPUSH_CALLBACK_URL` | *(required)* |
    /// | `DOCPUSH_SERVICE_ACCOUNT_KEY` | *(required)* |
    /// | `DOCPUSH_REPO_NAME` | *(required)* |
    /// | `DOCPUSH_SSH_PRIVATE_KEY` | *(required)* |
    /// | `DOCPUSH_SSH_KNOWN_HOSTS` | *(required)* |
    /// | `DOCPUSH_GIT_HOST` | `github.com` |
    /// | `DOCPUSH_REPO_URL` | `git@{host}:{repo}.git` |
    /// | `DOCPUSH_TARGET_FILE` | `index.html` |
    /// | `DOCPUSH_DRIVE_API_BASE` | `https://www.googleapis.com/drive/v3` |
    /// | `DOCPUSH_SCRATCH_DIR` | system temp dir |
    /// | `DOCPUSH_HOST` | `0.0.0.0` |
    /// | `DOCPUSH_PORT` | `8080` |
    /// | `DOCPUSH_LOG_FILTER` | `info` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    pub fn from_env_fn<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let optional = |key: &str| env(key).ok().filter(|value| !value.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |key: &'static str| match optional(key) {
            Some(value) => value,
            None => {
                missing.push(key);
                String::new()
            }
        };

        let document_id = required("DOCPUSH_DOCUMENT_ID");
        let channel_id = required("DOCPUSH_CHANNEL_ID");
        let callback_url = required("DOCPUSH_CALLBACK_URL");
        let service_account_key = required("DOCPUSH_SERVICE_ACCOUNT_KEY");
        let repo_name = required("DOCPUSH_REPO_NAME");
        let ssh_private_key = required("DOCPUSH_SSH_PRIVATE_KEY");
        let ssh_known_hosts = required("DOCPUSH_SSH_KNOWN_HOSTS");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let callback_url = callback_url.trim().to_string();
        Url::parse(&callback_url).map_err(|error| ConfigError::Invalid {
            var: "DOCPUSH_CALLBACK_URL",
            reason: error.to_string(),
        })?;

        let repo_name = repo_name.trim().trim_end_matches(".git").to_string();
        let git_host = optional("DOCPUSH_GIT_HOST").unwrap_or_else(|| DEFAULT_GIT_HOST.into());
        let repo_url =
            optional("DOCPUSH_REPO_URL").unwrap_or_else(|| ssh_remote_url(&git_host, &repo_name));

        let target_file = PathBuf::from(
            optional("DOCPUSH_TARGET_FILE").unwrap_or_else(|| DEFAULT_TARGET_FILE.into()),
        );
        validate_target_file(&target_file)?;

        let drive_api_base = optional("DOCPUSH_DRIVE_API_BASE")
            .unwrap_or_else(|| DEFAULT_DRIVE_API_BASE.into())
            .trim_end_matches('/')
            .to_string();

        let scratch_root =
            optional("DOCPUSH_SCRATCH_DIR").map(PathBuf::from).unwrap_or_else(std::env::temp_dir);

        let host = optional("DOCPUSH_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = optional("DOCPUSH_PORT").and_then(|v| v.parse().ok()).unwrap_or(8080);
        let listen_addr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));

        let log_filter = optional("DOCPUSH_LOG_FILTER").unwrap_or_else(|| "info".into());

        Ok(Self {
            listen_addr,
            log_filter,
            document_id: document_id.trim().to_string(),
            channel_id: channel_id.trim().to_string(),
            callback_url,
            service_account_key,
            drive_api_base,
            repo_name,
            repo_url,
            git_host,
            ssh_private_key,
            ssh_known_hosts,
            target_file,
            scratch_root,
        })
    }
}

/// `git@{host}:{repo}.git`
pub fn ssh_remote_url(host: &str, repo_name: &str) -> String {
    format!("git@{host}:{repo_name}.git")
}

fn validate_target_file(path: &Path) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        var: "DOCPUSH_TARGET_FILE",
        reason: reason.to_string(),
    };

    if path.components().any(|component| !matches!(component, Component::Normal(_))) {
        return Err(invalid("must be a relative path inside the repository"));
    }
    if path.components().next().is_some_and(|first| first.as_os_str() == ".git") {
        return Err(invalid("must not point into the .git directory"));
    }
    Ok(())
}
