// Publish one file to the website repository.
//
// Every call works in its own scratch directory: SSH material and a fresh
// clone live there and are removed when the call returns, whatever the
// outcome. Concurrent calls therefore never share a working copy; the
// remote's fast-forward check is the only coordination between them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::TempDir;
use tracing::info;

use super::ssh::{ssh_host_of, KnownHosts, PrivateKey, SshTransport};
use super::worker::{CommandExecutor, CommitIdentity, GitWorker, ProcessCommandExecutor};
use crate::config::BridgeConfig;
use crate::error::BridgeError;

pub const COMMIT_AUTHOR_NAME: &str = "docpush";
pub const COMMIT_AUTHOR_EMAIL: &str = "docpush@users.noreply.github.com";
pub const COMMIT_MESSAGE: &str = "automatically pushed by docpush";

const DEFAULT_REMOTE: &str = "origin";
const WORKING_COPY_DIR: &str = "website";
const SCRATCH_PREFIX: &str = "docpush-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A commit was created and pushed.
    Pushed { commit: String },
    /// The file already matched the branch tip; nothing was committed.
    Unchanged,
}

impl PublishOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pushed { .. } => "pushed",
            Self::Unchanged => "unchanged",
        }
    }
}

#[derive(Clone)]
pub struct PublisherSettings {
    pub repo_url: String,
    pub target_file: PathBuf,
    pub scratch_root: PathBuf,
    /// Private key, newlines escaped or not.
    pub ssh_private_key: String,
    pub ssh_known_hosts: String,
}

impl std::fmt::Debug for PublisherSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherSettings")
            .field("repo_url", &self.repo_url)
            .field("target_file", &self.target_file)
            .field("scratch_root", &self.scratch_root)
            .finish_non_exhaustive()
    }
}

impl PublisherSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            repo_url: config.repo_url.clone(),
            target_file: config.target_file.clone(),
            scratch_root: config.scratch_root.clone(),
            ssh_private_key: config.ssh_private_key.clone(),
            ssh_known_hosts: config.ssh_known_hosts.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitPublisher<E = ProcessCommandExecutor> {
    settings: PublisherSettings,
    executor: E,
    identity: CommitIdentity,
}

impl GitPublisher<ProcessCommandExecutor> {
    pub fn new(settings: PublisherSettings) -> Self {
        Self::with_executor(settings, ProcessCommandExecutor)
    }
}

impl<E: CommandExecutor + Clone> GitPublisher<E> {
    pub fn with_executor(settings: PublisherSettings, executor: E) -> Self {
        Self {
            settings,
            executor,
            identity: CommitIdentity {
                name: COMMIT_AUTHOR_NAME.to_string(),
                email: COMMIT_AUTHOR_EMAIL.to_string(),
            },
        }
    }

    pub fn identity(&self) -> &CommitIdentity {
        &self.identity
    }

    /// Clone, overwrite the target file with `content`, commit and push.
    ///
    /// Each step runs once; the first failure is returned and the scratch
    /// directory is removed.
    pub fn publish(&self, content: &[u8]) -> Result<PublishOutcome, BridgeError> {
        let settings = &self.settings;

        info!("parsing the deploy key");
        let key = PrivateKey::parse(&settings.ssh_private_key)?;
        let known_hosts = KnownHosts::parse(&settings.ssh_known_hosts)?;
        if let Some(host) = ssh_host_of(&settings.repo_url) {
            known_hosts.ensure_may_cover(&host)?;
        }

        let scratch = create_scratch_dir(&settings.scratch_root)?;
        info!(scratch = %scratch.path().display(), "writing ssh material");
        let transport = SshTransport::materialize(scratch.path(), &key, &known_hosts)?;

        let worker = GitWorker::with_executor(
            scratch.path().join(WORKING_COPY_DIR),
            self.executor.clone(),
        )
        .with_config_args(transport.git_config_args());

        info!(repo_url = %settings.repo_url, "cloning repository");
        worker.clone_from(&settings.repo_url)?;

        info!("pulling");
        worker.pull(DEFAULT_REMOTE)?;

        let target_label = settings.target_file.to_string_lossy().replace('\\', "/");
        info!(file = %target_label, bytes = content.len(), "writing the published file");
        write_target(worker.repo_path(), &settings.target_file, content)?;

        worker.add(&[target_label.as_str()])?;
        let status = worker.status_porcelain(&[target_label.as_str()])?;
        if status.stdout.trim().is_empty() {
            info!(file = %target_label, "content matches the branch tip; skipping commit");
            return Ok(PublishOutcome::Unchanged);
        }

        info!("committing");
        worker.commit_as(COMMIT_MESSAGE, &self.identity, Utc::now())?;

        info!("pushing");
        worker.push(DEFAULT_REMOTE)?;

        let commit = worker.rev_parse_head()?.stdout.trim().to_string();
        info!(commit = %commit, "published");
        Ok(PublishOutcome::Pushed { commit })
    }
}

fn create_scratch_dir(root: &Path) -> Result<TempDir, BridgeError> {
    fs::create_dir_all(root).map_err(|error| {
        BridgeError::io(format!("failed to create scratch root `{}`", root.display()), error)
    })?;
    tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir_in(root).map_err(|error| {
        BridgeError::io(format!("failed to create scratch directory in `{}`", root.display()), error)
    })
}

fn write_target(repo_path: &Path, target_file: &Path, content: &[u8]) -> Result<(), BridgeError> {
    let path = repo_path.join(target_file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|error| {
            BridgeError::io(format!("failed to create `{}`", parent.display()), error)
        })?;
    }
    fs::write(&path, content)
        .map_err(|error| BridgeError::io(format!("failed to write `{}`", path.display()), error))
}
