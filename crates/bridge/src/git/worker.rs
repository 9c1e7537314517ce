use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GitWorkerError {
    #[error("git add requires at least one path")]
    EmptyAddPaths,

    #[error("failed to run `{command}`: {message}")]
    SpawnFailed { command: String, message: String },

    #[error("`{command}` failed with code {code:?}: {}", stderr.trim())]
    CommandFailed { command: String, code: Option<i32>, stderr: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;
        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Name and email recorded as both author and committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// Runs git against one working copy.
///
/// `config_args` are `-c key=value` pairs placed before every subcommand;
/// they are left out of the command text reported in errors.
#[derive(Debug, Clone)]
pub struct GitWorker<E = ProcessCommandExecutor> {
    repo_path: PathBuf,
    executor: E,
    config_args: Vec<String>,
}

impl GitWorker<ProcessCommandExecutor> {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self { repo_path: repo_path.into(), executor: ProcessCommandExecutor, config_args: Vec::new() }
    }
}

impl<E: CommandExecutor> GitWorker<E> {
    pub fn with_executor(repo_path: impl Into<PathBuf>, executor: E) -> Self {
        Self { repo_path: repo_path.into(), executor, config_args: Vec::new() }
    }

    pub fn with_config_args(mut self, config_args: Vec<String>) -> Self {
        self.config_args = config_args;
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Clone `url` into the worker's repository path.
    ///
    /// Runs from the parent directory, which must already exist.
    pub fn clone_from(&self, url: &str) -> Result<GitCommandOutput, GitWorkerError> {
        let parent = self.repo_path.parent().unwrap_or(Path::new("."));
        let destination = self.repo_path.to_string_lossy().into_owned();
        self.run_in(parent, &[], vec!["clone".to_string(), url.to_string(), destination])
    }

    /// Fast-forward from `remote`. "Already up to date." exits 0.
    pub fn pull(&self, remote: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["pull".to_string(), "--ff-only".to_string(), remote.to_string()])
    }

    pub fn add<S: AsRef<str>>(&self, paths: &[S]) -> Result<GitCommandOutput, GitWorkerError> {
        if paths.is_empty() {
            return Err(GitWorkerError::EmptyAddPaths);
        }

        let mut args = vec!["add".to_string(), "--".to_string()];
        args.extend(paths.iter().map(|path| path.as_ref().to_string()));
        self.run(args)
    }

    /// Porcelain status limited to `paths`; empty stdout means no changes.
    pub fn status_porcelain<S: AsRef<str>>(
        &self,
        paths: &[S],
    ) -> Result<GitCommandOutput, GitWorkerError> {
        let mut args = vec!["status".to_string(), "--porcelain".to_string(), "--".to_string()];
        args.extend(paths.iter().map(|path| path.as_ref().to_string()));
        self.run(args)
    }

    pub fn commit_as(
        &self,
        message: &str,
        identity: &CommitIdentity,
        when: DateTime<Utc>,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        let identity_config = vec![
            "-c".to_string(),
            format!("user.name={}", identity.name),
            "-c".to_string(),
            format!("user.email={}", identity.email),
        ];
        self.run_in(
            &self.repo_path,
            &identity_config,
            vec![
                "commit".to_string(),
                "-m".to_string(),
                message.to_string(),
                format!("--author={} <{}>", identity.name, identity.email),
                format!("--date={} +0000", when.timestamp()),
            ],
        )
    }

    pub fn push(&self, remote: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["push".to_string(), remote.to_string(), "HEAD".to_string()])
    }

    pub fn rev_parse_head(&self) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["rev-parse".to_string(), "HEAD".to_string()])
    }

    fn run(&self, args: Vec<String>) -> Result<GitCommandOutput, GitWorkerError> {
        self.run_in(&self.repo_path, &[], args)
    }

    fn run_in(
        &self,
        cwd: &Path,
        extra_config: &[String],
        args: Vec<String>,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        let command = format!("git {}", args.join(" "));

        let mut full_args = self.config_args.clone();
        full_args.extend_from_slice(extra_config);
        full_args.extend(args);

        let result = self.executor.execute("git", &full_args, cwd).map_err(|error| {
            GitWorkerError::SpawnFailed { command: command.clone(), message: error.to_string() }
        })?;

        if result.success {
            return Ok(GitCommandOutput { stdout: result.stdout, stderr: result.stderr });
        }

        let stderr = if result.stderr.trim().is_empty() { result.stdout } else { result.stderr };

        Err(GitWorkerError::CommandFailed { command, code: result.code, stderr })
    }
}
