use std::ffi::OsString;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::PipelineConfig;
use crate::contract::{PublishTransaction, Repository};
use crate::error::{PublishError, PublishStep};

/// [`Repository`] backed by the `git` command line, run inside the working tree.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
    remote: Option<String>,
    branch: Option<String>,
}

impl GitRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            remote: None,
            branch: None,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            root: config.repo_path.clone(),
            remote: config.remote.clone(),
            branch: config.branch.clone(),
        }
    }

    /// Push to `remote` (and `branch`, if given) instead of the upstream default.
    pub fn with_remote(mut self, remote: impl Into<String>, branch: Option<String>) -> Self {
        self.remote = Some(remote.into());
        self.branch = branch;
        self
    }

    async fn run(&self, step: PublishStep, args: Vec<OsString>) -> Result<(), PublishError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(&args)
            .output()
            .await;

        match output {
            Ok(o) if o.status.success() => {
                tracing::info!(
                    step = %step,
                    path = %self.root.display(),
                    status = ?o.status,
                    "git step succeeded"
                );
                Ok(())
            }
            Ok(o) => {
                let stderr = String::from_utf8_lossy(&o.stderr).trim().to_string();
                tracing::error!(
                    step = %step,
                    path = %self.root.display(),
                    stderr = %stderr,
                    "git exited with non-zero code: {}", o.status
                );
                Err(PublishError::new(step, format!("{}: {stderr}", o.status)))
            }
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    step = %step,
                    path = %self.root.display(),
                    "Failed to launch git process"
                );
                Err(PublishError::new(step, format!("failed to launch git: {e}")))
            }
        }
    }
}

#[async_trait]
impl Repository for GitRepository {
    async fn publish(&self, transaction: &PublishTransaction) -> Result<(), PublishError> {
        let mut add: Vec<OsString> = vec!["add".into(), "--".into()];
        add.extend(transaction.paths.iter().map(|p| p.as_os_str().to_owned()));
        self.run(PublishStep::Add, add).await?;

        let commit = vec!["commit".into(), "-m".into(), transaction.message.clone().into()];
        self.run(PublishStep::Commit, commit).await?;

        let mut push: Vec<OsString> = vec!["push".into()];
        if let Some(remote) = &self.remote {
            push.push(remote.into());
            if let Some(branch) = &self.branch {
                push.push(branch.into());
            }
        }
        self.run(PublishStep::Push, push).await
    }
}
