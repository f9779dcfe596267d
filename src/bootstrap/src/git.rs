//! Git settings and scratch checkout operations.
//!
//! The GitOps repository is manipulated through the `git` CLI in a scratch
//! checkout under /tmp, mirroring how an operator would drive the demo by
//! hand. Credentials are embedded into the clone URL for https remotes.

use crate::error::{BootstrapError, Result};
use crate::host::HostRunner;
use std::path::{Path, PathBuf};

/// Resolved Git settings for the GitOps repository.
#[derive(Clone)]
pub struct GitSettings {
    pub repo_url: String,
    pub branch: String,
    pub username: String,
    pub token: String,
}

impl GitSettings {
    /// Clone URL with embedded credentials.
    ///
    /// Only http(s) remotes get userinfo; any userinfo already present in the
    /// configured URL is replaced. Other schemes (ssh) are returned unchanged
    /// and rely on the operator's own agent/keys.
    pub fn authenticated_url(&self) -> String {
        let Some(scheme_end) = self.repo_url.find("://") else {
            return self.repo_url.clone();
        };
        let scheme = &self.repo_url[..scheme_end];
        if scheme != "http" && scheme != "https" {
            return self.repo_url.clone();
        }

        let rest = &self.repo_url[scheme_end + 3..];
        let host_part = match rest.find('/') {
            Some(slash) => &rest[..slash],
            None => rest,
        };
        let rest = match host_part.rfind('@') {
            Some(at) => &rest[at + 1..],
            None => rest,
        };

        format!("{}://{}:{}@{}", scheme, self.username, self.token, rest)
    }

    /// URL safe for logging - the token never appears.
    pub fn redacted_url(&self) -> String {
        self.repo_url.clone()
    }
}

impl std::fmt::Debug for GitSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitSettings")
            .field("repo_url", &self.repo_url)
            .field("branch", &self.branch)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// A scratch checkout of the GitOps repository.
pub struct GitCheckout {
    dir: PathBuf,
    runner: HostRunner,
    branch: String,
}

impl GitCheckout {
    /// Clone the repository into `dir`, replacing any previous checkout.
    pub async fn clone_fresh(
        runner: &HostRunner,
        settings: &GitSettings,
        dir: &Path,
    ) -> Result<Self> {
        if dir.exists() {
            tracing::debug!(
                "[GitCheckout] Removing previous checkout at {}",
                dir.display()
            );
            std::fs::remove_dir_all(dir)?;
        }
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(
            "[GitCheckout] Cloning {} (branch {}) into {}",
            settings.redacted_url(),
            settings.branch,
            dir.display()
        );

        let url = settings.authenticated_url();
        let dir_str = dir.to_string_lossy().to_string();
        let output = runner
            .run(
                "git",
                &["clone", "--branch", &settings.branch, &url, &dir_str],
            )
            .await?;
        if !output.success() {
            return Err(BootstrapError::Git(format!(
                "Failed to clone {}: {}",
                settings.redacted_url(),
                output.last_stderr_line()
            )));
        }

        let checkout = Self {
            dir: dir.to_path_buf(),
            runner: runner.clone(),
            branch: settings.branch.clone(),
        };
        checkout.configure_identity("xpdemo", "xpdemo@localhost").await?;
        Ok(checkout)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Set the commit identity for this checkout only.
    async fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.git_checked(&["config", "user.name", name]).await?;
        self.git_checked(&["config", "user.email", email]).await?;
        Ok(())
    }

    /// Stage everything and commit. Returns false when there is nothing to
    /// commit (already-seeded repositories are not an error).
    pub async fn commit_all(&self, message: &str) -> Result<bool> {
        self.git_checked(&["add", "-A"]).await?;

        let staged = self
            .runner
            .git_in(&self.dir, &["diff", "--cached", "--quiet"])
            .await?;
        if staged.success() {
            tracing::warn!("[GitCheckout] Nothing to commit, working tree clean");
            return Ok(false);
        }

        self.git_checked(&["commit", "-m", message]).await?;
        Ok(true)
    }

    pub async fn push(&self) -> Result<()> {
        self.git_checked(&["push", "origin", &self.branch]).await?;
        Ok(())
    }

    /// Revert the latest commit without opening an editor.
    pub async fn revert_head(&self) -> Result<()> {
        self.git_checked(&["revert", "--no-edit", "HEAD"]).await?;
        Ok(())
    }

    pub async fn head_revision(&self) -> Result<String> {
        let output = self.git_checked(&["rev-parse", "HEAD"]).await?;
        Ok(output.stdout.trim().to_string())
    }

    pub async fn head_subject(&self) -> Result<String> {
        let output = self.git_checked(&["log", "-1", "--format=%s"]).await?;
        Ok(output.stdout.trim().to_string())
    }

    async fn git_checked(&self, args: &[&str]) -> Result<crate::host::CommandOutput> {
        let output = self.runner.git_in(&self.dir, args).await?;
        if !output.success() {
            return Err(BootstrapError::Git(format!(
                "git {} failed (exit {}): {}",
                args.join(" "),
                output.exit_code,
                output.last_stderr_line()
            )));
        }
        Ok(output)
    }
}
