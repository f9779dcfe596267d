//! Host CLI invocation.
//!
//! Every meaningful operation of the demo bootstrap is delegated to external
//! CLIs (`kind`, `kubectl`, `helm`, `argocd`, `git`, `docker`). This module is
//! the single place where those child processes are spawned: output is
//! captured, the command line is logged before execution, and each call runs
//! under a timeout.

use crate::error::{BootstrapError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// Captured output from a host command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty stderr line, for compact error messages.
    pub fn last_stderr_line(&self) -> &str {
        self.stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("No output available")
    }
}

/// Runner for host binaries.
///
/// Carries the kubeconfig extract path so every `kubectl`/`helm`/`argocd`
/// invocation targets the demo cluster regardless of the operator's own
/// KUBECONFIG.
#[derive(Debug, Clone)]
pub struct HostRunner {
    kubeconfig: Option<PathBuf>,
    default_timeout: Duration,
}

impl Default for HostRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRunner {
    pub fn new() -> Self {
        Self {
            kubeconfig: None,
            default_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_kubeconfig(kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: Some(kubeconfig.into()),
            default_timeout: Duration::from_secs(600),
        }
    }

    pub fn kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig.as_deref()
    }

    /// Run a host binary, capturing output. Non-zero exit is NOT an error;
    /// callers that tolerate failure inspect the returned output.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        self.run_in(None, program, args, self.default_timeout).await
    }

    /// Run a host binary and fail on non-zero exit.
    pub async fn run_checked(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(program, args).await?;
        if !output.success() {
            return Err(BootstrapError::Host(format!(
                "{} {} failed (exit {}): {}",
                program,
                args.join(" "),
                output.exit_code,
                output.last_stderr_line()
            )));
        }
        Ok(output)
    }

    /// Run a host binary in a working directory with an explicit timeout.
    pub async fn run_in(
        &self,
        dir: Option<&Path>,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput> {
        tracing::debug!("[HostRunner] $ {} {}", program, args.join(" "));

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            cmd.env("KUBECONFIG", kubeconfig);
        }

        let start = std::time::Instant::now();
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BootstrapError::Host(format!("`{}` not found on PATH", program))
                } else {
                    BootstrapError::Host(format!("Failed to execute {}: {}", program, e))
                }
            })?,
            Err(_) => {
                return Err(BootstrapError::Timeout(format!(
                    "{} {} did not finish within {:?}",
                    program,
                    args.join(" "),
                    timeout
                )));
            }
        };

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        tracing::debug!(
            "[HostRunner] {} exited {} in {}ms",
            program,
            result.exit_code,
            start.elapsed().as_millis()
        );

        Ok(result)
    }

    pub async fn kubectl(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run("kubectl", args).await
    }

    pub async fn kubectl_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run_checked("kubectl", args).await
    }

    pub async fn helm(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run("helm", args).await
    }

    pub async fn helm_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run_checked("helm", args).await
    }

    pub async fn kind(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run("kind", args).await
    }

    pub async fn kind_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run_checked("kind", args).await
    }

    pub async fn argocd(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run("argocd", args).await
    }

    /// Run git inside a checkout directory.
    pub async fn git_in(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput> {
        self.run_in(Some(dir), "git", args, Duration::from_secs(120))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_stderr_line_picks_last_non_empty() {
        let output = CommandOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: "first\nsecond\n\n".to_string(),
        };
        assert_eq!(output.last_stderr_line(), "second");
    }

    #[test]
    fn last_stderr_line_empty_stderr() {
        let output = CommandOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(output.last_stderr_line(), "No output available");
    }
}
