/// Generic workflow executor for bootstrap tasks.
///
/// Runs a sequence of BootstrapTasks against the host with progress reporting.
/// Fail-fast: the first failing task aborts the sequence.
use crate::error::{BootstrapError, Result};
use crate::host::{CommandOutput, HostRunner};
use crate::tasks::{BootstrapTask, KubectlAction};
use std::path::PathBuf;

/// Execution context for bootstrap tasks.
pub struct TaskExecutor {
    runner: HostRunner,
    work_dir: PathBuf,
}

impl TaskExecutor {
    pub fn new(runner: HostRunner, work_dir: PathBuf) -> Self {
        Self { runner, work_dir }
    }

    pub fn runner(&self) -> &HostRunner {
        &self.runner
    }

    /// Execute a single task
    pub async fn execute(&self, task: &BootstrapTask) -> Result<CommandOutput> {
        match task {
            BootstrapTask::Exec(exec_task) => {
                tracing::info!("[TaskExecutor] Executing {}", exec_task.display_name());
                let args: Vec<&str> = exec_task.args.iter().map(String::as_str).collect();
                self.runner
                    .run_in(None, &exec_task.program, &args, exec_task.timeout)
                    .await
            }
            BootstrapTask::Kubectl(kubectl_task) => self.execute_kubectl(kubectl_task).await,
            BootstrapTask::Wait(wait_task) => {
                tracing::info!(
                    "[TaskExecutor] Waiting for {} condition={}",
                    wait_task.resource,
                    wait_task.condition
                );
                let args = wait_task.to_args();
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                // Give the child a grace margin over kubectl's own timeout
                let child_timeout = wait_task.timeout + std::time::Duration::from_secs(30);
                self.runner
                    .run_in(None, "kubectl", &args, child_timeout)
                    .await
            }
        }
    }

    /// Execute kubectl apply/delete with the manifest written to a temp file
    async fn execute_kubectl(
        &self,
        task: &crate::tasks::KubectlTask,
    ) -> Result<CommandOutput> {
        tracing::info!(
            "[TaskExecutor] Executing {}: {}",
            task.action_str(),
            task.name
        );

        let manifest_dir = self.work_dir.join(format!("kubectl-{}", unique_suffix()));
        std::fs::create_dir_all(&manifest_dir).map_err(BootstrapError::Io)?;
        let manifest_file = manifest_dir.join("manifest.yaml");

        tracing::debug!(
            "[TaskExecutor] Writing manifest for {} ({} bytes) to {:?}",
            task.name,
            task.manifest_content.len(),
            manifest_file
        );
        std::fs::write(&manifest_file, &task.manifest_content).map_err(BootstrapError::Io)?;

        let file_arg = manifest_file.to_string_lossy().to_string();
        let args: Vec<&str> = match task.action {
            KubectlAction::Apply => vec!["apply", "-f", &file_arg],
            KubectlAction::Delete => {
                vec!["delete", "--ignore-not-found=true", "-f", &file_arg]
            }
        };

        let result = self
            .runner
            .run_in(None, "kubectl", &args, task.timeout)
            .await;

        // Cleanup temp directory
        let _ = std::fs::remove_dir_all(&manifest_dir);

        let result = result?;

        if !result.success() {
            tracing::error!(
                "[TaskExecutor] {} failed with exit code {}: {}",
                task.display_name(),
                result.exit_code,
                result.stderr
            );
        } else {
            tracing::info!("[TaskExecutor] {} completed successfully", task.display_name());
        }

        Ok(result)
    }
}

/// Execute a sequence of bootstrap tasks with progress tracking.
/// Fail-fast: stops on the first task failure.
pub async fn run_tasks<F>(
    tasks: &[BootstrapTask],
    executor: &TaskExecutor,
    progress_start: u32,
    progress_end: u32,
    progress_fn: F,
    failure_context: &str,
) -> Result<()>
where
    F: Fn(u32, &str),
{
    if tasks.is_empty() {
        return Ok(());
    }

    let total_tasks = tasks.len() as u32;
    let span = progress_end.saturating_sub(progress_start);

    for (index, task) in tasks.iter().enumerate() {
        let progress = progress_start + span.saturating_mul(index as u32) / total_tasks.max(1);
        let display_name = task.display_name();

        progress_fn(progress, &format!("Executing {}", display_name));

        let task_start = std::time::Instant::now();
        let result = executor.execute(task).await?;
        let task_duration = task_start.elapsed();

        if !result.success() {
            tracing::warn!(
                "[TIMING] Task {} failed after {}ms",
                display_name,
                task_duration.as_millis()
            );
            return Err(BootstrapError::Host(format!(
                "{} operation {} failed with exit code {}: {}",
                failure_context,
                display_name,
                result.exit_code,
                result.last_stderr_line(),
            )));
        }

        tracing::info!(
            "[TIMING] Task {} completed in {}ms",
            display_name,
            task_duration.as_millis()
        );

        let completion_progress = if index + 1 < tasks.len() {
            progress_start + span.saturating_mul((index + 1) as u32) / total_tasks.max(1)
        } else {
            progress_end
        };
        progress_fn(completion_progress, &format!("Completed {}", display_name));
    }

    Ok(())
}

/// Unique suffix for temp manifest directories
fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:x}{:x}", duration.as_secs(), duration.subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_suffix_is_hex() {
        let suffix = unique_suffix();
        assert!(!suffix.is_empty());
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
