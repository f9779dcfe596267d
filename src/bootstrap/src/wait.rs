//! Polling waits against external reconciliation.
//!
//! The controllers (Crossplane, ArgoCD) reconcile asynchronously; these
//! helpers approximate that with bounded deadline + interval polling of
//! status fields. Transient poll failures are warned and retried; only the
//! deadline is fatal.

use crate::error::{BootstrapError, Result};
use crate::host::HostRunner;
use std::time::{Duration, Instant};

/// Deadline and interval for a polling wait.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            interval: Duration::from_secs(5),
        }
    }
}

impl PollSettings {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Wait for an ArgoCD Application to report Synced and Healthy.
///
/// When `expected_revision` is set, the sync must additionally point at that
/// commit - this is what makes the demo's update/rollback waits observe the
/// specific push rather than a stale sync.
pub async fn wait_for_application_synced(
    runner: &HostRunner,
    name: &str,
    namespace: &str,
    expected_revision: Option<&str>,
    settings: PollSettings,
) -> Result<()> {
    tracing::info!(
        "[Wait] Waiting for application {} to be Synced/Healthy{}",
        name,
        expected_revision
            .map(|r| format!(" at {}", short_rev(r)))
            .unwrap_or_default()
    );

    let start = Instant::now();
    let resource = format!("application.argoproj.io/{}", name);
    // Explicit separator keeps the fields aligned while the status is still
    // partially populated (git revisions never contain '/')
    let jsonpath =
        r#"jsonpath={.status.sync.status}{"/"}{.status.health.status}{"/"}{.status.sync.revision}"#;

    loop {
        if start.elapsed() > settings.timeout {
            return Err(BootstrapError::Timeout(format!(
                "Application {} did not reach Synced/Healthy within {:?}",
                name, settings.timeout
            )));
        }

        match runner
            .kubectl(&["get", &resource, "-n", namespace, "-o", jsonpath])
            .await
        {
            Ok(output) if output.success() => {
                let mut fields = output.stdout.trim().split('/');
                let sync = fields.next().unwrap_or("");
                let health = fields.next().unwrap_or("");
                let revision = fields.next().unwrap_or("");

                tracing::debug!(
                    "[Wait] Application {}: sync={} health={} revision={}",
                    name,
                    sync,
                    health,
                    short_rev(revision)
                );

                let revision_ok = match expected_revision {
                    Some(expected) => revision == expected,
                    None => true,
                };

                if sync == "Synced" && health == "Healthy" && revision_ok {
                    tracing::info!(
                        "[Wait] Application {} is Synced/Healthy (took {:?})",
                        name,
                        start.elapsed()
                    );
                    return Ok(());
                }
            }
            Ok(output) => {
                // The Application may not exist yet right after apply
                tracing::warn!(
                    "[Wait] Application {} poll failed (retrying): {}",
                    name,
                    output.last_stderr_line()
                );
            }
            Err(e) => {
                tracing::warn!("[Wait] Application {} poll failed (retrying): {}", name, e);
            }
        }

        tokio::time::sleep(settings.interval).await;
    }
}

/// Wait for a Deployment to report the Available condition.
pub async fn wait_for_deployment_available(
    runner: &HostRunner,
    name: &str,
    namespace: &str,
    timeout: Duration,
) -> Result<()> {
    tracing::info!(
        "[Wait] Waiting for deployment {}/{} to become Available",
        namespace,
        name
    );

    let resource = format!("deployment/{}", name);
    let timeout_arg = format!("--timeout={}s", timeout.as_secs());
    let output = runner
        .run_in(
            None,
            "kubectl",
            &[
                "wait",
                &resource,
                "-n",
                namespace,
                "--for=condition=Available",
                &timeout_arg,
            ],
            timeout + Duration::from_secs(30),
        )
        .await?;

    if !output.success() {
        return Err(BootstrapError::Timeout(format!(
            "Deployment {}/{} did not become Available within {:?}: {}",
            namespace,
            name,
            timeout,
            output.last_stderr_line()
        )));
    }

    Ok(())
}

fn short_rev(revision: &str) -> String {
    revision.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rev_truncates() {
        assert_eq!(short_rev("0123456789abcdef"), "01234567");
        assert_eq!(short_rev("abc"), "abc");
        assert_eq!(short_rev(""), "");
    }
}
