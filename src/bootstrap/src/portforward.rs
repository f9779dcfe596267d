//! Background port-forward management.
//!
//! The ArgoCD API is reached through a background `kubectl port-forward`
//! child process that outlives the bootstrap invocation. The child is tracked
//! via a PID file under /tmp; liveness is verified against /proc so a stale
//! file from a previous run is never trusted.

use crate::error::{BootstrapError, Result};
use crate::host::HostRunner;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

pub struct PortForward {
    pid_file: PathBuf,
}

impl PortForward {
    pub fn new(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
        }
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// Start a background port-forward to a service and record its PID.
    ///
    /// Returns the PID of the running forwarder. When a live forwarder is
    /// already recorded, it is reused.
    pub async fn start(
        &self,
        runner: &HostRunner,
        namespace: &str,
        service: &str,
        local_port: u16,
        remote_port: u16,
    ) -> Result<u32> {
        if let Some(pid) = self.status() {
            tracing::warn!(
                "[PortForward] Forwarder already running (pid {}), reusing",
                pid
            );
            return Ok(pid);
        }

        let target = format!("svc/{}", service);
        let ports = format!("{}:{}", local_port, remote_port);

        tracing::info!(
            "[PortForward] Starting kubectl port-forward {} {} in namespace {}",
            target,
            ports,
            namespace
        );

        let mut cmd = tokio::process::Command::new("kubectl");
        cmd.args(["port-forward", &target, "-n", namespace, &ports])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(kubeconfig) = runner.kubeconfig() {
            cmd.env("KUBECONFIG", kubeconfig);
        }

        let child = cmd.spawn().map_err(|e| {
            BootstrapError::Host(format!("Failed to spawn kubectl port-forward: {}", e))
        })?;
        let pid = child.id().ok_or_else(|| {
            BootstrapError::Host("kubectl port-forward exited immediately".to_string())
        })?;

        std::fs::write(&self.pid_file, format!("{}\n", pid)).map_err(BootstrapError::Io)?;
        tracing::info!(
            "[PortForward] Forwarder started (pid {}), PID file {}",
            pid,
            self.pid_file.display()
        );

        // The child is intentionally left running in the background; dropping
        // the handle detaches it, matching the PID-file lifecycle.
        drop(child);

        self.wait_for_local_port(local_port, Duration::from_secs(30))
            .await?;

        Ok(pid)
    }

    /// PID of the live forwarder, if any. A recorded PID whose process is
    /// gone is treated as not running.
    pub fn status(&self) -> Option<u32> {
        let pid = read_pid_file(&self.pid_file)?;
        if pid_is_alive(pid) {
            Some(pid)
        } else {
            tracing::debug!(
                "[PortForward] Stale PID file {} (pid {} not running)",
                self.pid_file.display(),
                pid
            );
            None
        }
    }

    /// Stop the forwarder and remove the PID file. Returns whether a live
    /// process was actually signalled; stale or missing PID files are
    /// tolerated.
    pub fn stop(&self) -> Result<bool> {
        let result = match read_pid_file(&self.pid_file) {
            Some(pid) if pid_is_alive(pid) => {
                tracing::info!("[PortForward] Stopping forwarder (pid {})", pid);
                nix::sys::signal::kill(
                    nix::unistd::Pid::from_raw(pid as i32),
                    nix::sys::signal::Signal::SIGTERM,
                )
                .map_err(|e| {
                    BootstrapError::Host(format!("Failed to signal pid {}: {}", pid, e))
                })?;
                Ok(true)
            }
            Some(pid) => {
                tracing::warn!("[PortForward] PID file points at dead pid {}", pid);
                Ok(false)
            }
            None => Ok(false),
        };

        if self.pid_file.exists() {
            let _ = std::fs::remove_file(&self.pid_file);
        }

        result
    }

    /// Probe the local port until the forwarder accepts connections.
    async fn wait_for_local_port(&self, port: u16, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        let addr = format!("127.0.0.1:{}", port);

        loop {
            if start.elapsed() > timeout {
                return Err(BootstrapError::Timeout(format!(
                    "Port-forward on {} not accepting connections within {:?}",
                    addr, timeout
                )));
            }

            match tokio::net::TcpStream::connect(&addr).await {
                Ok(_) => {
                    tracing::debug!(
                        "[PortForward] Local port {} ready after {:?}",
                        port,
                        start.elapsed()
                    );
                    return Ok(());
                }
                Err(_) => {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }
}

fn read_pid_file(path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    content.trim().parse().ok()
}

/// Check whether a process is alive and not a zombie via /proc.
fn pid_is_alive(pid: u32) -> bool {
    let proc_path = format!("/proc/{}", pid);
    if !Path::new(&proc_path).exists() {
        return false;
    }

    // State is the 3rd field of /proc/<pid>/stat; Z means exited but unreaped
    let stat_path = format!("/proc/{}/stat", pid);
    match std::fs::read_to_string(&stat_path) {
        Ok(content) => content
            .split_whitespace()
            .nth(2)
            .map(|state| state != "Z")
            .unwrap_or(true),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_pid_file_parses_trimmed_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pf.pid");
        std::fs::write(&path, "12345\n").unwrap();
        assert_eq!(read_pid_file(&path), Some(12345));
    }

    #[test]
    fn read_pid_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pf.pid");
        std::fs::write(&path, "not-a-pid\n").unwrap();
        assert_eq!(read_pid_file(&path), None);
        assert_eq!(read_pid_file(&dir.path().join("missing.pid")), None);
    }

    #[test]
    fn status_ignores_stale_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pf.pid");
        // PIDs near the u32 maximum are far beyond any real pid_max
        std::fs::write(&path, "4294967294\n").unwrap();
        let forward = PortForward::new(&path);
        assert_eq!(forward.status(), None);
    }

    #[test]
    fn stop_tolerates_missing_pid_file() {
        let dir = tempfile::tempdir().unwrap();
        let forward = PortForward::new(dir.path().join("missing.pid"));
        assert!(!forward.stop().unwrap());
    }

    #[test]
    fn own_pid_is_alive() {
        assert!(pid_is_alive(std::process::id()));
    }
}
