//! Host requirements checker for the demo bootstrap.
//!
//! Verifies that the machine can run the demo before anything is created:
//! - required CLIs (`kind`, `kubectl`, `helm`, `git`, `docker`)
//! - the optional `argocd` CLI
//! - a reachable Docker daemon
//! - inotify limits high enough for kind nodes

use std::fs;
use std::path::Path;
use std::process::Command;

/// Minimum inotify limits for kind clusters; below these, kubelet and other
/// watch-heavy components fail with "too many open files".
pub const MIN_INOTIFY_WATCHES: u64 = 524288;
pub const MIN_INOTIFY_INSTANCES: u64 = 512;

const REQUIRED_BINARIES: &[&str] = &["kind", "kubectl", "helm", "git", "docker"];

/// Result of the host requirements check.
#[derive(Debug, Clone)]
pub struct HostCheckResult {
    pub passed: bool,
    pub checks: Vec<CheckItem>,
}

/// Individual check item.
#[derive(Debug, Clone)]
pub struct CheckItem {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub fix_command: Option<String>,
}

impl HostCheckResult {
    /// Returns a formatted error message if checks failed.
    pub fn error_message(&self) -> Option<String> {
        if self.passed {
            return None;
        }

        let failed_checks: Vec<_> = self.checks.iter().filter(|c| !c.passed).collect();

        let mut msg = String::from(
            "\n╔════════════════════════════════════════════════════════════════╗\n\
             ║  xpdemo - Host Requirements Not Met                            ║\n\
             ╚════════════════════════════════════════════════════════════════╝\n\n",
        );

        msg.push_str("The following requirements are not satisfied:\n\n");

        for (i, check) in failed_checks.iter().enumerate() {
            msg.push_str(&format!(
                "  {}. {} - {}\n",
                i + 1,
                check.name,
                check.message
            ));
            if let Some(fix) = &check.fix_command {
                msg.push_str(&format!("     Fix: {}\n", fix));
            }
            msg.push('\n');
        }

        Some(msg)
    }
}

/// Check all host requirements for the demo bootstrap.
pub fn check_host_requirements() -> HostCheckResult {
    let mut checks = Vec::new();

    for binary in REQUIRED_BINARIES {
        checks.push(check_binary(binary, true));
    }
    checks.push(check_binary("argocd", false));
    checks.push(check_docker_daemon());
    checks.push(check_inotify_limit(
        "/proc/sys/fs/inotify/max_user_watches",
        "fs.inotify.max_user_watches",
        MIN_INOTIFY_WATCHES,
    ));
    checks.push(check_inotify_limit(
        "/proc/sys/fs/inotify/max_user_instances",
        "fs.inotify.max_user_instances",
        MIN_INOTIFY_INSTANCES,
    ));

    let passed = checks.iter().all(|c| c.passed);

    HostCheckResult { passed, checks }
}

/// Check if a binary exists on PATH.
fn check_binary(name: &str, required: bool) -> CheckItem {
    let found = Command::new("which")
        .arg(name)
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        });

    match found {
        Some(path) => CheckItem {
            name: name.to_string(),
            passed: true,
            message: format!("Found at {}", path),
            fix_command: None,
        },
        None if required => CheckItem {
            name: name.to_string(),
            passed: false,
            message: "Not installed".to_string(),
            fix_command: Some(format!("install {} and ensure it is on PATH", name)),
        },
        None => CheckItem {
            name: name.to_string(),
            passed: true,
            message: "Not installed (optional; CLI login will be skipped)".to_string(),
            fix_command: None,
        },
    }
}

/// Check that the Docker daemon is reachable.
fn check_docker_daemon() -> CheckItem {
    match Command::new("docker").arg("info").output() {
        Ok(output) if output.status.success() => CheckItem {
            name: "docker daemon".to_string(),
            passed: true,
            message: "Reachable".to_string(),
            fix_command: None,
        },
        Ok(output) => CheckItem {
            name: "docker daemon".to_string(),
            passed: false,
            message: format!(
                "Not reachable: {}",
                String::from_utf8_lossy(&output.stderr)
                    .lines()
                    .next()
                    .unwrap_or("docker info failed")
            ),
            fix_command: Some("start the Docker daemon (systemctl start docker)".to_string()),
        },
        Err(e) => CheckItem {
            name: "docker daemon".to_string(),
            passed: false,
            message: format!("Cannot execute docker: {}", e),
            fix_command: Some("install docker".to_string()),
        },
    }
}

/// Check an inotify sysctl limit against a minimum.
fn check_inotify_limit(proc_path: &str, sysctl_key: &str, minimum: u64) -> CheckItem {
    if !Path::new(proc_path).exists() {
        // Non-Linux or very old kernel - not applicable
        return CheckItem {
            name: sysctl_key.to_string(),
            passed: true,
            message: "Not applicable".to_string(),
            fix_command: None,
        };
    }

    match fs::read_to_string(proc_path) {
        Ok(content) => {
            let value: u64 = content.trim().parse().unwrap_or(0);
            if value >= minimum {
                CheckItem {
                    name: sysctl_key.to_string(),
                    passed: true,
                    message: format!("{} (>= {})", value, minimum),
                    fix_command: None,
                }
            } else {
                CheckItem {
                    name: sysctl_key.to_string(),
                    passed: false,
                    message: format!("{} is below the recommended {}", value, minimum),
                    fix_command: Some(format!("sudo sysctl -w {}={}", sysctl_key, minimum)),
                }
            }
        }
        Err(e) => CheckItem {
            name: sysctl_key.to_string(),
            passed: false,
            message: format!("Cannot read {}: {}", proc_path, e),
            fix_command: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_none_when_passed() {
        let result = HostCheckResult {
            passed: true,
            checks: vec![],
        };
        assert!(result.error_message().is_none());
    }

    #[test]
    fn error_message_lists_failed_checks_with_fix() {
        let result = HostCheckResult {
            passed: false,
            checks: vec![
                CheckItem {
                    name: "kind".to_string(),
                    passed: true,
                    message: "Found at /usr/local/bin/kind".to_string(),
                    fix_command: None,
                },
                CheckItem {
                    name: "fs.inotify.max_user_watches".to_string(),
                    passed: false,
                    message: "8192 is below the recommended 524288".to_string(),
                    fix_command: Some(
                        "sudo sysctl -w fs.inotify.max_user_watches=524288".to_string(),
                    ),
                },
            ],
        };
        let msg = result.error_message().unwrap();
        assert!(msg.contains("fs.inotify.max_user_watches"));
        assert!(msg.contains("sudo sysctl -w"));
        assert!(!msg.contains("/usr/local/bin/kind"));
    }
}
