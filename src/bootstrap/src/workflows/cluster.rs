/// Cluster workflow - kind cluster lifecycle.
///
/// Creates/deletes the local kind cluster and maintains the kubeconfig
/// extract under the configured directory (default /tmp). Re-running against
/// an existing cluster is tolerated.
use crate::config::ClusterConfig;
use crate::error::{BootstrapError, Result};
use crate::host::HostRunner;
use crate::preflight::{MIN_INOTIFY_INSTANCES, MIN_INOTIFY_WATCHES};
use crate::template_renderer::TemplateRenderer;
use std::collections::HashMap;
use std::path::Path;

/// Create the kind cluster and export its kubeconfig.
pub async fn create_cluster<F>(
    runner: &HostRunner,
    renderer: &TemplateRenderer,
    config: &ClusterConfig,
    progress_fn: F,
) -> Result<()>
where
    F: Fn(u32, &str),
{
    progress_fn(0, &format!("Creating kind cluster {}", config.name));

    if cluster_exists(runner, &config.name).await? {
        tracing::warn!(
            "[ClusterWorkflow] kind cluster {} already exists, skipping create",
            config.name
        );
        export_kubeconfig(runner, config).await?;
        progress_fn(100, &format!("Cluster {} ready", config.name));
        return Ok(());
    }

    raise_inotify_limits(runner).await;

    // Render the kind config to a temp file for `kind create cluster --config`
    let mut vars = HashMap::new();
    vars.insert("cluster_name".to_string(), config.name.clone());
    vars.insert(
        "node_image".to_string(),
        config.node_image.clone().unwrap_or_default(),
    );
    let kind_config = renderer.render("kind/cluster.yaml.j2", &vars)?;

    std::fs::create_dir_all(&config.kubeconfig_dir).map_err(BootstrapError::Io)?;
    let config_path = config
        .kubeconfig_dir
        .join(format!("{}-kind-config.yaml", config.name));
    std::fs::write(&config_path, &kind_config).map_err(BootstrapError::Io)?;

    progress_fn(10, "Running kind create cluster");
    let config_arg = config_path.to_string_lossy().to_string();
    let create = runner
        .kind(&["create", "cluster", "--name", &config.name, "--config", &config_arg])
        .await?;
    let _ = std::fs::remove_file(&config_path);
    if !create.success() {
        return Err(BootstrapError::Cluster(format!(
            "kind create cluster {} failed: {}",
            config.name,
            create.last_stderr_line()
        )));
    }

    progress_fn(80, "Exporting kubeconfig");
    export_kubeconfig(runner, config).await?;

    progress_fn(100, &format!("Cluster {} ready", config.name));
    Ok(())
}

/// Delete the kind cluster. A missing cluster is tolerated.
pub async fn delete_cluster(runner: &HostRunner, config: &ClusterConfig) -> Result<()> {
    if !cluster_exists(runner, &config.name).await? {
        tracing::warn!(
            "[ClusterWorkflow] kind cluster {} does not exist, nothing to delete",
            config.name
        );
    } else {
        tracing::info!("[ClusterWorkflow] Deleting kind cluster {}", config.name);
        runner
            .kind_checked(&["delete", "cluster", "--name", &config.name])
            .await?;
    }

    let kubeconfig = config.kubeconfig_path();
    if kubeconfig.exists() {
        let _ = std::fs::remove_file(&kubeconfig);
        tracing::debug!(
            "[ClusterWorkflow] Removed kubeconfig extract {}",
            kubeconfig.display()
        );
    }

    Ok(())
}

/// Check whether a kind cluster with this name exists.
pub async fn cluster_exists(runner: &HostRunner, name: &str) -> Result<bool> {
    let output = runner.kind_checked(&["get", "clusters"]).await?;
    Ok(output.stdout.lines().any(|line| line.trim() == name))
}

/// Write the kubeconfig extract for the cluster and hand it back to the
/// invoking user when running under sudo.
async fn export_kubeconfig(runner: &HostRunner, config: &ClusterConfig) -> Result<()> {
    let kubeconfig = config.kubeconfig_path();
    let kubeconfig_arg = kubeconfig.to_string_lossy().to_string();

    runner
        .kind_checked(&[
            "export",
            "kubeconfig",
            "--name",
            &config.name,
            "--kubeconfig",
            &kubeconfig_arg,
        ])
        .await?;

    tracing::info!(
        "[ClusterWorkflow] Kubeconfig extract written to {}",
        kubeconfig.display()
    );

    chown_to_sudo_user(&kubeconfig);
    Ok(())
}

/// When the tool runs under sudo, the kubeconfig extract would otherwise be
/// root-owned and unusable by the operator's own kubectl.
fn chown_to_sudo_user(path: &Path) {
    if !nix::unistd::Uid::effective().is_root() {
        return;
    }
    let Ok(sudo_user) = std::env::var("SUDO_USER") else {
        return;
    };
    if sudo_user.is_empty() || sudo_user == "root" {
        return;
    }

    match nix::unistd::User::from_name(&sudo_user) {
        Ok(Some(user)) => {
            if let Err(e) = nix::unistd::chown(path, Some(user.uid), Some(user.gid)) {
                tracing::warn!(
                    "[ClusterWorkflow] Failed to chown {} to {}: {}",
                    path.display(),
                    sudo_user,
                    e
                );
            } else {
                tracing::debug!(
                    "[ClusterWorkflow] Chowned {} to {}",
                    path.display(),
                    sudo_user
                );
            }
        }
        Ok(None) => {
            tracing::warn!("[ClusterWorkflow] SUDO_USER {} not found", sudo_user);
        }
        Err(e) => {
            tracing::warn!("[ClusterWorkflow] Failed to look up {}: {}", sudo_user, e);
        }
    }
}

/// Raise inotify limits before creating kind nodes. Only possible as root;
/// failures are warnings - the preflight check reports the manual fix.
async fn raise_inotify_limits(runner: &HostRunner) {
    if !nix::unistd::Uid::effective().is_root() {
        tracing::debug!("[ClusterWorkflow] Not root, leaving inotify limits alone");
        return;
    }

    for (key, value) in [
        ("fs.inotify.max_user_watches", MIN_INOTIFY_WATCHES),
        ("fs.inotify.max_user_instances", MIN_INOTIFY_INSTANCES),
    ] {
        let arg = format!("{}={}", key, value);
        match runner.run("sysctl", &["-w", &arg]).await {
            Ok(output) if output.success() => {
                tracing::info!("[ClusterWorkflow] Set {}", arg);
            }
            Ok(output) => {
                tracing::warn!(
                    "[ClusterWorkflow] sysctl -w {} failed: {}",
                    arg,
                    output.last_stderr_line()
                );
            }
            Err(e) => {
                tracing::warn!("[ClusterWorkflow] sysctl -w {} failed: {}", arg, e);
            }
        }
    }
}
