/// ArgoCD workflow - installation and API access.
///
/// Installs ArgoCD via Helm, waits for the server, then makes the API
/// reachable through a background port-forward and logs the argocd CLI in
/// when it is available.
use crate::config::ArgocdConfig;
use crate::error::Result;
use crate::host::HostRunner;
use crate::portforward::PortForward;
use crate::tasks::{BootstrapTask, ExecTask};
use crate::wait::wait_for_deployment_available;
use crate::workflow::{run_tasks, TaskExecutor};
use std::time::Duration;

/// Install ArgoCD via Helm and wait for the server deployment.
pub async fn install_argocd<F>(
    executor: &TaskExecutor,
    config: &ArgocdConfig,
    progress_fn: F,
) -> Result<()>
where
    F: Fn(u32, &str),
{
    progress_fn(0, "Adding Argo Helm repository");

    let repo_add = executor
        .runner()
        .helm(&["repo", "add", "argo", &config.helm_repo])
        .await?;
    if !repo_add.success() {
        tracing::warn!(
            "[ArgocdWorkflow] helm repo add failed (continuing): {}",
            repo_add.last_stderr_line()
        );
    }

    let mut install_args = vec![
        "upgrade".to_string(),
        "--install".to_string(),
        "argocd".to_string(),
        config.chart.clone(),
        "--namespace".to_string(),
        config.namespace.clone(),
        "--create-namespace".to_string(),
        "--wait".to_string(),
    ];
    if let Some(version) = &config.version {
        install_args.push("--version".to_string());
        install_args.push(version.clone());
    }

    let tasks = vec![
        BootstrapTask::exec(ExecTask::new(
            "repo-update",
            "helm",
            vec!["repo".to_string(), "update".to_string()],
        )),
        BootstrapTask::exec(
            ExecTask::new("install-argocd", "helm", install_args)
                .with_timeout(Duration::from_secs(600)),
        ),
    ];

    run_tasks(&tasks, executor, 10, 80, &progress_fn, "ArgoCD install").await?;

    progress_fn(80, "Waiting for argocd-server");
    wait_for_deployment_available(
        executor.runner(),
        "argocd-server",
        &config.namespace,
        Duration::from_secs(300),
    )
    .await?;

    tracing::info!(
        "[ArgocdWorkflow] ArgoCD installed in namespace {}",
        config.namespace
    );
    progress_fn(100, "ArgoCD installed");
    Ok(())
}

/// Read the initial admin password from the well-known secret.
pub async fn initial_admin_password(runner: &HostRunner, config: &ArgocdConfig) -> Result<String> {
    // kubectl decodes in-process via go-template, no shell pipe needed
    let output = runner
        .kubectl_checked(&[
            "get",
            "secret",
            "-n",
            &config.namespace,
            "argocd-initial-admin-secret",
            "-o",
            r"go-template={{.data.password | base64decode}}",
        ])
        .await?;

    Ok(output.stdout.trim().to_string())
}

/// Start the background port-forward to argocd-server.
pub async fn start_port_forward(runner: &HostRunner, config: &ArgocdConfig) -> Result<u32> {
    let forward = PortForward::new(&config.pid_file);
    forward
        .start(
            runner,
            &config.namespace,
            "argocd-server",
            config.local_port,
            443,
        )
        .await
}

/// Stop the background port-forward. Stale or missing PID files are fine.
pub fn stop_port_forward(config: &ArgocdConfig) -> Result<bool> {
    PortForward::new(&config.pid_file).stop()
}

/// Log the argocd CLI in through the port-forward.
///
/// The CLI is a convenience for the operator; the sync flow itself never
/// needs it, so a missing binary or failed login only warns.
pub async fn login(runner: &HostRunner, config: &ArgocdConfig, password: &str) {
    let server = format!("localhost:{}", config.local_port);
    match runner
        .argocd(&[
            "login",
            &server,
            "--username",
            "admin",
            "--password",
            password,
            "--insecure",
        ])
        .await
    {
        Ok(output) if output.success() => {
            tracing::info!("[ArgocdWorkflow] argocd CLI logged in at {}", server);
        }
        Ok(output) => {
            tracing::warn!(
                "[ArgocdWorkflow] argocd login failed (continuing): {}",
                output.last_stderr_line()
            );
        }
        Err(e) => {
            tracing::warn!("[ArgocdWorkflow] argocd login skipped: {}", e);
        }
    }
}
