/// GitOps workflow - wires ArgoCD to the Git repository and seeds it.
///
/// Applies the repository credential Secret and the Application manifest,
/// then pushes the initial demo workload into the repository from a scratch
/// checkout under /tmp.
use crate::config::{ArgocdConfig, GitOpsConfig};
use crate::error::{BootstrapError, Result};
use crate::git::{GitCheckout, GitSettings};
use crate::host::HostRunner;
use crate::tasks::{BootstrapTask, KubectlTask};
use crate::template_renderer::TemplateRenderer;
use crate::workflow::TaskExecutor;
use std::collections::HashMap;

/// Apply the repository credential Secret and the ArgoCD Application.
pub async fn wire_application<F>(
    executor: &TaskExecutor,
    renderer: &TemplateRenderer,
    config: &GitOpsConfig,
    argocd: &ArgocdConfig,
    git: &GitSettings,
    progress_fn: F,
) -> Result<()>
where
    F: Fn(u32, &str),
{
    progress_fn(0, "Applying repository credentials");

    let mut secret_vars = HashMap::new();
    secret_vars.insert(
        "name".to_string(),
        format!("repo-{}", config.application),
    );
    secret_vars.insert("namespace".to_string(), argocd.namespace.clone());
    secret_vars.insert("repo_url".to_string(), git.repo_url.clone());
    secret_vars.insert("username".to_string(), git.username.clone());
    secret_vars.insert("token".to_string(), git.token.clone());
    let secret = renderer.render("argocd/repo-secret.yaml.j2", &secret_vars)?;

    let output = executor
        .execute(&BootstrapTask::kubectl(KubectlTask::apply(
            "repo-secret",
            secret,
        )))
        .await?;
    if !output.success() {
        return Err(BootstrapError::GitOps(format!(
            "Failed to apply repository secret: {}",
            output.last_stderr_line()
        )));
    }

    progress_fn(50, "Applying ArgoCD Application");

    let mut app_vars = HashMap::new();
    app_vars.insert("name".to_string(), config.application.clone());
    app_vars.insert("namespace".to_string(), argocd.namespace.clone());
    app_vars.insert("repo_url".to_string(), git.repo_url.clone());
    app_vars.insert("branch".to_string(), git.branch.clone());
    app_vars.insert("path".to_string(), config.path.clone());
    app_vars.insert(
        "target_namespace".to_string(),
        config.target_namespace.clone(),
    );
    let application = renderer.render("argocd/application.yaml.j2", &app_vars)?;

    let output = executor
        .execute(&BootstrapTask::kubectl(KubectlTask::apply(
            "application",
            application,
        )))
        .await?;
    if !output.success() {
        return Err(BootstrapError::GitOps(format!(
            "Failed to apply Application {}: {}",
            config.application,
            output.last_stderr_line()
        )));
    }

    tracing::info!(
        "[GitOpsWorkflow] Application {} wired to {} ({})",
        config.application,
        git.redacted_url(),
        git.branch
    );
    progress_fn(100, "GitOps wiring applied");
    Ok(())
}

/// Seed the repository with the demo workload manifest.
///
/// Clones into the scratch directory, writes the manifest when it is not
/// already there, commits and pushes. An already-seeded repository results
/// in an empty diff, which is tolerated.
pub async fn seed_repository<F>(
    runner: &HostRunner,
    renderer: &TemplateRenderer,
    config: &GitOpsConfig,
    git: &GitSettings,
    progress_fn: F,
) -> Result<()>
where
    F: Fn(u32, &str),
{
    progress_fn(0, "Cloning GitOps repository");
    let checkout = GitCheckout::clone_fresh(runner, git, &config.checkout_dir).await?;

    progress_fn(40, "Writing demo workload manifest");
    let manifest_file = config.manifest_file(checkout.path());
    if manifest_file.exists() {
        tracing::info!(
            "[GitOpsWorkflow] Manifest {} already present",
            manifest_file.display()
        );
    } else {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), config.workload.clone());
        vars.insert("image".to_string(), config.workload_image.clone());
        vars.insert("replicas".to_string(), "2".to_string());
        let manifest = renderer.render("gitops/demo-app.yaml.j2", &vars)?;

        if let Some(parent) = manifest_file.parent() {
            std::fs::create_dir_all(parent).map_err(BootstrapError::Io)?;
        }
        std::fs::write(&manifest_file, manifest).map_err(BootstrapError::Io)?;
    }

    progress_fn(70, "Committing and pushing seed");
    let committed = checkout
        .commit_all(&format!("Seed {} demo workload", config.workload))
        .await?;
    if committed {
        checkout.push().await?;
        tracing::info!(
            "[GitOpsWorkflow] Seeded {} at {}",
            config.workload,
            checkout.head_revision().await?
        );
    }

    progress_fn(100, "Repository seeded");
    Ok(())
}
