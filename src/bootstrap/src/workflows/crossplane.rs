/// Crossplane workflow - plans and executes the Crossplane installation.
///
/// Installs the core chart via Helm, then applies the demo package set
/// (providers and functions) and waits for each package to become Healthy.
use crate::config::CrossplaneConfig;
use crate::error::{BootstrapError, Result};
use crate::tasks::{BootstrapTask, ExecTask, KubectlTask, WaitTask};
use crate::template_renderer::TemplateRenderer;
use crate::workflow::{run_tasks, TaskExecutor};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Package kind within the Crossplane package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Provider,
    Function,
}

impl PackageKind {
    /// Template used to render the package manifest
    pub fn template(&self) -> &'static str {
        match self {
            Self::Provider => "crossplane/provider.yaml.j2",
            Self::Function => "crossplane/function.yaml.j2",
        }
    }

    /// Resource prefix for kubectl waits
    pub fn resource_prefix(&self) -> &'static str {
        match self {
            Self::Provider => "provider.pkg.crossplane.io",
            Self::Function => "function.pkg.crossplane.io",
        }
    }
}

/// Crossplane package specification
pub struct PackageSpec {
    /// Package object name
    pub name: &'static str,
    /// OCI package reference
    pub package: &'static str,
    /// Provider or Function
    pub kind: PackageKind,
    /// Install order (lower = earlier)
    pub order: isize,
    pub description: &'static str,
}

/// Ordered list of demo packages.
///
/// Providers come first: the functions only matter once compositions can
/// reach a provider, and provider pods are the slow part of the install.
pub const DEMO_PACKAGES: &[PackageSpec] = &[
    PackageSpec {
        name: "provider-kubernetes",
        package: "xpkg.crossplane.io/crossplane-contrib/provider-kubernetes:v0.15.0",
        kind: PackageKind::Provider,
        order: 0,
        description: "Manages arbitrary Kubernetes objects from compositions",
    },
    PackageSpec {
        name: "provider-helm",
        package: "xpkg.crossplane.io/crossplane-contrib/provider-helm:v0.19.0",
        kind: PackageKind::Provider,
        order: 1,
        description: "Manages Helm releases from compositions",
    },
    PackageSpec {
        name: "function-patch-and-transform",
        package: "xpkg.crossplane.io/crossplane-contrib/function-patch-and-transform:v0.7.0",
        kind: PackageKind::Function,
        order: 2,
        description: "Patch-and-transform composition function",
    },
];

/// ProviderConfigs applied once the providers are Healthy. The API group
/// differs per provider; both use InjectedIdentity against the local cluster.
const PROVIDER_CONFIGS: &[(&str, &str)] = &[
    ("provider-kubernetes", "kubernetes.crossplane.io/v1alpha1"),
    ("provider-helm", "helm.crossplane.io/v1beta1"),
];

/// Planned operation with metadata
pub struct PlannedOperation {
    pub task: BootstrapTask,
    pub metadata: Option<Value>,
}

/// Install the Crossplane core chart via Helm.
pub async fn install_crossplane<F>(
    executor: &TaskExecutor,
    config: &CrossplaneConfig,
    progress_fn: F,
) -> Result<()>
where
    F: Fn(u32, &str),
{
    progress_fn(0, "Adding Crossplane Helm repository");

    // Repo may already exist from a previous run
    let repo_add = executor
        .runner()
        .helm(&["repo", "add", "crossplane-stable", &config.helm_repo])
        .await?;
    if !repo_add.success() {
        tracing::warn!(
            "[CrossplaneWorkflow] helm repo add failed (continuing): {}",
            repo_add.last_stderr_line()
        );
    }

    let mut install_args = vec![
        "upgrade".to_string(),
        "--install".to_string(),
        "crossplane".to_string(),
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
            ExecTask::new("install-crossplane", "helm", install_args)
                .with_timeout(Duration::from_secs(600)),
        ),
    ];

    run_tasks(&tasks, executor, 10, 100, progress_fn, "Crossplane install").await?;

    tracing::info!(
        "[CrossplaneWorkflow] Crossplane installed in namespace {}",
        config.namespace
    );
    Ok(())
}

/// Plan package operations (returns tasks to execute).
pub fn plan_package_ops(renderer: &TemplateRenderer) -> Result<Vec<PlannedOperation>> {
    tracing::info!(
        "[CrossplaneWorkflow] Planning {} package operations",
        DEMO_PACKAGES.len()
    );

    let mut ops = Vec::new();

    for spec in DEMO_PACKAGES {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), spec.name.to_string());
        vars.insert("package".to_string(), spec.package.to_string());
        let content = renderer.render(spec.kind.template(), &vars)?;

        let metadata = json!({
            "type": "kubectl_apply",
            "name": spec.name,
            "package": spec.package,
            "description": spec.description,
        });

        ops.push(PlannedOperation {
            task: BootstrapTask::kubectl(KubectlTask::apply(spec.name, content)),
            metadata: Some(metadata),
        });

        tracing::debug!(
            "[CrossplaneWorkflow] Planned: {} ({})",
            spec.name,
            spec.description
        );
    }

    Ok(ops)
}

/// Apply the demo packages and wait for each to become Healthy.
pub async fn install_packages<F>(
    executor: &TaskExecutor,
    renderer: &TemplateRenderer,
    config: &CrossplaneConfig,
    progress_start: u32,
    progress_end: u32,
    progress_fn: F,
) -> Result<()>
where
    F: Fn(u32, &str),
{
    let ops = plan_package_ops(renderer)?;
    for op in &ops {
        if let Some(metadata) = &op.metadata {
            tracing::debug!("[CrossplaneWorkflow] Planned operation: {}", metadata);
        }
    }
    let mut tasks: Vec<BootstrapTask> = ops.into_iter().map(|op| op.task).collect();

    // Health waits run after all applies so the package manager can pull
    // images in parallel while we block on the first one.
    let wait_timeout = Duration::from_secs(config.package_wait_secs);
    for spec in DEMO_PACKAGES {
        tasks.push(BootstrapTask::wait(
            WaitTask::new(
                spec.name,
                format!("{}/{}", spec.kind.resource_prefix(), spec.name),
                "Healthy",
            )
            .with_timeout(wait_timeout),
        ));
    }

    run_tasks(
        &tasks,
        executor,
        progress_start,
        progress_end,
        progress_fn,
        "Crossplane package",
    )
    .await
}

/// Apply ProviderConfigs and the RBAC the in-cluster providers need.
///
/// The ProviderConfig CRDs are registered by the provider pods and can lag
/// the Healthy condition by a few seconds, so the first failing apply is
/// retried once after a short delay.
pub async fn configure_providers(
    executor: &TaskExecutor,
    renderer: &TemplateRenderer,
    config: &CrossplaneConfig,
) -> Result<()> {
    let mut rbac_vars = HashMap::new();
    rbac_vars.insert("name".to_string(), "crossplane-provider-admin".to_string());
    rbac_vars.insert("namespace".to_string(), config.namespace.clone());
    let rbac = renderer.render("crossplane/provider-rbac.yaml.j2", &rbac_vars)?;

    let output = executor
        .execute(&BootstrapTask::kubectl(KubectlTask::apply(
            "provider-rbac",
            rbac,
        )))
        .await?;
    if !output.success() {
        return Err(BootstrapError::Package(format!(
            "Failed to apply provider RBAC: {}",
            output.last_stderr_line()
        )));
    }

    for (provider, api_version) in PROVIDER_CONFIGS {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "default".to_string());
        vars.insert("api_version".to_string(), api_version.to_string());
        let manifest = renderer.render("crossplane/providerconfig.yaml.j2", &vars)?;

        let task = BootstrapTask::kubectl(KubectlTask::apply(
            format!("providerconfig-{}", provider),
            manifest,
        ));

        let first = executor.execute(&task).await?;
        if first.success() {
            continue;
        }

        tracing::warn!(
            "[CrossplaneWorkflow] ProviderConfig for {} failed ({}), retrying after CRD settle",
            provider,
            first.last_stderr_line()
        );
        tokio::time::sleep(Duration::from_secs(10)).await;

        let second = executor.execute(&task).await?;
        if !second.success() {
            return Err(BootstrapError::Package(format!(
                "ProviderConfig for {} failed after retry: {}",
                provider,
                second.last_stderr_line()
            )));
        }
    }

    tracing::info!("[CrossplaneWorkflow] Provider configuration applied");
    Ok(())
}
