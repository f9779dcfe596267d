//! Bootstrap engine for the Crossplane + ArgoCD GitOps demo environment.
//!
//! Creates local kind clusters, installs Crossplane and its packages via
//! Helm, installs ArgoCD, wires GitOps syncing from a Git repository, and
//! drives a scripted update/rollback demo. Every meaningful operation is
//! delegated to external CLIs (`kind`, `kubectl`, `helm`, `argocd`, `git`,
//! `docker`); this crate plans the task sequences, executes them fail-fast
//! with progress reporting, and polls the external controllers for the
//! states the demo depends on.

pub mod config;
pub mod embedded_templates;
pub mod error;
pub mod git;
pub mod host;
pub mod portforward;
pub mod preflight;
pub mod progress;
pub mod tasks;
pub mod template_renderer;
pub mod wait;
pub mod workflow;
pub mod workflows;

pub use config::{
    ArgocdConfig, ClusterConfig, CrossplaneConfig, DemoConfig, DemoCycleConfig, GitConfig,
    GitOpsConfig,
};
pub use error::{BootstrapError, Result};
pub use git::{GitCheckout, GitSettings};
pub use host::{CommandOutput, HostRunner};
pub use portforward::PortForward;
pub use preflight::{check_host_requirements, CheckItem, HostCheckResult};
pub use progress::{BootstrapProgress, ChannelProgressReporter, ProgressReporter};
pub use tasks::{BootstrapTask, ExecTask, KubectlAction, KubectlTask, WaitTask};
pub use template_renderer::TemplateRenderer;
pub use workflow::{run_tasks, TaskExecutor};
pub use workflows::crossplane::{PackageKind, PackageSpec, DEMO_PACKAGES};
