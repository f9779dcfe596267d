//! Demo bootstrap configuration.
//! Loaded from xpdemo.toml; Git settings may be overridden from the environment.

use crate::error::{BootstrapError, Result};
use crate::git::GitSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level demo configuration.
/// Loaded from xpdemo.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DemoConfig {
    /// kind cluster settings
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Crossplane installation settings
    #[serde(default)]
    pub crossplane: CrossplaneConfig,

    /// ArgoCD installation settings
    #[serde(default)]
    pub argocd: ArgocdConfig,

    /// GitOps application and scratch checkout settings
    #[serde(default)]
    pub gitops: GitOpsConfig,

    /// Git repository settings (overridable from the environment)
    #[serde(default)]
    pub git: GitConfig,

    /// Scripted demo cycle settings
    #[serde(default)]
    pub demo: DemoCycleConfig,
}

impl DemoConfig {
    /// Load configuration from file.
    /// Tries an explicit path first, then well-known locations; falls back to
    /// defaults when no file is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(BootstrapError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_file(path);
        }

        let mut candidates = vec![PathBuf::from("xpdemo.toml")];
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(PathBuf::from(home).join(".config/xpdemo/xpdemo.toml"));
        }

        for path in &candidates {
            if path.exists() {
                return Self::load_file(path);
            }
        }

        tracing::warn!("[DemoConfig] No xpdemo.toml found, using defaults");
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BootstrapError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: DemoConfig = toml::from_str(&content).map_err(|e| {
            BootstrapError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::info!("[DemoConfig] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve Git settings from config and environment.
    ///
    /// `GITLAB_REPO_URL`, `GIT_BRANCH`, `GITLAB_USERNAME` and `GITLAB_TOKEN`
    /// take precedence over the config file. Missing repo URL or credentials
    /// are a hard configuration error; GitOps wiring cannot work without them.
    pub fn git_settings(&self) -> Result<GitSettings> {
        let repo_url = env_non_empty("GITLAB_REPO_URL").or_else(|| self.git.repo_url.clone());
        let branch = env_non_empty("GIT_BRANCH").unwrap_or_else(|| self.git.branch.clone());
        let username = env_non_empty("GITLAB_USERNAME").or_else(|| self.git.username.clone());
        let token = env_non_empty("GITLAB_TOKEN").or_else(|| self.git.token.clone());

        let mut missing = Vec::new();
        if repo_url.is_none() {
            missing.push("GITLAB_REPO_URL");
        }
        if username.is_none() {
            missing.push("GITLAB_USERNAME");
        }
        if token.is_none() {
            missing.push("GITLAB_TOKEN");
        }
        if !missing.is_empty() {
            return Err(BootstrapError::Config(format!(
                "Missing Git settings: {} (set the environment variables or the [git] section)",
                missing.join(", ")
            )));
        }

        Ok(GitSettings {
            repo_url: repo_url.unwrap(),
            branch,
            username: username.unwrap(),
            token: token.unwrap(),
        })
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// kind cluster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster name
    #[serde(default = "default_cluster_name")]
    pub name: String,

    /// Node image override (pins the Kubernetes version)
    pub node_image: Option<String>,

    /// Directory for kubeconfig extracts
    #[serde(default = "default_tmp_dir")]
    pub kubeconfig_dir: PathBuf,
}

impl ClusterConfig {
    /// Path of the kubeconfig extract for this cluster.
    pub fn kubeconfig_path(&self) -> PathBuf {
        self.kubeconfig_dir.join(format!("{}-kubeconfig", self.name))
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: default_cluster_name(),
            node_image: None,
            kubeconfig_dir: default_tmp_dir(),
        }
    }
}

fn default_cluster_name() -> String {
    "crossplane-demo".to_string()
}

fn default_tmp_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

/// Crossplane installation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossplaneConfig {
    #[serde(default = "default_crossplane_namespace")]
    pub namespace: String,

    #[serde(default = "default_crossplane_repo")]
    pub helm_repo: String,

    #[serde(default = "default_crossplane_chart")]
    pub chart: String,

    /// Chart version pin (latest when unset)
    pub version: Option<String>,

    /// Timeout for package health waits, in seconds
    #[serde(default = "default_package_wait_secs")]
    pub package_wait_secs: u64,
}

impl Default for CrossplaneConfig {
    fn default() -> Self {
        Self {
            namespace: default_crossplane_namespace(),
            helm_repo: default_crossplane_repo(),
            chart: default_crossplane_chart(),
            version: None,
            package_wait_secs: default_package_wait_secs(),
        }
    }
}

fn default_crossplane_namespace() -> String {
    "crossplane-system".to_string()
}

fn default_crossplane_repo() -> String {
    "https://charts.crossplane.io/stable".to_string()
}

fn default_crossplane_chart() -> String {
    "crossplane-stable/crossplane".to_string()
}

fn default_package_wait_secs() -> u64 {
    300
}

/// ArgoCD installation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgocdConfig {
    #[serde(default = "default_argocd_namespace")]
    pub namespace: String,

    #[serde(default = "default_argocd_repo")]
    pub helm_repo: String,

    #[serde(default = "default_argocd_chart")]
    pub chart: String,

    /// Chart version pin (latest when unset)
    pub version: Option<String>,

    /// Local port for the background port-forward to argocd-server
    #[serde(default = "default_argocd_port")]
    pub local_port: u16,

    /// PID file for the background port-forward
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,
}

impl Default for ArgocdConfig {
    fn default() -> Self {
        Self {
            namespace: default_argocd_namespace(),
            helm_repo: default_argocd_repo(),
            chart: default_argocd_chart(),
            version: None,
            local_port: default_argocd_port(),
            pid_file: default_pid_file(),
        }
    }
}

fn default_argocd_namespace() -> String {
    "argocd".to_string()
}

fn default_argocd_repo() -> String {
    "https://argoproj.github.io/argo-helm".to_string()
}

fn default_argocd_chart() -> String {
    "argo/argo-cd".to_string()
}

fn default_argocd_port() -> u16 {
    8080
}

fn default_pid_file() -> PathBuf {
    PathBuf::from("/tmp/xpdemo-argocd-portforward.pid")
}

/// GitOps application and scratch checkout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitOpsConfig {
    /// ArgoCD Application name
    #[serde(default = "default_application")]
    pub application: String,

    /// Manifest path inside the Git repository
    #[serde(default = "default_manifest_path")]
    pub path: String,

    /// Namespace the application deploys into
    #[serde(default = "default_target_namespace")]
    pub target_namespace: String,

    /// Seeded demo workload name
    #[serde(default = "default_workload")]
    pub workload: String,

    /// Seeded demo workload image
    #[serde(default = "default_workload_image")]
    pub workload_image: String,

    /// Scratch checkout directory
    #[serde(default = "default_checkout_dir")]
    pub checkout_dir: PathBuf,

    /// Timeout for sync/health waits, in seconds
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,
}

impl Default for GitOpsConfig {
    fn default() -> Self {
        Self {
            application: default_application(),
            path: default_manifest_path(),
            target_namespace: default_target_namespace(),
            workload: default_workload(),
            workload_image: default_workload_image(),
            checkout_dir: default_checkout_dir(),
            sync_timeout_secs: default_sync_timeout_secs(),
        }
    }
}

impl GitOpsConfig {
    /// Path of the seeded demo workload manifest inside a checkout.
    pub fn manifest_file(&self, checkout: &Path) -> PathBuf {
        checkout.join(&self.path).join("demo-app.yaml")
    }
}

fn default_application() -> String {
    "demo-app".to_string()
}

fn default_manifest_path() -> String {
    "manifests".to_string()
}

fn default_target_namespace() -> String {
    "demo".to_string()
}

fn default_workload() -> String {
    "demo-nginx".to_string()
}

fn default_workload_image() -> String {
    "nginx:1.27.1".to_string()
}

fn default_checkout_dir() -> PathBuf {
    PathBuf::from("/tmp/xpdemo-gitops")
}

fn default_sync_timeout_secs() -> u64 {
    300
}

/// Git repository settings. All fields can be overridden from the environment
/// (GITLAB_REPO_URL, GIT_BRANCH, GITLAB_USERNAME, GITLAB_TOKEN).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    pub repo_url: Option<String>,

    #[serde(default = "default_branch")]
    pub branch: String,

    pub username: Option<String>,

    pub token: Option<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            branch: default_branch(),
            username: None,
            token: None,
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

/// Scripted demo cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoCycleConfig {
    /// Image tag the update step moves the demo workload to
    #[serde(default = "default_update_tag")]
    pub update_tag: String,

    /// Seconds to dwell between update and rollback in `demo cycle`
    #[serde(default = "default_dwell_secs")]
    pub dwell_secs: u64,
}

impl Default for DemoCycleConfig {
    fn default() -> Self {
        Self {
            update_tag: default_update_tag(),
            dwell_secs: default_dwell_secs(),
        }
    }
}

fn default_update_tag() -> String {
    "1.29.1".to_string()
}

fn default_dwell_secs() -> u64 {
    60
}
