//! Unit tests for configuration.
//!
//! Tests for TOML parsing, defaults, and environment overrides of the Git
//! settings.

use bootstrap::DemoConfig;

#[test]
fn test_defaults() {
    let config = DemoConfig::default();

    assert_eq!(config.cluster.name, "crossplane-demo");
    assert_eq!(
        config.cluster.kubeconfig_path().to_string_lossy(),
        "/tmp/crossplane-demo-kubeconfig"
    );
    assert_eq!(config.crossplane.namespace, "crossplane-system");
    assert_eq!(config.crossplane.chart, "crossplane-stable/crossplane");
    assert_eq!(config.argocd.namespace, "argocd");
    assert_eq!(config.argocd.local_port, 8080);
    assert_eq!(config.gitops.application, "demo-app");
    assert_eq!(config.gitops.path, "manifests");
    assert_eq!(config.git.branch, "main");
    assert_eq!(config.demo.update_tag, "1.29.1");
}

#[test]
fn test_partial_toml_fills_defaults() {
    let config: DemoConfig = toml::from_str(
        r#"
[cluster]
name = "my-demo"

[argocd]
local_port = 9090

[git]
repo_url = "https://gitlab.example.com/demo/gitops.git"
username = "bot"
token = "s3cret"
"#,
    )
    .unwrap();

    assert_eq!(config.cluster.name, "my-demo");
    assert_eq!(
        config.cluster.kubeconfig_path().to_string_lossy(),
        "/tmp/my-demo-kubeconfig"
    );
    assert_eq!(config.argocd.local_port, 9090);
    // Untouched sections keep defaults
    assert_eq!(config.crossplane.namespace, "crossplane-system");
    assert_eq!(config.gitops.sync_timeout_secs, 300);
}

#[test]
fn test_unknown_version_pin_roundtrip() {
    let config: DemoConfig = toml::from_str(
        r#"
[crossplane]
version = "1.18.0"
"#,
    )
    .unwrap();
    assert_eq!(config.crossplane.version.as_deref(), Some("1.18.0"));
    assert!(config.argocd.version.is_none());
}

// Environment-dependent assertions live in one test: the test harness runs
// tests in parallel and GITLAB_*/GIT_BRANCH are process-global.
#[test]
fn test_git_settings_resolution() {
    for var in [
        "GITLAB_REPO_URL",
        "GITLAB_USERNAME",
        "GITLAB_TOKEN",
        "GIT_BRANCH",
    ] {
        std::env::remove_var(var);
    }

    // Nothing configured: a config error naming the missing variables
    let config = DemoConfig::default();
    let err = config.git_settings().unwrap_err().to_string();
    assert!(err.contains("GITLAB_REPO_URL"));
    assert!(err.contains("GITLAB_USERNAME"));
    assert!(err.contains("GITLAB_TOKEN"));

    // Config file values are enough
    let config: DemoConfig = toml::from_str(
        r#"
[git]
repo_url = "https://gitlab.example.com/demo/gitops.git"
branch = "demo"
username = "bot"
token = "s3cret"
"#,
    )
    .unwrap();
    let settings = config.git_settings().unwrap();
    assert_eq!(settings.repo_url, "https://gitlab.example.com/demo/gitops.git");
    assert_eq!(settings.branch, "demo");

    // Environment wins over the config file
    std::env::set_var("GITLAB_REPO_URL", "https://gitlab.example.com/other/repo.git");
    std::env::set_var("GIT_BRANCH", "feature");
    let settings = config.git_settings().unwrap();
    assert_eq!(
        settings.repo_url,
        "https://gitlab.example.com/other/repo.git"
    );
    assert_eq!(settings.branch, "feature");
    assert_eq!(settings.username, "bot");

    // Empty environment values do not shadow the config file
    std::env::set_var("GITLAB_REPO_URL", "");
    let settings = config.git_settings().unwrap();
    assert_eq!(settings.repo_url, "https://gitlab.example.com/demo/gitops.git");

    for var in ["GITLAB_REPO_URL", "GIT_BRANCH"] {
        std::env::remove_var(var);
    }
}
