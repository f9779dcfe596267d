//! Embedded manifest templates - compiled into the binary so the tool is
//! self-contained.
//!
//! Templates are loaded at compile time via `include_str!` and registered
//! with the TemplateRenderer.

/// kind cluster config
pub static KIND_CLUSTER: &str = include_str!("templates/kind/cluster.yaml.j2");

/// Crossplane package templates
pub static CROSSPLANE_PROVIDER: &str = include_str!("templates/crossplane/provider.yaml.j2");
pub static CROSSPLANE_FUNCTION: &str = include_str!("templates/crossplane/function.yaml.j2");
pub static CROSSPLANE_PROVIDER_CONFIG: &str =
    include_str!("templates/crossplane/providerconfig.yaml.j2");
pub static CROSSPLANE_PROVIDER_RBAC: &str =
    include_str!("templates/crossplane/provider-rbac.yaml.j2");

/// ArgoCD templates
pub static ARGOCD_REPO_SECRET: &str = include_str!("templates/argocd/repo-secret.yaml.j2");
pub static ARGOCD_APPLICATION: &str = include_str!("templates/argocd/application.yaml.j2");

/// Seeded GitOps workload
pub static GITOPS_DEMO_APP: &str = include_str!("templates/gitops/demo-app.yaml.j2");

/// All embedded templates as (name, content) pairs for registration with Tera.
pub const ALL_TEMPLATES: &[(&str, &str)] = &[
    ("kind/cluster.yaml.j2", KIND_CLUSTER),
    ("crossplane/provider.yaml.j2", CROSSPLANE_PROVIDER),
    ("crossplane/function.yaml.j2", CROSSPLANE_FUNCTION),
    ("crossplane/providerconfig.yaml.j2", CROSSPLANE_PROVIDER_CONFIG),
    ("crossplane/provider-rbac.yaml.j2", CROSSPLANE_PROVIDER_RBAC),
    ("argocd/repo-secret.yaml.j2", ARGOCD_REPO_SECRET),
    ("argocd/application.yaml.j2", ARGOCD_APPLICATION),
    ("gitops/demo-app.yaml.j2", GITOPS_DEMO_APP),
];
