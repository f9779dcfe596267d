/// Bootstrap workflows - cluster, Crossplane, ArgoCD, GitOps wiring, the
/// scripted demo cycle, and teardown.
pub mod argocd;
pub mod cluster;
pub mod crossplane;
pub mod demo;
pub mod gitops;
pub mod teardown;
