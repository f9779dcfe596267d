//! Integration tests for the embedded manifest templates.

use bootstrap::embedded_templates::ALL_TEMPLATES;
use bootstrap::TemplateRenderer;
use serde::Deserialize;
use std::collections::HashMap;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_all_templates_register() {
    let renderer = TemplateRenderer::from_embedded().unwrap();
    let loaded = renderer.list_templates();
    assert_eq!(loaded.len(), ALL_TEMPLATES.len());
    for (name, _) in ALL_TEMPLATES {
        assert!(loaded.iter().any(|t| t == name), "missing template {name}");
    }
}

#[test]
fn test_application_manifest_fields() {
    let renderer = TemplateRenderer::from_embedded().unwrap();
    let rendered = renderer
        .render(
            "argocd/application.yaml.j2",
            &vars(&[
                ("name", "demo-app"),
                ("namespace", "argocd"),
                ("repo_url", "https://gitlab.example.com/demo/gitops.git"),
                ("branch", "main"),
                ("path", "manifests"),
                ("target_namespace", "demo"),
            ]),
        )
        .unwrap();

    let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
    assert_eq!(doc["kind"], "Application");
    assert_eq!(doc["metadata"]["name"], "demo-app");
    assert_eq!(
        doc["spec"]["source"]["repoURL"],
        "https://gitlab.example.com/demo/gitops.git"
    );
    assert_eq!(doc["spec"]["source"]["targetRevision"], "main");
    assert_eq!(doc["spec"]["syncPolicy"]["automated"]["prune"], true);
    assert_eq!(doc["spec"]["syncPolicy"]["automated"]["selfHeal"], true);
    assert_eq!(
        doc["spec"]["destination"]["server"],
        "https://kubernetes.default.svc"
    );
}

#[test]
fn test_repo_secret_has_repository_label() {
    let renderer = TemplateRenderer::from_embedded().unwrap();
    let rendered = renderer
        .render(
            "argocd/repo-secret.yaml.j2",
            &vars(&[
                ("name", "repo-demo-app"),
                ("namespace", "argocd"),
                ("repo_url", "https://gitlab.example.com/demo/gitops.git"),
                ("username", "bot"),
                ("token", "s3cret"),
            ]),
        )
        .unwrap();

    let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
    assert_eq!(doc["kind"], "Secret");
    assert_eq!(
        doc["metadata"]["labels"]["argocd.argoproj.io/secret-type"],
        "repository"
    );
    assert_eq!(doc["stringData"]["username"], "bot");
    assert_eq!(doc["stringData"]["password"], "s3cret");
}

#[test]
fn test_provider_manifest() {
    let renderer = TemplateRenderer::from_embedded().unwrap();
    let rendered = renderer
        .render(
            "crossplane/provider.yaml.j2",
            &vars(&[
                ("name", "provider-kubernetes"),
                (
                    "package",
                    "xpkg.crossplane.io/crossplane-contrib/provider-kubernetes:v0.15.0",
                ),
            ]),
        )
        .unwrap();

    let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
    assert_eq!(doc["apiVersion"], "pkg.crossplane.io/v1");
    assert_eq!(doc["kind"], "Provider");
    assert_eq!(
        doc["spec"]["package"],
        "xpkg.crossplane.io/crossplane-contrib/provider-kubernetes:v0.15.0"
    );
}

#[test]
fn test_kind_config_node_image_optional() {
    let renderer = TemplateRenderer::from_embedded().unwrap();

    let without = renderer
        .render(
            "kind/cluster.yaml.j2",
            &vars(&[("cluster_name", "demo"), ("node_image", "")]),
        )
        .unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&without).unwrap();
    assert_eq!(doc["name"], "demo");
    assert!(doc["nodes"][0].get("image").is_none());

    let with = renderer
        .render(
            "kind/cluster.yaml.j2",
            &vars(&[
                ("cluster_name", "demo"),
                ("node_image", "kindest/node:v1.31.2"),
            ]),
        )
        .unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&with).unwrap();
    assert_eq!(doc["nodes"][0]["image"], "kindest/node:v1.31.2");
}

#[test]
fn test_demo_app_is_two_documents() {
    let renderer = TemplateRenderer::from_embedded().unwrap();
    let rendered = renderer
        .render(
            "gitops/demo-app.yaml.j2",
            &vars(&[
                ("name", "demo-nginx"),
                ("image", "nginx:1.27.1"),
                ("replicas", "2"),
            ]),
        )
        .unwrap();

    let docs: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&rendered)
        .map(|d| serde_yaml::Value::deserialize(d).unwrap())
        .collect();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["kind"], "Deployment");
    assert_eq!(docs[1]["kind"], "Service");
    assert_eq!(
        docs[0]["spec"]["template"]["spec"]["containers"][0]["image"],
        "nginx:1.27.1"
    );
    assert_eq!(docs[1]["spec"]["selector"]["app"], "demo-nginx");
}
