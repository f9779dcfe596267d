//! Unit tests for the demo manifest mutation.

use bootstrap::workflows::demo::set_image_tag;

const DEMO_MANIFEST: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: demo-nginx
  labels:
    app: demo-nginx
spec:
  replicas: 2
  selector:
    matchLabels:
      app: demo-nginx
  template:
    metadata:
      labels:
        app: demo-nginx
    spec:
      containers:
        - name: web
          image: nginx:1.27.1
          ports:
            - containerPort: 80
---
apiVersion: v1
kind: Service
metadata:
  name: demo-nginx
spec:
  selector:
    app: demo-nginx
  ports:
    - port: 80
      targetPort: 80
"#;

#[test]
fn test_set_image_tag_updates_deployment() {
    let (updated, new_image) = set_image_tag(DEMO_MANIFEST, "1.29.1").unwrap();
    assert_eq!(new_image, "nginx:1.29.1");
    assert!(updated.contains("nginx:1.29.1"));
    assert!(!updated.contains("nginx:1.27.1"));
}

#[test]
fn test_set_image_tag_preserves_other_fields() {
    use serde::Deserialize;

    let (updated, _) = set_image_tag(DEMO_MANIFEST, "1.29.1").unwrap();
    let docs: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&updated)
        .map(|d| serde_yaml::Value::deserialize(d).unwrap())
        .collect();

    assert_eq!(docs.len(), 2);
    let deployment = &docs[0];
    assert_eq!(deployment["kind"], "Deployment");
    assert_eq!(deployment["spec"]["replicas"], 2);
    assert_eq!(
        deployment["spec"]["template"]["spec"]["containers"][0]["name"],
        "web"
    );
    assert_eq!(
        deployment["spec"]["template"]["spec"]["containers"][0]["ports"][0]["containerPort"],
        80
    );
    // The Service document passes through untouched
    assert_eq!(docs[1]["kind"], "Service");
    assert_eq!(docs[1]["spec"]["ports"][0]["port"], 80);
}

#[test]
fn test_set_image_tag_is_idempotent_on_reapply() {
    let (first, _) = set_image_tag(DEMO_MANIFEST, "1.29.1").unwrap();
    let (second, image) = set_image_tag(&first, "1.29.1").unwrap();
    assert_eq!(first, second);
    assert_eq!(image, "nginx:1.29.1");
}

#[test]
fn test_set_image_tag_rejects_manifest_without_containers() {
    let manifest = r#"apiVersion: v1
kind: Service
metadata:
  name: lonely
spec:
  ports:
    - port: 80
"#;
    let err = set_image_tag(manifest, "1.29.1").unwrap_err();
    assert!(err.to_string().contains("no container image"));
}

#[test]
fn test_set_image_tag_rejects_invalid_yaml() {
    assert!(set_image_tag(":\n  - busted: [", "1.29.1").is_err());
}
