/// Demo workflow - the scripted GitOps update/rollback cycle.
///
/// update: bump the demo workload's image tag in the repository, push, and
/// wait for ArgoCD to sync the pushed revision. rollback: revert the last
/// commit, push, wait again. cycle: update, dwell, rollback.
use crate::config::{DemoCycleConfig, GitOpsConfig};
use crate::error::{BootstrapError, Result};
use crate::git::{GitCheckout, GitSettings};
use crate::host::HostRunner;
use crate::wait::{wait_for_application_synced, PollSettings};
use serde::Deserialize;
use serde_yaml::Value;
use std::time::Duration;

/// Replace the image tag of every container image in a (possibly multi-doc)
/// manifest. Returns the rewritten manifest and the first resulting image
/// reference. A manifest without any container image is an error - the demo
/// would otherwise commit a no-op.
pub fn set_image_tag(manifest: &str, tag: &str) -> Result<(String, String)> {
    let mut docs = Vec::new();
    for deserializer in serde_yaml::Deserializer::from_str(manifest) {
        let doc = Value::deserialize(deserializer)
            .map_err(|e| BootstrapError::GitOps(format!("Failed to parse manifest: {}", e)))?;
        docs.push(doc);
    }

    let mut first_image = None;
    for doc in &mut docs {
        let Some(containers) = doc
            .get_mut("spec")
            .and_then(|s| s.get_mut("template"))
            .and_then(|t| t.get_mut("spec"))
            .and_then(|s| s.get_mut("containers"))
            .and_then(|c| c.as_sequence_mut())
        else {
            continue;
        };

        for container in containers.iter_mut() {
            let Some(image) = container.get("image").and_then(|i| i.as_str()) else {
                continue;
            };
            let new_image = retag(image, tag);
            if first_image.is_none() {
                first_image = Some(new_image.clone());
            }
            container["image"] = Value::String(new_image);
        }
    }

    let Some(new_image) = first_image else {
        return Err(BootstrapError::GitOps(
            "Manifest has no container image to update".to_string(),
        ));
    };

    let mut out = String::new();
    for (i, doc) in docs.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        let rendered = serde_yaml::to_string(doc)
            .map_err(|e| BootstrapError::GitOps(format!("Failed to serialize manifest: {}", e)))?;
        out.push_str(&rendered);
    }

    Ok((out, new_image))
}

/// Swap the tag of an image reference, leaving the repository part alone.
/// Registry ports (host:5000/repo) are not mistaken for tags.
fn retag(image: &str, tag: &str) -> String {
    let tag_sep = match image.rfind('/') {
        Some(slash) => image[slash..].find(':').map(|i| slash + i),
        None => image.find(':'),
    };
    match tag_sep {
        Some(idx) => format!("{}:{}", &image[..idx], tag),
        None => format!("{}:{}", image, tag),
    }
}

/// Push the image tag update and wait for ArgoCD to sync it.
/// Returns the pushed revision.
pub async fn run_update(
    runner: &HostRunner,
    config: &GitOpsConfig,
    demo: &DemoCycleConfig,
    argocd_namespace: &str,
    git: &GitSettings,
) -> Result<String> {
    let checkout = GitCheckout::clone_fresh(runner, git, &config.checkout_dir).await?;

    let manifest_file = config.manifest_file(checkout.path());
    let manifest = std::fs::read_to_string(&manifest_file).map_err(|e| {
        BootstrapError::GitOps(format!(
            "Demo manifest {} not readable (run `gitops seed` first): {}",
            manifest_file.display(),
            e
        ))
    })?;

    let (updated, new_image) = set_image_tag(&manifest, &demo.update_tag)?;
    std::fs::write(&manifest_file, updated).map_err(BootstrapError::Io)?;

    let committed = checkout
        .commit_all(&format!("Update {} to {}", config.workload, new_image))
        .await?;
    if !committed {
        return Err(BootstrapError::GitOps(format!(
            "Workload already at {}, nothing to update",
            new_image
        )));
    }
    checkout.push().await?;
    let revision = checkout.head_revision().await?;

    tracing::info!(
        "[DemoWorkflow] Pushed update to {} ({}), waiting for sync",
        new_image,
        &revision[..revision.len().min(8)]
    );

    wait_for_application_synced(
        runner,
        &config.application,
        argocd_namespace,
        Some(&revision),
        PollSettings::with_timeout(Duration::from_secs(config.sync_timeout_secs)),
    )
    .await?;

    Ok(revision)
}

/// Revert the last demo commit and wait for ArgoCD to sync the revert.
/// Returns the pushed revision.
pub async fn run_rollback(
    runner: &HostRunner,
    config: &GitOpsConfig,
    argocd_namespace: &str,
    git: &GitSettings,
) -> Result<String> {
    let checkout = GitCheckout::clone_fresh(runner, git, &config.checkout_dir).await?;

    let subject = checkout.head_subject().await?;
    tracing::info!("[DemoWorkflow] Reverting last commit: {}", subject);

    checkout.revert_head().await?;
    checkout.push().await?;
    let revision = checkout.head_revision().await?;

    wait_for_application_synced(
        runner,
        &config.application,
        argocd_namespace,
        Some(&revision),
        PollSettings::with_timeout(Duration::from_secs(config.sync_timeout_secs)),
    )
    .await?;

    tracing::info!("[DemoWorkflow] Rollback synced");
    Ok(revision)
}

/// The full scripted demo: update, dwell, rollback.
pub async fn run_cycle(
    runner: &HostRunner,
    config: &GitOpsConfig,
    demo: &DemoCycleConfig,
    argocd_namespace: &str,
    git: &GitSettings,
) -> Result<()> {
    run_update(runner, config, demo, argocd_namespace, git).await?;

    tracing::info!(
        "[DemoWorkflow] Update synced; dwelling {}s before rollback",
        demo.dwell_secs
    );
    tokio::time::sleep(Duration::from_secs(demo.dwell_secs)).await;

    run_rollback(runner, config, argocd_namespace, git).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retag_plain_image() {
        assert_eq!(retag("nginx:1.27.1", "1.29.1"), "nginx:1.29.1");
        assert_eq!(retag("nginx", "1.29.1"), "nginx:1.29.1");
    }

    #[test]
    fn retag_keeps_registry_port() {
        assert_eq!(
            retag("localhost:5000/nginx:1.27.1", "1.29.1"),
            "localhost:5000/nginx:1.29.1"
        );
        assert_eq!(
            retag("localhost:5000/nginx", "1.29.1"),
            "localhost:5000/nginx:1.29.1"
        );
    }
}
