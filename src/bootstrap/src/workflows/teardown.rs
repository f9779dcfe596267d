/// Teardown workflow - dismantle the demo environment.
///
/// Every step is best-effort: teardown must succeed against a half-built
/// environment, so absence of any piece only warns.
use crate::config::DemoConfig;
use crate::error::Result;
use crate::host::HostRunner;
use crate::workflows::{argocd, cluster};

pub async fn teardown(runner: &HostRunner, config: &DemoConfig) -> Result<()> {
    match argocd::stop_port_forward(&config.argocd) {
        Ok(true) => tracing::info!("[Teardown] Port-forward stopped"),
        Ok(false) => tracing::debug!("[Teardown] No port-forward running"),
        Err(e) => tracing::warn!("[Teardown] Failed to stop port-forward: {}", e),
    }

    if let Err(e) = cluster::delete_cluster(runner, &config.cluster).await {
        tracing::warn!("[Teardown] Failed to delete cluster: {}", e);
    }

    let checkout = &config.gitops.checkout_dir;
    if checkout.exists() {
        match std::fs::remove_dir_all(checkout) {
            Ok(()) => tracing::info!(
                "[Teardown] Removed scratch checkout {}",
                checkout.display()
            ),
            Err(e) => tracing::warn!(
                "[Teardown] Failed to remove {}: {}",
                checkout.display(),
                e
            ),
        }
    }

    tracing::info!("[Teardown] Demo environment torn down");
    Ok(())
}
