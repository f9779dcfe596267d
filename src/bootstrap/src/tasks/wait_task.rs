/// WaitTask - blocks on a `kubectl wait` condition
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WaitTask {
    /// Task name for logging
    pub name: String,
    /// Resource reference, e.g. "provider.pkg.crossplane.io/provider-kubernetes"
    pub resource: String,
    /// Condition to wait for, e.g. "Healthy" or "Available"
    pub condition: String,
    /// Namespace (cluster-scoped resources leave this unset)
    pub namespace: Option<String>,
    /// Timeout passed to kubectl and used for the child process
    pub timeout: Duration,
}

impl WaitTask {
    pub fn new(
        name: impl Into<String>,
        resource: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            condition: condition.into(),
            namespace: None,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn display_name(&self) -> String {
        format!("wait/{}", self.name)
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// kubectl argument list for this wait.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "wait".to_string(),
            self.resource.clone(),
            format!("--for=condition={}", self.condition),
            format!("--timeout={}s", self.timeout.as_secs()),
        ];
        if let Some(namespace) = &self.namespace {
            args.push("--namespace".to_string());
            args.push(namespace.clone());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_args_cluster_scoped() {
        let task = WaitTask::new(
            "provider-kubernetes",
            "provider.pkg.crossplane.io/provider-kubernetes",
            "Healthy",
        )
        .with_timeout(Duration::from_secs(120));

        assert_eq!(
            task.to_args(),
            vec![
                "wait",
                "provider.pkg.crossplane.io/provider-kubernetes",
                "--for=condition=Healthy",
                "--timeout=120s",
            ]
        );
    }

    #[test]
    fn to_args_namespaced() {
        let task = WaitTask::new("argocd-server", "deployment/argocd-server", "Available")
            .in_namespace("argocd");

        let args = task.to_args();
        assert!(args.contains(&"--namespace".to_string()));
        assert!(args.contains(&"argocd".to_string()));
    }
}
