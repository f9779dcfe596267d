//! Error types for bootstrap operations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Error type for bootstrap operations.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Host command error: {0}")]
    Host(String),

    #[error("Cluster error: {0}")]
    Cluster(String),

    #[error("Package error: {0}")]
    Package(String),

    #[error("GitOps error: {0}")]
    GitOps(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
