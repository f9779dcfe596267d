//! Bootstrap tasks - the planned units of work the executor runs.

pub mod exec_task;
pub mod kubectl_task;
pub mod wait_task;

pub use exec_task::ExecTask;
pub use kubectl_task::{KubectlAction, KubectlTask};
pub use wait_task::WaitTask;

use std::time::Duration;

/// A single planned bootstrap operation.
#[derive(Debug, Clone)]
pub enum BootstrapTask {
    /// Run a host binary
    Exec(ExecTask),
    /// Apply or delete a rendered manifest via kubectl
    Kubectl(KubectlTask),
    /// Block on a kubectl wait condition
    Wait(WaitTask),
}

impl BootstrapTask {
    pub fn exec(task: ExecTask) -> Self {
        Self::Exec(task)
    }

    pub fn kubectl(task: KubectlTask) -> Self {
        Self::Kubectl(task)
    }

    pub fn wait(task: WaitTask) -> Self {
        Self::Wait(task)
    }

    /// Get display name for logging
    pub fn display_name(&self) -> String {
        match self {
            Self::Exec(task) => task.display_name(),
            Self::Kubectl(task) => task.display_name(),
            Self::Wait(task) => task.display_name(),
        }
    }

    /// Get timeout
    pub fn get_timeout(&self) -> Duration {
        match self {
            Self::Exec(task) => task.get_timeout(),
            Self::Kubectl(task) => task.get_timeout(),
            Self::Wait(task) => task.get_timeout(),
        }
    }
}
