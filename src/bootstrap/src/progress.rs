//! Progress reporting for bootstrap operations.

use serde::{Deserialize, Serialize};

/// Progress update emitted while the demo environment comes up.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct BootstrapProgress {
    pub percentage: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
}

impl BootstrapProgress {
    pub fn new(percentage: u32, message: String) -> Self {
        Self {
            percentage,
            message,
            phase: None,
            task_name: None,
        }
    }
}

/// Progress reporter for bootstrap operations.
pub trait ProgressReporter: Send + Sync + 'static {
    fn emit(&self, percentage: u32, message: String);

    /// Emit progress with phase and task_name metadata.
    fn emit_detailed(
        &self,
        percentage: u32,
        message: String,
        _phase: Option<String>,
        _task_name: Option<String>,
    ) {
        self.emit(percentage, message);
    }
}

/// Channel-based progress reporter.
pub struct ChannelProgressReporter {
    sender: tokio::sync::mpsc::Sender<BootstrapProgress>,
}

impl ChannelProgressReporter {
    pub fn new(sender: tokio::sync::mpsc::Sender<BootstrapProgress>) -> Self {
        Self { sender }
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn emit(&self, percentage: u32, message: String) {
        self.emit_detailed(percentage, message, None, None);
    }

    fn emit_detailed(
        &self,
        percentage: u32,
        message: String,
        phase: Option<String>,
        task_name: Option<String>,
    ) {
        let mut progress = BootstrapProgress::new(percentage, message);
        progress.phase = phase;
        progress.task_name = task_name;
        let _ = self.sender.try_send(progress);
    }
}
