/// ExecTask - run a host binary with arguments
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExecTask {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ExecTask {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn display_name(&self) -> String {
        format!("{}/{}", self.program, self.name)
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }
}
