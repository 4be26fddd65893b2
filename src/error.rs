use std::process::ExitStatus;

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("command failed: {command}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("remote execution failed: {command}")]
    RemoteExecution {
        command: String,
        status: ExitStatus,
        output: String,
    },

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("source fetch failed: {0}")]
    SourceFetch(String),

    #[error("no build configuration in {0}: expected a Dockerfile or a compose file")]
    NoBuildConfig(String),

    #[error("provisioning failed: {0}")]
    Provisioning(String),

    #[error("file transport failed: {0}")]
    Transport(String),

    #[error("deployment failed: {0}")]
    Deployment(String),

    #[error("proxy configuration rejected: {0}")]
    ProxyConfig(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DeployError {
    /// Captured remote output attached to this error, when the
    /// failure came from a remote command.
    #[must_use]
    pub fn remote_output(&self) -> Option<&str> {
        match self {
            Self::RemoteExecution { output, .. } => Some(output),
            Self::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Best available diagnostic text: the captured remote
    /// output when present, the display form otherwise.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self.remote_output() {
            Some(output) if !output.is_empty() => output.to_string(),
            _ => self.to_string(),
        }
    }
}
