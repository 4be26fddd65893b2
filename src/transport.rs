use crate::error::{DeployError, DeployResult};
use crate::source::WorkingDir;
use crate::ssh::RemoteExecutor;

/// Where application files land on the remote host.
pub const DEFAULT_REMOTE_DIR: &str = "~/app";

/// Copies the working directory to the remote host.
pub trait Transporter {
    fn transport(
        &self,
        remote: &dyn RemoteExecutor,
        working_dir: &WorkingDir,
        remote_dir: &str,
    ) -> DeployResult<()>;
}

/// Recursive `scp` of the working directory's contents over the
/// remote target, overwriting whatever a previous run left.
pub struct ScpTransporter;

impl ScpTransporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for ScpTransporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transporter for ScpTransporter {
    fn transport(
        &self,
        remote: &dyn RemoteExecutor,
        working_dir: &WorkingDir,
        remote_dir: &str,
    ) -> DeployResult<()> {
        eprintln!("Copying {} to {remote_dir}...", working_dir.to_string_lossy());

        remote
            .exec(&format!("mkdir -p {remote_dir}"))
            .map_err(|e| DeployError::Transport(e.diagnostic()))?;

        remote
            .copy_dir(&working_dir.to_string_lossy(), remote_dir)
            .map_err(|e| DeployError::Transport(e.diagnostic()))?;

        Ok(())
    }
}
