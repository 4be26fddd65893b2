use std::thread;
use std::time::Duration;

use crate::error::{DeployError, DeployResult};
use crate::ssh::RemoteExecutor;
use crate::strategy::BuildStrategy;

/// Fixed container name used by the single-container strategy.
pub const CONTAINER_NAME: &str = "app";

/// Wait after starting containers before validation probes run,
/// so the application has a chance to bind its port.
pub const SETTLE_INTERVAL: Duration = Duration::from_secs(10);

/// Builds and starts the application on the remote host.
pub trait Deployer {
    fn deploy(
        &self,
        remote: &dyn RemoteExecutor,
        strategy: BuildStrategy,
        remote_dir: &str,
        port: u16,
    ) -> DeployResult<()>;
}

/// Drives `docker` / `docker compose` over the remote session.
///
/// Teardown of a previous instance is tolerant: nothing to stop
/// is not an error, just a no-op.
pub struct DockerDeployer {
    settle: Duration,
}

impl DockerDeployer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            settle: SETTLE_INTERVAL,
        }
    }

    /// Override the post-start settle wait (tests use zero).
    #[must_use]
    pub const fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    fn deploy_compose(remote: &dyn RemoteExecutor, remote_dir: &str) -> DeployResult<()> {
        eprintln!("Stopping previous composition (if any)...");
        remote
            .exec(&format!(
                "cd {remote_dir} && docker compose down 2>/dev/null || true"
            ))
            .map_err(|e| DeployError::Deployment(e.diagnostic()))?;

        eprintln!("Building and starting composition...");
        remote
            .exec_interactive(&format!(
                "cd {remote_dir} && docker compose up -d --build"
            ))
            .map_err(|e| DeployError::Deployment(e.diagnostic()))?;

        Ok(())
    }

    fn deploy_single(
        remote: &dyn RemoteExecutor,
        remote_dir: &str,
        port: u16,
    ) -> DeployResult<()> {
        eprintln!("Removing previous container (if any)...");
        remote
            .exec(&format!(
                "docker rm -f {CONTAINER_NAME} 2>/dev/null || true"
            ))
            .map_err(|e| DeployError::Deployment(e.diagnostic()))?;

        eprintln!("Building image...");
        remote
            .exec_interactive(&format!(
                "cd {remote_dir} && docker build -t {CONTAINER_NAME}:latest ."
            ))
            .map_err(|e| DeployError::Deployment(e.diagnostic()))?;

        eprintln!("Starting container on port {port}...");
        remote
            .exec(&format!(
                "docker run -d --name {CONTAINER_NAME} --restart unless-stopped \
                 -p {port}:{port} {CONTAINER_NAME}:latest"
            ))
            .map_err(|e| DeployError::Deployment(e.diagnostic()))?;

        Ok(())
    }
}

impl Default for DockerDeployer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployer for DockerDeployer {
    fn deploy(
        &self,
        remote: &dyn RemoteExecutor,
        strategy: BuildStrategy,
        remote_dir: &str,
        port: u16,
    ) -> DeployResult<()> {
        match strategy {
            BuildStrategy::Compose => Self::deploy_compose(remote, remote_dir)?,
            BuildStrategy::SingleContainer => Self::deploy_single(remote, remote_dir, port)?,
        }

        if !self.settle.is_zero() {
            eprintln!("Waiting {}s for the application to settle...", self.settle.as_secs());
            thread::sleep(self.settle);
        }

        Ok(())
    }
}
