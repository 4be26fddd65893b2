use crate::error::{DeployError, DeployResult};
use crate::ssh::RemoteExecutor;

/// Idempotently ensures the remote host can build, run, and
/// front containers.
pub trait Provisioner {
    fn provision(&self, remote: &dyn RemoteExecutor) -> DeployResult<()>;
}

struct Component {
    name: &'static str,
    /// Command that exits zero when the component is present.
    check: &'static str,
    install_script: &'static str,
}

const COMPONENTS: [Component; 3] = [
    Component {
        name: "docker engine",
        check: "command -v docker",
        install_script: include_str!("../scripts/install-docker.sh"),
    },
    Component {
        name: "compose plugin",
        check: "docker compose version",
        install_script: include_str!("../scripts/install-compose.sh"),
    },
    Component {
        name: "nginx",
        check: "command -v nginx",
        install_script: include_str!("../scripts/install-nginx.sh"),
    },
];

/// Installs missing components with apt / the official Docker
/// convenience script. Assumes the SSH user is root or has
/// passwordless sudo.
///
/// Each component is checked before anything is installed, so a
/// second run against an already-provisioned host performs no
/// installs at all.
pub struct AptProvisioner;

impl AptProvisioner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for AptProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl Provisioner for AptProvisioner {
    fn provision(&self, remote: &dyn RemoteExecutor) -> DeployResult<()> {
        // Initial reachability probe; every later failure means
        // the host answered and something else went wrong.
        remote.exec("echo ok").map_err(|e| {
            DeployError::Provisioning(format!("host not reachable over SSH: {}", e.diagnostic()))
        })?;

        for component in &COMPONENTS {
            if remote.exec(component.check).is_ok() {
                eprintln!("{} already installed", component.name);
                continue;
            }

            eprintln!("Installing {}...", component.name);
            remote.exec_script(component.install_script).map_err(|e| {
                DeployError::Provisioning(format!(
                    "{} install failed: {}",
                    component.name,
                    e.diagnostic()
                ))
            })?;
        }

        // Idempotent; services must survive reboot even when
        // everything was already installed.
        remote
            .exec_script(include_str!("../scripts/enable-services.sh"))
            .map_err(|e| {
                DeployError::Provisioning(format!("enabling services failed: {}", e.diagnostic()))
            })?;

        Ok(())
    }
}
