use std::fs;
use std::path::Path;

use crate::error::{DeployError, DeployResult};

/// Everything one deployment run needs: where the code lives,
/// how to authenticate, and which host to ship it to.
///
/// Immutable once validated; the engine holds it read-only for
/// the duration of the run.
///
/// # Example
///
/// ```
/// use trabuco::DeployConfig;
///
/// let config = DeployConfig::new("https://github.com/acme/shop.git", "ghp_token")
///     .branch("release")
///     .remote("deploy", "203.0.113.7")
///     .key_path("/home/me/.ssh/id_ed25519")
///     .port(3000);
///
/// assert_eq!(config.branch, "release");
/// assert_eq!(config.port, 3000);
/// ```
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub repo_url: String,
    pub token: String,
    pub branch: String,
    pub user: String,
    pub host: String,
    pub key_path: String,
    pub port: u16,
}

impl DeployConfig {
    #[must_use]
    pub fn new(repo_url: &str, token: &str) -> Self {
        Self {
            repo_url: repo_url.to_string(),
            token: token.to_string(),
            branch: "main".to_string(),
            user: String::new(),
            host: String::new(),
            key_path: String::new(),
            port: 8080,
        }
    }

    #[must_use]
    pub fn branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    #[must_use]
    pub fn remote(mut self, user: &str, host: &str) -> Self {
        self.user = user.to_string();
        self.host = host.to_string();
        self
    }

    #[must_use]
    pub fn key_path(mut self, path: &str) -> Self {
        self.key_path = path.to_string();
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Check the config is complete and the key material usable.
    ///
    /// The private key must exist and be readable; its mode is
    /// forced to `0600` so the ssh binary will accept it.
    pub fn validate(&self) -> DeployResult<()> {
        for (name, value) in [
            ("repository URL", &self.repo_url),
            ("access token", &self.token),
            ("branch", &self.branch),
            ("SSH user", &self.user),
            ("host", &self.host),
            ("key path", &self.key_path),
        ] {
            if value.trim().is_empty() {
                return Err(DeployError::ConfigInvalid(format!("{name} is empty")));
            }
        }

        if self.port == 0 {
            return Err(DeployError::ConfigInvalid("port must be non-zero".into()));
        }

        let key = Path::new(&self.key_path);
        if !key.is_file() {
            return Err(DeployError::ConfigInvalid(format!(
                "key file not found: {}",
                self.key_path
            )));
        }
        fs::read(key).map_err(|e| {
            DeployError::ConfigInvalid(format!("key file unreadable: {}: {e}", self.key_path))
        })?;

        restrict_key_permissions(key)?;

        Ok(())
    }

    /// The URL the deployed application answers on once the
    /// proxy forwards port 80.
    #[must_use]
    pub fn public_url(&self) -> String {
        format!("http://{}", self.host)
    }
}

/// Force the key file to owner read/write only. ssh refuses keys
/// readable by group or others.
#[cfg(unix)]
fn restrict_key_permissions(key: &Path) -> DeployResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(key)?;
    let mut perms = metadata.permissions();
    if perms.mode() & 0o077 != 0 {
        perms.set_mode(0o600);
        fs::set_permissions(key, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_key_permissions(_key: &Path) -> DeployResult<()> {
    Ok(())
}
