use crate::error::{DeployError, DeployResult};
use crate::ssh::RemoteExecutor;

const SITE_NAME: &str = "app";
const STAGING_PATH: &str = "/tmp/trabuco-site.conf";

/// Shell preamble selecting sudo when the session user is not
/// root.
const SUDO: &str = r#"S=""; [ "$(id -u)" -ne 0 ] && S="sudo"; "#;

/// Render the nginx site rule forwarding public port 80 to the
/// application port on localhost.
#[must_use]
pub fn render(port: u16) -> String {
    format!(
        "server {{\n    \
             listen 80;\n    \
             server_name _;\n\n    \
             location / {{\n        \
                 proxy_pass http://localhost:{port};\n        \
                 proxy_set_header Host $host;\n        \
                 proxy_set_header X-Real-IP $remote_addr;\n        \
                 proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n        \
                 proxy_set_header X-Forwarded-Proto $scheme;\n    \
             }}\n\
         }}\n"
    )
}

/// Installs and activates the reverse-proxy rule.
pub trait ProxyConfigurator {
    fn configure(&self, remote: &dyn RemoteExecutor, port: u16) -> DeployResult<()>;
}

/// Writes the rendered site rule to `sites-available`, enables
/// it, disables the stock default site, and reloads nginx - but
/// only after `nginx -t` accepts the new configuration. A
/// rejected configuration leaves the running proxy untouched.
pub struct NginxConfigurator;

impl NginxConfigurator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for NginxConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyConfigurator for NginxConfigurator {
    fn configure(&self, remote: &dyn RemoteExecutor, port: u16) -> DeployResult<()> {
        eprintln!("Configuring nginx site for port {port}...");

        remote
            .write_remote_file(&render(port), STAGING_PATH)
            .map_err(|e| DeployError::ProxyConfig(e.diagnostic()))?;

        remote
            .exec(&format!(
                "{SUDO}$S mv {STAGING_PATH} /etc/nginx/sites-available/{SITE_NAME} && \
                 $S ln -sf /etc/nginx/sites-available/{SITE_NAME} \
                 /etc/nginx/sites-enabled/{SITE_NAME} && \
                 $S rm -f /etc/nginx/sites-enabled/default"
            ))
            .map_err(|e| DeployError::ProxyConfig(e.diagnostic()))?;

        // Validate before reloading so a bad rule never takes
        // down a previously working proxy.
        remote
            .exec(&format!("{SUDO}$S nginx -t"))
            .map_err(|e| DeployError::ProxyConfig(e.diagnostic()))?;

        remote
            .exec(&format!("{SUDO}$S systemctl reload nginx"))
            .map_err(|e| DeployError::ProxyConfig(e.diagnostic()))?;

        Ok(())
    }
}
