use std::path::Path;

use docker_compose_types::Compose;
use serde::Serialize;

use crate::error::{DeployError, DeployResult};

const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// How the application gets built and started on the host.
///
/// When a repository carries both descriptors, `Compose` wins:
/// a compose file describes the whole stack while a Dockerfile
/// describes one image, and compose files routinely reference
/// the Dockerfile anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildStrategy {
    Compose,
    SingleContainer,
}

impl BuildStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compose => "compose",
            Self::SingleContainer => "single-container",
        }
    }
}

/// Classify the working directory by its build descriptor.
///
/// A compose descriptor is sanity-parsed before being accepted;
/// a present-but-malformed compose file is an error rather than
/// a silent fall-through to the Dockerfile.
pub fn detect(working_dir: &Path) -> DeployResult<BuildStrategy> {
    for name in COMPOSE_FILES {
        let candidate = working_dir.join(name);
        if candidate.is_file() {
            let content = std::fs::read_to_string(&candidate)?;
            let compose: Compose = serde_yaml::from_str(&content).map_err(|e| {
                DeployError::Other(format!("compose file {name} is not valid: {e}"))
            })?;
            let services: Vec<&String> = compose.services.0.keys().collect();
            eprintln!("Found {name} with services {services:?}");
            return Ok(BuildStrategy::Compose);
        }
    }

    if working_dir.join("Dockerfile").is_file() {
        return Ok(BuildStrategy::SingleContainer);
    }

    Err(DeployError::NoBuildConfig(
        working_dir.to_string_lossy().into_owned(),
    ))
}
