use std::path::{Path, PathBuf};

use crate::cmd;
use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};

/// Local checkout of the repository at the requested branch.
///
/// Left in place after the run so the next deployment can update
/// it instead of re-cloning.
#[derive(Debug, Clone)]
pub struct WorkingDir {
    path: PathBuf,
}

impl WorkingDir {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Materializes the configured branch into a local working
/// directory.
pub trait Fetcher {
    fn fetch(&self, config: &DeployConfig) -> DeployResult<WorkingDir>;
}

/// Fetches over the `git` CLI, authenticating with the token
/// interpolated into the transport URL. The token is never
/// written to disk: a fresh clone's remote is reset to the clean
/// URL immediately, and fetches pass the authenticated URL as an
/// argument.
pub struct GitFetcher {
    base_dir: PathBuf,
}

impl GitFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
        }
    }

    /// Parent directory for working directories. Defaults to the
    /// current directory.
    #[must_use]
    pub fn base_dir(mut self, dir: &Path) -> Self {
        self.base_dir = dir.to_path_buf();
        self
    }

    fn git(config: &DeployConfig, args: &[&str]) -> DeployResult<String> {
        cmd::run("git", args).map_err(|e| fetch_err(&e, &config.token))
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for GitFetcher {
    fn fetch(&self, config: &DeployConfig) -> DeployResult<WorkingDir> {
        if !cmd::command_exists("git") {
            return Err(DeployError::SourceFetch("git is not installed".into()));
        }

        let name = workdir_name(&config.repo_url);
        let path = self.base_dir.join(&name);
        let path_str = path.to_string_lossy().into_owned();
        let authed = authenticated_url(&config.repo_url, &config.token);

        if path.join(".git").is_dir() {
            eprintln!("Updating existing checkout in {path_str}...");
            // Fetch the requested branch explicitly and reset the
            // local branch onto it. A plain `pull` would merge into
            // whatever branch the previous run left checked out.
            Self::git(config, &["-C", &path_str, "fetch", &authed, &config.branch])?;
            Self::git(
                config,
                &["-C", &path_str, "checkout", "-B", &config.branch, "FETCH_HEAD"],
            )?;
        } else {
            eprintln!("Cloning {} into {path_str}...", config.repo_url);
            Self::git(config, &["clone", &authed, &path_str])?;
            // Scrub the token from the stored remote right away.
            Self::git(
                config,
                &["-C", &path_str, "remote", "set-url", "origin", &config.repo_url],
            )?;
            Self::git(config, &["-C", &path_str, "checkout", &config.branch])?;
        }

        Ok(WorkingDir::new(path))
    }
}

/// Directory name derived from the repository URL's base name.
#[must_use]
pub fn workdir_name(repo_url: &str) -> String {
    repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repo_url)
        .trim_end_matches(".git")
        .to_string()
}

/// Interpolate the token into the transport URL for one-shot
/// authentication.
#[must_use]
pub fn authenticated_url(repo_url: &str, token: &str) -> String {
    repo_url.split_once("://").map_or_else(
        || repo_url.to_string(),
        |(scheme, rest)| format!("{scheme}://{token}@{rest}"),
    )
}

/// Convert a git CLI failure into a `SourceFetch` error with the
/// token redacted from whatever git printed.
fn fetch_err(err: &DeployError, token: &str) -> DeployError {
    let text = match err {
        DeployError::CommandFailed { stderr, .. } if !stderr.is_empty() => stderr.clone(),
        other => other.to_string(),
    };
    DeployError::SourceFetch(text.replace(token, "***"))
}
