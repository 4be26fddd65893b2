//! Single-host deployment engine for Rust.
//!
//! Trabuco takes a Git repository, a token, and a VPS address,
//! and turns them into a running application behind nginx: it
//! fetches the branch locally, provisions the host (Docker,
//! the compose plugin, nginx), copies the tree to `~/app`,
//! builds and starts the container or composition, writes the
//! reverse-proxy site, and probes the result.
//!
//! The name comes from Portuguese for *trebuchet*: hurl your
//! repository at a server and watch it land.
//!
//! # Overview
//!
//! A deployment is a [`Pipeline`] built from a [`DeployConfig`]
//! and driven by pluggable stages:
//!
//! - A [`Fetcher`](source::Fetcher) materializes the branch
//!   locally (default: [`GitFetcher`](source::GitFetcher))
//! - A [`Provisioner`](provision::Provisioner) readies the host
//!   (default: [`AptProvisioner`](provision::AptProvisioner))
//! - A [`Transporter`](transport::Transporter) ships the files
//! - A [`Deployer`](deploy::Deployer) builds and starts
//!   containers per the detected [`BuildStrategy`]
//! - A [`ProxyConfigurator`](nginx::ProxyConfigurator) fronts
//!   the port with nginx
//! - A [`Validator`](validate::Validator) reports per-check
//!   health without aborting on partial failure
//!
//! The stage sequence is fixed and fail-fast: validate config,
//! fetch source, detect the build strategy, provision, transport,
//! deploy, configure the proxy, validate. A stage failure stops
//! the run and names the stage in the [`RunResult`]; only the
//! final validation aggregates failures instead of aborting.
//!
//! # Example
//!
//! Create an `xtask/src/main.rs` in your project:
//!
//! ```rust,no_run
//! use trabuco::{DeployConfig, Pipeline};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = DeployConfig::new(
//!         "https://github.com/acme/shop.git",
//!         "ghp_yourtoken",
//!     )
//!     .branch("main")
//!     .remote("deploy", "203.0.113.7")
//!     .key_path("/home/me/.ssh/id_ed25519")
//!     .port(3000);
//!
//!     let pipeline = Pipeline::new(config);
//!     pipeline.run()?;
//!     Ok(())
//! }
//! ```
//!
//! Then use `cargo xtask` subcommands:
//!
//! ```sh
//! # Full deployment run
//! cargo xtask deploy
//!
//! # Preview the nginx site and action list without touching the host
//! cargo xtask deploy --dry-run
//!
//! # Probe the deployed service
//! cargo xtask validate
//!
//! # Remove the local working directory (asks first)
//! cargo xtask clean
//! ```
//!
//! # Failure model
//!
//! Every fatal error aborts the pipeline immediately and is
//! surfaced with the failing stage name and the captured remote
//! output; the host is left in whatever state the last completed
//! stage produced. Two conditions are deliberately tolerated: a
//! previous container that is already gone when teardown runs,
//! and an HTTP endpoint that is not reachable yet (reported as a
//! warning, since containers may still be starting).

// Allow noisy pedantic lints that don't add value for a
// deployment tool crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cmd;
pub mod config;
pub mod deploy;
pub mod error;
pub mod nginx;
pub mod pipeline;
pub mod provision;
pub mod source;
pub mod ssh;
pub mod strategy;
pub mod transport;
pub mod validate;

pub use config::DeployConfig;
pub use error::{DeployError, DeployResult};
pub use pipeline::{Pipeline, RunResult, Stage, StageOutcome};
pub use source::{GitFetcher, WorkingDir};
pub use ssh::{RemoteExecutor, SshSession};
pub use strategy::BuildStrategy;
pub use validate::{ValidationReport, Validator};
