use std::fmt;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::DeployConfig;
use crate::deploy::{Deployer, DockerDeployer};
use crate::error::{DeployError, DeployResult};
use crate::nginx::{self, NginxConfigurator, ProxyConfigurator};
use crate::provision::{AptProvisioner, Provisioner};
use crate::source::{Fetcher, GitFetcher, workdir_name};
use crate::ssh::{RemoteExecutor, SshSession};
use crate::strategy;
use crate::transport::{DEFAULT_REMOTE_DIR, ScpTransporter, Transporter};
use crate::validate::{HostValidator, ValidationReport, Validator};

/// One step of the deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    ValidateConfig,
    FetchSource,
    DetectStrategy,
    Provision,
    Transport,
    Deploy,
    ConfigureProxy,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ValidateConfig => "validate-config",
            Self::FetchSource => "fetch-source",
            Self::DetectStrategy => "detect-strategy",
            Self::Provision => "provision",
            Self::Transport => "transport",
            Self::Deploy => "deploy",
            Self::ConfigureProxy => "configure-proxy",
            Self::Validate => "validate",
        };
        f.write_str(name)
    }
}

/// Outcome of one stage, in run order.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub success: bool,
    pub detail: Option<String>,
}

/// What one deployment run produced. Serializable so the caller
/// can persist it as the run's log artifact.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub stages: Vec<StageOutcome>,
    pub failed_stage: Option<Stage>,
    pub diagnostic: Option<String>,
    pub url: Option<String>,
    pub validation: Option<ValidationReport>,
}

impl RunResult {
    fn pass(&mut self, stage: Stage, detail: Option<String>) {
        eprintln!("==> {stage}: ok");
        self.stages.push(StageOutcome {
            stage,
            success: true,
            detail,
        });
    }

    fn fail(mut self, stage: Stage, err: &DeployError) -> Self {
        eprintln!("==> {stage}: FAILED");
        eprintln!("    {err}");
        let diagnostic = err.diagnostic();
        if diagnostic != err.to_string() {
            eprintln!("    {diagnostic}");
        }
        self.stages.push(StageOutcome {
            stage,
            success: false,
            detail: Some(diagnostic.clone()),
        });
        self.failed_stage = Some(stage);
        self.diagnostic = Some(diagnostic);
        self.success = false;
        self
    }
}

/// Deployment engine: runs the fixed stage sequence against one
/// remote host, fail-fast except for the final validation stage.
///
/// # Example
///
/// ```rust,no_run
/// use trabuco::{DeployConfig, Pipeline};
///
/// fn main() -> anyhow::Result<()> {
///     let config = DeployConfig::new("https://github.com/acme/shop.git", "ghp_token")
///         .branch("main")
///         .remote("deploy", "203.0.113.7")
///         .key_path("/home/me/.ssh/id_ed25519")
///         .port(3000);
///
///     let pipeline = Pipeline::new(config);
///     pipeline.run()?;
///     Ok(())
/// }
/// ```
pub struct Pipeline {
    config: DeployConfig,
    remote_dir: String,
    fetcher: Box<dyn Fetcher>,
    provisioner: Box<dyn Provisioner>,
    transporter: Box<dyn Transporter>,
    deployer: Box<dyn Deployer>,
    proxy: Box<dyn ProxyConfigurator>,
    validator: Box<dyn Validator>,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: DeployConfig) -> Self {
        Self {
            config,
            remote_dir: DEFAULT_REMOTE_DIR.to_string(),
            fetcher: Box::new(GitFetcher::new()),
            provisioner: Box::new(AptProvisioner::new()),
            transporter: Box::new(ScpTransporter::new()),
            deployer: Box::new(DockerDeployer::new()),
            proxy: Box::new(NginxConfigurator::new()),
            validator: Box::new(HostValidator::new()),
        }
    }

    #[must_use]
    pub fn remote_dir(mut self, dir: &str) -> Self {
        self.remote_dir = dir.to_string();
        self
    }

    #[must_use]
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    #[must_use]
    pub fn provisioner(mut self, provisioner: impl Provisioner + 'static) -> Self {
        self.provisioner = Box::new(provisioner);
        self
    }

    #[must_use]
    pub fn transporter(mut self, transporter: impl Transporter + 'static) -> Self {
        self.transporter = Box::new(transporter);
        self
    }

    #[must_use]
    pub fn deployer(mut self, deployer: impl Deployer + 'static) -> Self {
        self.deployer = Box::new(deployer);
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: impl ProxyConfigurator + 'static) -> Self {
        self.proxy = Box::new(proxy);
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Run the full deployment sequence. Every stage is gated on
    /// the previous one; the only stage that aggregates failures
    /// instead of aborting is the final validation, since partial
    /// diagnostics are worth more than stopping once the
    /// application is already live.
    #[must_use]
    pub fn run_deployment(&self) -> RunResult {
        let mut result = RunResult::default();

        if let Err(e) = self.config.validate() {
            return result.fail(Stage::ValidateConfig, &e);
        }
        result.pass(Stage::ValidateConfig, None);

        let working_dir = match self.fetcher.fetch(&self.config) {
            Ok(dir) => {
                result.pass(Stage::FetchSource, Some(dir.to_string_lossy()));
                dir
            }
            Err(e) => return result.fail(Stage::FetchSource, &e),
        };

        let build = match strategy::detect(working_dir.path()) {
            Ok(build) => {
                result.pass(Stage::DetectStrategy, Some(build.as_str().to_string()));
                build
            }
            Err(e) => return result.fail(Stage::DetectStrategy, &e),
        };

        let session = SshSession::new(&self.config.host, &self.config.user)
            .with_key(&self.config.key_path);

        if let Err(e) = self.provisioner.provision(&session) {
            return result.fail(Stage::Provision, &e);
        }
        result.pass(Stage::Provision, None);

        if let Err(e) = self
            .transporter
            .transport(&session, &working_dir, &self.remote_dir)
        {
            return result.fail(Stage::Transport, &e);
        }
        result.pass(Stage::Transport, None);

        if let Err(e) = self
            .deployer
            .deploy(&session, build, &self.remote_dir, self.config.port)
        {
            return result.fail(Stage::Deploy, &e);
        }
        result.pass(Stage::Deploy, None);

        if let Err(e) = self.proxy.configure(&session, self.config.port) {
            return result.fail(Stage::ConfigureProxy, &e);
        }
        result.pass(Stage::ConfigureProxy, None);

        let report = self
            .validator
            .validate(&session, &self.config.host, self.config.port);
        result.pass(
            Stage::Validate,
            Some(if report.healthy() {
                "all checks passed".to_string()
            } else {
                "some checks failed (informational)".to_string()
            }),
        );
        result.validation = Some(report);

        result.success = true;
        result.url = Some(self.config.public_url());
        result
    }

    /// Parse CLI arguments and dispatch the appropriate command.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatched command fails.
    pub fn run(&self) -> DeployResult<()> {
        let cli = Cli::parse();

        match &cli.command {
            Command::Deploy { dry_run } => self.cmd_deploy(*dry_run),
            Command::Validate => self.cmd_validate(),
            Command::Status => self.cmd_status(),
            Command::Clean => self.cmd_clean(),
        }
    }

    fn cmd_deploy(&self, dry_run: bool) -> DeployResult<()> {
        if dry_run {
            return self.cmd_deploy_dry_run();
        }

        let result = self.run_deployment();

        if result.success {
            eprintln!();
            eprintln!("Deployment complete!");
            if let Some(url) = &result.url {
                eprintln!("Application available at: {url}");
            }
            Ok(())
        } else {
            let stage = result
                .failed_stage
                .map_or_else(|| "unknown".to_string(), |s| s.to_string());
            Err(DeployError::Other(format!(
                "deployment failed at stage '{stage}': {}",
                result.diagnostic.unwrap_or_default()
            )))
        }
    }

    #[allow(clippy::unnecessary_wraps)]
    fn cmd_deploy_dry_run(&self) -> DeployResult<()> {
        eprintln!("=== Dry run: no changes will be made ===");
        eprintln!();

        eprintln!("--- nginx site ---");
        println!("{}", nginx::render(self.config.port));

        eprintln!("--- Actions that would be performed ---");
        eprintln!(
            "1. Fetch {} (branch {}) into ./{}",
            self.config.repo_url,
            self.config.branch,
            workdir_name(&self.config.repo_url)
        );
        eprintln!("2. Provision docker, compose plugin, and nginx on {}", self.config.host);
        eprintln!("3. Copy the working directory to {}", self.remote_dir);
        eprintln!(
            "4. Build and start containers publishing {}:{}",
            self.config.port, self.config.port
        );
        eprintln!("5. Activate the nginx site and reload");
        eprintln!("6. Validate services and {}", self.config.public_url());

        Ok(())
    }

    fn cmd_validate(&self) -> DeployResult<()> {
        self.config.validate()?;
        let session = SshSession::new(&self.config.host, &self.config.user)
            .with_key(&self.config.key_path);
        let report = self
            .validator
            .validate(&session, &self.config.host, self.config.port);
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    fn cmd_status(&self) -> DeployResult<()> {
        self.config.validate()?;
        let session = SshSession::new(&self.config.host, &self.config.user)
            .with_key(&self.config.key_path);
        session.exec_interactive("docker ps --format 'table {{.Names}}\t{{.Status}}\t{{.Ports}}'")
    }

    /// Remove the local working directory. Gated on an explicit
    /// confirmation; never runs as part of a deployment.
    fn cmd_clean(&self) -> DeployResult<()> {
        let dir = workdir_name(&self.config.repo_url);
        if !std::path::Path::new(&dir).exists() {
            eprintln!("Nothing to clean: ./{dir} does not exist");
            return Ok(());
        }

        eprintln!("WARNING: this will delete the local working directory ./{dir}");
        eprint!("Are you sure? Type 'yes' to confirm: ");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "yes" {
            eprintln!("Aborted.");
            return Ok(());
        }

        std::fs::remove_dir_all(&dir)?;
        eprintln!("Removed ./{dir}");
        Ok(())
    }
}

#[derive(Parser)]
#[command(name = "trabuco")]
#[command(about = "Single-host deployment automation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full deployment pipeline
    Deploy {
        /// Preview generated files and actions without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Probe the deployed service and print the report
    Validate,

    /// Show container status on the remote host
    Status,

    /// Delete the local working directory (asks first)
    Clean,
}
