use crate::cmd;
use crate::error::{DeployError, DeployResult};

/// Executes commands and transfers files on a remote host.
///
/// Every stage past source fetching talks to the host through
/// this trait, so tests can substitute a scripted executor for a
/// live SSH session.
pub trait RemoteExecutor {
    /// Execute a command on the remote host and capture output.
    fn exec(&self, command: &str) -> DeployResult<String>;

    /// Execute a command with stdio inherited (interactive).
    fn exec_interactive(&self, command: &str) -> DeployResult<()>;

    /// Execute a multi-line script body on the remote host.
    fn exec_script(&self, script: &str) -> DeployResult<String>;

    /// Write content to a remote file.
    fn write_remote_file(&self, content: &str, remote_path: &str) -> DeployResult<()>;

    /// Recursively copy a local directory's contents to a remote
    /// path, overwriting what is there.
    fn copy_dir(&self, local_dir: &str, remote_path: &str) -> DeployResult<()>;
}

/// SSH session wrapper for executing commands and transferring
/// files to a remote host. One session per deployment run.
pub struct SshSession {
    host: String,
    user: String,
    key: Option<String>,
}

impl SshSession {
    #[must_use]
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            key: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key_path: &str) -> Self {
        self.key = Some(key_path.to_string());
        self
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.ssh_base_args();
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ];
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }

    fn scp_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
        ];
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }

    /// Map a local `CommandFailed` from the ssh binary to a
    /// `RemoteExecution` error naming the remote command.
    fn remote_err(command: &str, err: DeployError) -> DeployError {
        match err {
            DeployError::CommandFailed { status, stderr, .. } => DeployError::RemoteExecution {
                command: command.to_string(),
                status,
                output: stderr,
            },
            other => other,
        }
    }
}

impl RemoteExecutor for SshSession {
    fn exec(&self, command: &str) -> DeployResult<String> {
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run("ssh", &refs).map_err(|e| Self::remote_err(command, e))
    }

    fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_interactive("ssh", &refs).map_err(|e| Self::remote_err(command, e))
    }

    fn exec_script(&self, script: &str) -> DeployResult<String> {
        let args = self.build_ssh_args("bash -s");
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_stdin("ssh", &refs, script.as_bytes())
            .map_err(|e| Self::remote_err(script, e))
    }

    fn write_remote_file(&self, content: &str, remote_path: &str) -> DeployResult<()> {
        let command = format!("cat > {remote_path}");
        let args = self.build_ssh_args(&command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_stdin("ssh", &refs, content.as_bytes())
            .map_err(|e| Self::remote_err(&command, e))?;
        Ok(())
    }

    fn copy_dir(&self, local_dir: &str, remote_path: &str) -> DeployResult<()> {
        let mut args = self.scp_base_args();
        args.push("-r".to_string());
        // Trailing `/.` copies the directory's contents, not the
        // directory itself.
        args.push(format!("{}/.", local_dir.trim_end_matches('/')));
        args.push(format!("{}:{remote_path}", self.destination()));

        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_interactive("scp", &refs)
            .map_err(|e| Self::remote_err(&format!("scp -r {local_dir}"), e))
    }
}
