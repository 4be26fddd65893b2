//! Scripted remote executor shared by the stage tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::process::{Command, ExitStatus};

use trabuco::error::{DeployError, DeployResult};
use trabuco::ssh::RemoteExecutor;

/// Records every remote invocation and answers from a script.
///
/// Log entries are tagged with the invocation kind so tests can
/// assert on what ran and in which order:
/// `exec:`, `interactive:`, `script:`, `write:`, `copy:`.
pub struct FakeRemote {
    log: RefCell<Vec<String>>,
    failures: Vec<String>,
    script_failures: Vec<String>,
    responses: Vec<(String, String)>,
}

impl FakeRemote {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: RefCell::new(Vec::new()),
            failures: Vec::new(),
            script_failures: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Any command (not script) whose text contains `pattern`
    /// fails with a scripted `RemoteExecution` error.
    #[must_use]
    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.failures.push(pattern.to_string());
        self
    }

    /// Any script body containing `pattern` fails. Kept separate
    /// from `fail_on` because install scripts embed the same
    /// `command -v` guards the presence checks use.
    #[must_use]
    pub fn fail_script_on(mut self, pattern: &str) -> Self {
        self.script_failures.push(pattern.to_string());
        self
    }

    /// Answer invocations containing `pattern` with `output`.
    /// First match wins; everything else answers "".
    #[must_use]
    pub fn respond(mut self, pattern: &str, output: &str) -> Self {
        self.responses.push((pattern.to_string(), output.to_string()));
        self
    }

    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// True if any logged invocation contains `pattern`.
    #[must_use]
    pub fn ran(&self, pattern: &str) -> bool {
        self.log.borrow().iter().any(|c| c.contains(pattern))
    }

    /// Number of logged invocations containing `pattern`.
    #[must_use]
    pub fn count(&self, pattern: &str) -> usize {
        self.log.borrow().iter().filter(|c| c.contains(pattern)).count()
    }

    fn record(&self, kind: &str, text: &str) -> DeployResult<String> {
        self.log.borrow_mut().push(format!("{kind}:{text}"));

        let failures = if kind == "script" {
            &self.script_failures
        } else {
            &self.failures
        };
        if failures.iter().any(|p| text.contains(p)) {
            return Err(DeployError::RemoteExecution {
                command: text.to_string(),
                status: failed_status(),
                output: "scripted failure".to_string(),
            });
        }

        let output = self
            .responses
            .iter()
            .find(|(p, _)| text.contains(p))
            .map(|(_, o)| o.clone())
            .unwrap_or_default();
        Ok(output)
    }
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteExecutor for FakeRemote {
    fn exec(&self, command: &str) -> DeployResult<String> {
        self.record("exec", command)
    }

    fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        self.record("interactive", command).map(|_| ())
    }

    fn exec_script(&self, script: &str) -> DeployResult<String> {
        self.record("script", script)
    }

    fn write_remote_file(&self, content: &str, remote_path: &str) -> DeployResult<()> {
        self.log
            .borrow_mut()
            .push(format!("write:{remote_path}:{content}"));
        if self.failures.iter().any(|p| remote_path.contains(p)) {
            return Err(DeployError::RemoteExecution {
                command: format!("cat > {remote_path}"),
                status: failed_status(),
                output: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    fn copy_dir(&self, local_dir: &str, remote_path: &str) -> DeployResult<()> {
        self.record("copy", &format!("{local_dir} -> {remote_path}"))
            .map(|_| ())
    }
}

fn failed_status() -> ExitStatus {
    Command::new("sh")
        .args(["-c", "exit 1"])
        .status()
        .expect("sh available in tests")
}
