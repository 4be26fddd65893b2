use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::Serialize;

use crate::deploy::CONTAINER_NAME;
use crate::ssh::RemoteExecutor;

/// Bounded connect for the HTTP reachability probe.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one health check.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    /// A failed check that is expected while the application is
    /// still starting up.
    pub warning: bool,
    pub detail: Option<String>,
}

/// Ordered results of every post-deployment check. A failing
/// check never stops the others; all four are collected before
/// the report is returned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<Check>,
}

impl ValidationReport {
    fn record(&mut self, name: &str, warning: bool, result: Result<Option<String>, String>) {
        let (passed, detail) = match result {
            Ok(detail) => (true, detail),
            Err(detail) => (false, Some(detail)),
        };
        self.checks.push(Check {
            name: name.to_string(),
            passed,
            warning: warning && !passed,
            detail,
        });
    }

    /// True when every hard check passed. Warning-level failures
    /// (HTTP not reachable yet) do not count against health.
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.checks.iter().all(|c| c.passed || c.warning)
    }

    pub fn print_summary(&self) {
        for check in &self.checks {
            let mark = if check.passed {
                "ok"
            } else if check.warning {
                "warn"
            } else {
                "FAIL"
            };
            match &check.detail {
                Some(d) if !check.passed => eprintln!("  [{mark}] {}: {d}", check.name),
                _ => eprintln!("  [{mark}] {}", check.name),
            }
        }
    }
}

/// Probes the deployed service and reports per-check verdicts.
pub trait Validator {
    fn validate(&self, remote: &dyn RemoteExecutor, host: &str, port: u16) -> ValidationReport;
}

/// Checks, in order: docker service active, application
/// container running, nginx active, public HTTP endpoint
/// reachable.
pub struct HostValidator {
    connect_timeout: Duration,
}

impl HostValidator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn service_active(remote: &dyn RemoteExecutor, service: &str) -> Result<Option<String>, String> {
        // `is-active` prints the state to stdout but exits non-zero
        // for any state except `active`. Tolerate the exit code so
        // the state string is what gets reported, not a generic
        // remote-execution failure.
        match remote.exec(&format!("systemctl is-active {service} || true")) {
            Ok(state) if state.trim() == "active" => Ok(None),
            Ok(state) if state.trim().is_empty() => Err(format!("{service} state unknown")),
            Ok(state) => Err(format!("{service} is {}", state.trim())),
            Err(e) => Err(e.diagnostic()),
        }
    }

    fn container_running(remote: &dyn RemoteExecutor) -> Result<Option<String>, String> {
        let listing = remote
            .exec("docker ps --format '{{.Names}}\t{{.Status}}\t{{.Ports}}'")
            .map_err(|e| e.diagnostic())?;

        if listing.trim().is_empty() {
            Err(format!("no running containers (expected {CONTAINER_NAME} or a composition)"))
        } else {
            Ok(Some(listing))
        }
    }
}

impl Default for HostValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for HostValidator {
    fn validate(&self, remote: &dyn RemoteExecutor, host: &str, _port: u16) -> ValidationReport {
        eprintln!("Validating deployment on {host}...");
        let mut report = ValidationReport::default();

        report.record("docker service", false, Self::service_active(remote, "docker"));
        report.record("application container", false, Self::container_running(remote));
        report.record("nginx service", false, Self::service_active(remote, "nginx"));
        report.record(
            "http endpoint",
            true,
            http_reachable(host, 80, self.connect_timeout),
        );

        report.print_summary();
        report
    }
}

/// Probe `http://host:port/` with a bounded connect timeout.
/// Anything that answers the GET counts as reachable; status
/// codes are not interpreted.
pub fn http_reachable(host: &str, port: u16, timeout: Duration) -> Result<Option<String>, String> {
    let addr = format!("{host}:{port}")
        .to_socket_addrs()
        .map_err(|e| format!("cannot resolve {host}: {e}"))?
        .next()
        .ok_or_else(|| format!("no address for {host}"))?;

    let mut stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| format!("http://{host}/ not reachable yet: {e}"))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|e| e.to_string())?;

    let request = format!("GET / HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .map_err(|e| format!("http://{host}/ refused the request: {e}"))?;

    let mut buf = [0u8; 64];
    let read = stream
        .read(&mut buf)
        .map_err(|e| format!("http://{host}/ did not answer: {e}"))?;
    if read == 0 {
        return Err(format!("http://{host}/ closed the connection without answering"));
    }

    Ok(Some(
        String::from_utf8_lossy(&buf[..read]).lines().next().unwrap_or("").to_string(),
    ))
}
