mod common;

use std::time::Duration;

use common::FakeRemote;
use trabuco::validate::{HostValidator, Validator};

fn validator() -> HostValidator {
    HostValidator::new().connect_timeout(Duration::from_millis(200))
}

#[test]
fn one_failure_does_not_stop_the_others() {
    // Container listing is empty: that check fails hard, yet all
    // four checks are still populated in order.
    let remote = FakeRemote::new()
        .respond("systemctl is-active docker", "active")
        .respond("systemctl is-active nginx", "active")
        .respond("docker ps", "");

    let report = validator().validate(&remote, "127.0.0.1", 3000);

    assert_eq!(report.checks.len(), 4);
    assert_eq!(report.checks[0].name, "docker service");
    assert!(report.checks[0].passed);
    assert_eq!(report.checks[1].name, "application container");
    assert!(!report.checks[1].passed);
    assert!(!report.checks[1].warning);
    assert_eq!(report.checks[2].name, "nginx service");
    assert!(report.checks[2].passed);
    assert_eq!(report.checks[3].name, "http endpoint");
    assert!(!report.healthy());
}

#[test]
fn all_remote_checks_pass() {
    let remote = FakeRemote::new()
        .respond("systemctl is-active docker", "active")
        .respond("systemctl is-active nginx", "active")
        .respond("docker ps", "app\tUp 12 seconds\t0.0.0.0:3000->3000/tcp");

    let report = validator().validate(&remote, "127.0.0.1", 3000);

    assert!(report.checks[0].passed);
    assert!(report.checks[1].passed);
    assert_eq!(
        report.checks[1].detail.as_deref(),
        Some("app\tUp 12 seconds\t0.0.0.0:3000->3000/tcp")
    );
    assert!(report.checks[2].passed);
}

#[test]
fn inactive_service_is_a_hard_failure() {
    let remote = FakeRemote::new()
        .respond("systemctl is-active docker", "inactive")
        .respond("systemctl is-active nginx", "active")
        .respond("docker ps", "app\tUp\t80/tcp");

    let report = validator().validate(&remote, "127.0.0.1", 3000);

    assert!(!report.checks[0].passed);
    assert!(!report.checks[0].warning);
    assert_eq!(report.checks[0].detail.as_deref(), Some("docker is inactive"));
    assert!(!report.healthy());
}

#[test]
fn service_checks_tolerate_the_is_active_exit_code() {
    // `systemctl is-active` exits non-zero for anything but
    // `active` while printing the state to stdout. The check must
    // swallow the exit code so the state reaches the report
    // instead of a generic execution failure.
    let remote = FakeRemote::new()
        .respond("systemctl is-active docker", "failed")
        .respond("systemctl is-active nginx", "active")
        .respond("docker ps", "app\tUp\t80/tcp");

    let report = validator().validate(&remote, "127.0.0.1", 3000);

    assert!(remote.ran("systemctl is-active docker || true"));
    assert!(remote.ran("systemctl is-active nginx || true"));
    assert_eq!(report.checks[0].detail.as_deref(), Some("docker is failed"));
}

#[test]
fn unreachable_http_is_only_a_warning() {
    let remote = FakeRemote::new()
        .respond("systemctl is-active docker", "active")
        .respond("systemctl is-active nginx", "active")
        .respond("docker ps", "app\tUp\t80/tcp");

    // Validation probes port 80 on the configured host; an
    // unroutable TEST-NET address never answers.
    let report = validator().validate(&remote, "203.0.113.254", 3000);

    let http = &report.checks[3];
    if !http.passed {
        assert!(http.warning);
        assert!(report.healthy());
    }
}
