use std::fs;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use tempfile::NamedTempFile;

use instance_health_exporter::config::{Environment, InstanceKind};
use instance_health_exporter::identity::InstanceIdentity;
use instance_health_exporter::metrics::StateGauges;
use instance_health_exporter::poller::Poller;
use instance_health_exporter::sentinel::SentinelFile;
use instance_health_exporter::server;
use instance_health_exporter::service::ServiceCheck;

// The recorder is process-global, so it is installed exactly once and the
// scrape assertions live in a single test to avoid cross-talk.
fn recorder_handle() -> &'static PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE.get_or_init(server::setup_metrics_recorder)
}

fn series_value(rendered: &str, family: &str, state: &str) -> Option<f64> {
    let state_label = format!("{family}=\"{state}\"");
    let line = rendered
        .lines()
        .find(|l| l.starts_with(family) && l.contains(&state_label))?;
    line.rsplit(' ').next()?.parse().ok()
}

#[tokio::test]
async fn poll_cycle_results_are_scrapable() {
    let handle = recorder_handle().clone();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"ok\nFAILED SELF-PROVISIONING\nok2\n")
        .unwrap();

    let identity = InstanceIdentity {
        pub_ip: "203.0.113.7".to_owned(),
        instance_id: "i-0abc123def456".to_owned(),
        env: Environment::Prodp3,
        kind: InstanceKind::Api,
        service_name: "leonardo_django".to_owned(),
    };

    let poller = Poller::new(
        // No such unit exists here, so the liveness query deterministically
        // maps to unhealthy whether or not systemd is present.
        ServiceCheck::new(identity.service_name.clone()),
        SentinelFile::new(file.path().to_path_buf()),
        StateGauges::new(&identity),
        Duration::from_secs(30),
    );

    poller.run_once().await.unwrap();

    // The marker line was consumed, everything else kept in order.
    assert_eq!(fs::read(file.path()).unwrap(), b"ok\nok2\n");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::app(handle)).await.unwrap();
    });

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(series_value(&body, "provisioner_health", "unhealthy"), Some(1.0));
    assert_eq!(series_value(&body, "provisioner_health", "healthy"), Some(0.0));
    assert_eq!(series_value(&body, "proc_status_api", "unhealthy"), Some(1.0));
    assert_eq!(series_value(&body, "proc_status_api", "healthy"), Some(0.0));

    let unhealthy_line = body
        .lines()
        .find(|l| l.starts_with("provisioner_health") && l.contains("provisioner_health=\"unhealthy\""))
        .unwrap();
    assert!(unhealthy_line.contains("instance_id=\"i-0abc123def456\""));
    assert!(unhealthy_line.contains("pub_ip=\"203.0.113.7\""));
    assert!(unhealthy_line.contains("env=\"prodp3\""));
    assert!(unhealthy_line.contains("type=\"api\""));

    // Next cycle over the now-clean file flips the provisioner signal.
    poller.run_once().await.unwrap();
    assert_eq!(fs::read(file.path()).unwrap(), b"ok\nok2\n");

    let body = reqwest::get(format!("http://{addr}/any/old/path"))
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(series_value(&body, "provisioner_health", "healthy"), Some(1.0));
    assert_eq!(series_value(&body, "provisioner_health", "unhealthy"), Some(0.0));
}

#[test]
fn missing_flags_exit_nonzero_with_usage() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_instance-health-exporter"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--file"), "usage missing from: {stderr}");
}
