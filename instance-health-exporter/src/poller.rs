use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::metrics::{HealthState, StateGauges};
use crate::sentinel::{SentinelFile, FAILURE_MARKER};
use crate::service::ServiceCheck;

/// Runs both checkers on a fixed interval and feeds their results into the
/// exported gauges. The interval is a plain sleep between cycle starts, so
/// the effective period is the interval plus cycle execution time.
pub struct Poller {
    service: ServiceCheck,
    sentinel: SentinelFile,
    gauges: StateGauges,
    interval: Duration,
}

impl Poller {
    pub fn new(
        service: ServiceCheck,
        sentinel: SentinelFile,
        gauges: StateGauges,
        interval: Duration,
    ) -> Self {
        Self {
            service,
            sentinel,
            gauges,
            interval,
        }
    }

    pub async fn run(self) {
        loop {
            if let Err(e) = self.run_once().await {
                // An unreadable sentinel file aborts the cycle without
                // touching the provisioner gauge; the next cycle retries.
                error!("poll cycle failed: {:#}", e);
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One poll cycle: process check first, then the sentinel scan. The
    /// process check always runs, even when the scan is about to fail. The
    /// unhealthy state is recorded before the rewrite is attempted, so a
    /// crash between the two still leaves the detection visible; the rewrite
    /// is best-effort cleanup and never invalidates the reported state.
    pub async fn run_once(&self) -> Result<()> {
        let process_state = self.service.is_active().await;
        match process_state {
            HealthState::Healthy => info!("Service {} is running", self.service.unit()),
            HealthState::Unhealthy => info!("Service {} is down", self.service.unit()),
        }
        self.gauges.set_process(process_state);

        let found = self.sentinel.scan()?;
        if found {
            info!(
                "Found string in file {}: {}",
                self.sentinel.path().display(),
                FAILURE_MARKER
            );
            self.gauges.set_provisioner(HealthState::Unhealthy);
            info!("Removing line in file: {}", self.sentinel.path().display());
            if let Err(e) = self.sentinel.remove_markers() {
                warn!("failed to remove marker lines: {:#}", e);
            }
        } else {
            info!("No string in file {}", self.sentinel.path().display());
            self.gauges.set_provisioner(HealthState::Healthy);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::OnceLock;

    use metrics_exporter_prometheus::PrometheusHandle;

    use crate::config::{Environment, InstanceKind};
    use crate::identity::InstanceIdentity;
    use crate::server;

    use super::*;

    // These tests go through the installed recorder, which is process-global,
    // so it is set up once and each test uses its own instance id.
    fn recorder_handle() -> &'static PrometheusHandle {
        static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
        HANDLE.get_or_init(server::setup_metrics_recorder)
    }

    fn test_identity(instance_id: &str) -> InstanceIdentity {
        InstanceIdentity {
            pub_ip: "203.0.113.7".to_owned(),
            instance_id: instance_id.to_owned(),
            env: Environment::Beta,
            kind: InstanceKind::Celery,
            service_name: "celery-worker-leonardo".to_owned(),
        }
    }

    #[tokio::test]
    async fn unreadable_file_skips_cycle_after_recording_process_state() {
        let handle = recorder_handle();
        let identity = test_identity("i-unreadable-file");

        let poller = Poller::new(
            ServiceCheck::new(identity.service_name.clone()),
            SentinelFile::new(PathBuf::from("/nonexistent/provision.log")),
            StateGauges::new(&identity),
            Duration::from_secs(30),
        );

        assert!(poller.run_once().await.is_err());

        let rendered = handle.render();

        // The process check ran before the scan failed, so its state is
        // visible for this cycle.
        assert!(rendered
            .lines()
            .any(|l| l.starts_with("proc_status_celery")
                && l.contains("instance_id=\"i-unreadable-file\"")));

        // No provisioner state was fabricated for the aborted cycle.
        assert!(rendered
            .lines()
            .filter(|l| l.starts_with("provisioner_health"))
            .all(|l| !l.contains("instance_id=\"i-unreadable-file\"")));
    }
}
