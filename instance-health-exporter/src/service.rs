use tokio::process::Command;
use tracing::warn;

use crate::metrics::HealthState;

const SYSTEMCTL: &str = "systemctl";

/// Asks the service manager whether a named unit is active.
///
/// Anything other than a clean "active" answer, including the unit not
/// existing or the query itself failing, maps to unhealthy. The operational
/// response is the same in every case, so the states are not distinguished.
pub struct ServiceCheck {
    unit: String,
    program: String,
}

impl ServiceCheck {
    pub fn new(unit: String) -> Self {
        Self {
            unit,
            program: SYSTEMCTL.to_owned(),
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub async fn is_active(&self) -> HealthState {
        let status = Command::new(&self.program)
            .args(["is-active", "--quiet", &self.unit])
            .status()
            .await;

        match status {
            Ok(status) if status.success() => HealthState::Healthy,
            Ok(_) => HealthState::Unhealthy,
            Err(e) => {
                warn!("failed to query status of unit {}: {}", self.unit, e);
                HealthState::Unhealthy
            }
        }
    }
}
