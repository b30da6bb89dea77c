use metrics::{describe_gauge, gauge};

use crate::config::InstanceKind;
use crate::identity::InstanceIdentity;

// Metric constants
pub const PROVISIONER_HEALTH: &str = "provisioner_health";
pub const PROC_STATUS_CELERY: &str = "proc_status_celery";
pub const PROC_STATUS_API: &str = "proc_status_api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn as_label(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }

    const ALL: [HealthState; 2] = [HealthState::Healthy, HealthState::Unhealthy];
}

/// Metric family reporting process liveness for this instance kind.
pub fn proc_status_metric(kind: InstanceKind) -> &'static str {
    match kind {
        InstanceKind::Celery => PROC_STATUS_CELERY,
        InstanceKind::Api => PROC_STATUS_API,
    }
}

/// Register all metrics with descriptions
pub fn register_metrics(kind: InstanceKind) {
    describe_gauge!(
        PROVISIONER_HEALTH,
        "Find out if a local provision on auto-scaled instances fails"
    );
    match kind {
        InstanceKind::Celery => {
            describe_gauge!(PROC_STATUS_CELERY, "Find process status on Celery")
        }
        InstanceKind::Api => describe_gauge!(PROC_STATUS_API, "Find process status on API"),
    }
}

/// Write path of the registry: the fixed label set resolved at startup, plus
/// the name of the process-status family for this instance kind.
///
/// Each signal is exposed as a Prometheus state set: one series per state,
/// keyed by a label named after the family, with exactly one series at 1.
pub struct StateGauges {
    labels: Vec<(String, String)>,
    proc_metric: &'static str,
}

impl StateGauges {
    pub fn new(identity: &InstanceIdentity) -> Self {
        let labels = vec![
            ("instance_id".to_owned(), identity.instance_id.clone()),
            ("pub_ip".to_owned(), identity.pub_ip.clone()),
            ("env".to_owned(), identity.env.as_label().to_owned()),
            ("type".to_owned(), identity.kind.as_label().to_owned()),
        ];

        Self {
            labels,
            proc_metric: proc_status_metric(identity.kind),
        }
    }

    pub fn set_provisioner(&self, state: HealthState) {
        self.set_state_set(PROVISIONER_HEALTH, state);
    }

    pub fn set_process(&self, state: HealthState) {
        self.set_state_set(self.proc_metric, state);
    }

    fn set_state_set(&self, family: &'static str, active: HealthState) {
        for state in HealthState::ALL {
            let mut labels = self.labels.clone();
            labels.push((family.to_owned(), state.as_label().to_owned()));
            let value = if state == active { 1.0 } else { 0.0 };
            gauge!(family, &labels).set(value);
        }
    }
}
