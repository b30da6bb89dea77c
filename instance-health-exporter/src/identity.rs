use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::{Config, Environment, InstanceKind};

pub const IP_LOOKUP_URL: &str = "https://icanhazip.com";
pub const INSTANCE_ID_URL: &str = "http://169.254.169.254/latest/meta-data/instance-id";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Label values shared by every metric this exporter emits. Resolved once at
/// startup; an unreachable lookup endpoint is fatal, since every label
/// depends on it.
#[derive(Debug, Clone)]
pub struct InstanceIdentity {
    pub pub_ip: String,
    pub instance_id: String,
    pub env: Environment,
    pub kind: InstanceKind,
    pub service_name: String,
}

impl InstanceIdentity {
    pub async fn resolve(config: &Config) -> Result<Self> {
        Self::resolve_with_endpoints(config, IP_LOOKUP_URL, INSTANCE_ID_URL).await
    }

    pub async fn resolve_with_endpoints(
        config: &Config,
        ip_lookup_url: &str,
        instance_id_url: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .context("failed to build lookup client")?;

        let pub_ip = fetch_text(&client, ip_lookup_url)
            .await
            .context("failed to look up public ip")?
            .trim_end_matches('\n')
            .to_owned();

        let instance_id = fetch_text(&client, instance_id_url)
            .await
            .context("failed to look up instance id from the metadata endpoint")?;

        Ok(Self {
            pub_ip,
            instance_id,
            env: config.environment,
            kind: config.instance_type,
            service_name: config.service.clone(),
        })
    }
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(body)
}
