use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use instance_health_exporter::config::POLL_INTERVAL_SECS;
use instance_health_exporter::metrics::{register_metrics, StateGauges};
use instance_health_exporter::sentinel::SentinelFile;
use instance_health_exporter::server;
use instance_health_exporter::service::ServiceCheck;
use instance_health_exporter::{Config, InstanceIdentity, Poller};

#[tokio::main]
async fn main() {
    // Flag validation happens before any lookup: a missing flag prints usage
    // and exits non-zero without touching the network.
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let identity = InstanceIdentity::resolve(&config)
        .await
        .expect("failed to resolve instance identity");
    info!(
        "resolved identity: instance {} at {}",
        identity.instance_id, identity.pub_ip
    );

    let recorder_handle = server::setup_metrics_recorder();
    register_metrics(config.instance_type);

    let poller = Poller::new(
        ServiceCheck::new(identity.service_name.clone()),
        SentinelFile::new(config.file.clone()),
        StateGauges::new(&identity),
        Duration::from_secs(POLL_INTERVAL_SECS),
    );
    let poll_loop = tokio::spawn(poller.run());

    let bind = config.bind();
    info!("listening on {}", bind);
    let http_server = tokio::spawn(server::listen(server::app(recorder_handle), bind));

    tokio::select! {
        res = poll_loop => {
            error!("poll loop exited");
            if let Err(e) = res {
                error!("poll loop failed with: {}", e)
            }
        }
        res = http_server => {
            error!("http server exited");
            if let Err(e) = res {
                error!("http server failed with: {}", e)
            }
        }
    }
}
