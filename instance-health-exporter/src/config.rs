use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Port the exposition endpoint listens on.
pub const EXPORTER_PORT: u16 = 9877;

/// Seconds slept between the end of one poll cycle and the start of the next.
pub const POLL_INTERVAL_SECS: u64 = 30;

pub const BIND_HOST: &str = "::";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "instance-health-exporter",
    about = "Check a file for a provisioning failure marker and a service unit for liveness, and expose both to Prometheus"
)]
pub struct Config {
    /// File to check for the failure marker
    #[arg(short, long)]
    pub file: PathBuf,

    /// Environment to add as a label on prometheus
    #[arg(short, long, value_enum)]
    pub environment: Environment,

    /// If the instance is "celery|api"
    #[arg(short = 't', long = "type", value_enum)]
    pub instance_type: InstanceKind,

    /// Service name to monitor
    #[arg(short, long, value_parser = ["celery-worker-leonardo", "leonardo_django"])]
    pub service: String,
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", BIND_HOST, EXPORTER_PORT)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Beta,
    // The CLI token is uppercase, and the exported label value follows it verbatim.
    #[value(name = "DEV")]
    Dev,
    Staging,
    Prodp3,
}

impl Environment {
    pub fn as_label(&self) -> &'static str {
        match self {
            Environment::Beta => "beta",
            Environment::Dev => "DEV",
            Environment::Staging => "staging",
            Environment::Prodp3 => "prodp3",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    Celery,
    Api,
}

impl InstanceKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            InstanceKind::Celery => "celery",
            InstanceKind::Api => "api",
        }
    }
}
