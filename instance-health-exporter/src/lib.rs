pub mod config;
pub mod identity;
pub mod metrics;
pub mod poller;
pub mod sentinel;
pub mod server;
pub mod service;

pub use config::Config;
pub use identity::InstanceIdentity;
pub use poller::Poller;
