//! Cluster API client: configuration resolution and the blocking HTTP
//! adapter behind the object-store port.

mod config;
mod http;

pub use config::{ClusterConfig, ConfigError};
pub use http::KubeClient;
