//! Shared configuration, logging and configuration errors for the PayGate
//! deployment toolchain.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    ContractSettings, DeployConfig, DeployOptions, ExplorerConfig, IndexingPolicy, NETWORKS,
    NetworkConfig, NetworkSpec, RunSettings, network_spec, validate_url,
};
pub use error::ConfigError;
