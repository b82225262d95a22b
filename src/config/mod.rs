//! Configuration module

pub mod cli;
pub mod gcp_profile;
pub mod manager_config;

pub use cli::{CliArgs, Command, MetricsArgs, Target, WorkloadArgs};
pub use gcp_profile::{GcpInstance, GcpLayout, GcpProfile};
pub use manager_config::ManagerConfig;
