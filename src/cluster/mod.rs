//! Cluster status and discovery
//!
//! This module provides:
//! - Readiness gates with a bounded wait budget
//! - Docker swarm node/service status on the datastore manager
//! - Public address lookup for cloud instances

pub mod hosts;
pub mod readiness;
pub mod swarm;

pub use hosts::HostResolver;
pub use readiness::{
    count_matching, poll, CountdownPacer, Pacer, PollConfig, PollOutcome, PollState,
    ReadinessCheck, ReadinessDimension, ReadinessGate, ReadinessPoller,
};
