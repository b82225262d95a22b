//! dsb-manager library
//!
//! Deployment and benchmarking manager for the multi-region social network
//! benchmark: provisions GCP machines or local datastores, gates on swarm
//! readiness, drives wrk2 and aggregates the application's runtime metrics.

pub mod cluster;
pub mod config;
pub mod deploy;
pub mod metrics;
pub mod utils;
pub mod workload;
