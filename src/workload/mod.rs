//! Load generation

pub mod wrk2;

pub use wrk2::{run_workload, timestamp_now, wrk2_command, WorkloadParams, WorkloadRun};
