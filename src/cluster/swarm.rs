//! Docker swarm status on the datastore manager

use super::readiness::{ReadinessDimension, ReadinessGate};
use crate::config::{GcpInstance, ManagerConfig};
use crate::utils::CommandSpec;

/// State token of a joined node in `docker node ls`
pub const NODE_READY_TOKEN: &str = "Ready";
/// Replica column of a fully replicated single-replica service in `docker service ls`
pub const SERVICE_READY_TOKEN: &str = "1/1";

/// Run a command on an instance over `gcloud compute ssh`
pub fn remote(instance: &GcpInstance, command: &str) -> CommandSpec {
    CommandSpec::new("gcloud").args([
        "compute",
        "ssh",
        instance.name.as_str(),
        "--zone",
        instance.zone.as_str(),
        "--command",
        command,
    ])
}

pub fn node_ls(manager: &GcpInstance) -> CommandSpec {
    remote(manager, "sudo docker node ls")
}

pub fn service_ls(manager: &GcpInstance) -> CommandSpec {
    remote(manager, "sudo docker service ls")
}

/// All swarm machines have joined
pub fn nodes_gate(config: &ManagerConfig) -> ReadinessGate {
    ReadinessGate {
        dimension: ReadinessDimension::SwarmNodes,
        target: config.swarm_nodes,
        status: node_ls(&config.gcp_layout.db_manager),
        filter: NODE_READY_TOKEN.to_string(),
    }
}

/// All datastore services run at full replica count
pub fn services_gate(config: &ManagerConfig) -> ReadinessGate {
    ReadinessGate {
        dimension: ReadinessDimension::SwarmServices,
        target: config.swarm_services,
        status: service_ls(&config.gcp_layout.db_manager),
        filter: SERVICE_READY_TOKEN.to_string(),
    }
}
