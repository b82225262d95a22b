//! Generated deployment files
//!
//! - Application config: datastore addresses patched into the TOML template
//! - Ansible inventory for the GCP machines
//! - Ansible extra vars for the current deployment

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::config::manager_config::{APP_PORT, APP_PORT_US};
use crate::config::Target;
use crate::utils::TemplateError;

/// Keys in the application config that hold a datastore host
pub const DATASTORE_ADDRESS_KEYS: [&str; 4] = [
    "mongodb_address",
    "redis_address",
    "rabbitmq_address",
    "memcached_address",
];

pub fn read_template(path: &Path) -> Result<String, TemplateError> {
    fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_output(path: &Path, content: &str) -> Result<(), TemplateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| TemplateError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| TemplateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Point every datastore address of every component at `host`
pub fn render_weaver_config(template: &str, host: &str) -> Result<String, TemplateError> {
    let mut doc: toml::Table = template.parse()?;

    for (_, section) in doc.iter_mut() {
        let Some(table) = section.as_table_mut() else {
            continue;
        };
        for key in DATASTORE_ADDRESS_KEYS {
            if let Some(value) = table.get_mut(key) {
                *value = toml::Value::String(host.to_string());
            }
        }
    }

    Ok(toml::to_string(&doc)?)
}

/// Public addresses of every GCP machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryHosts {
    pub db_manager: String,
    pub db_eu: String,
    pub db_us: String,
    pub app_wrk2: String,
    pub app_eu: String,
    pub app_us: String,
}

/// Ansible inventory grouping the machines by role
pub fn render_inventory(hosts: &InventoryHosts, user: &str) -> String {
    format!(
        "\
[swarm_manager]
weaver-dsb-db-manager ansible_host={db_manager} user={user}

[swarm_workers]
weaver-dsb-db-eu      ansible_host={db_eu} user={user}
weaver-dsb-db-us      ansible_host={db_us} user={user}

[app_wrk2]
weaver-dsb-app-wrk2   ansible_host={app_wrk2} user={user}

[app_services]
weaver-dsb-app-eu     ansible_host={app_eu} user={user} region=\"eu\" app_port=\"{port_eu}\"
weaver-dsb-app-us     ansible_host={app_us} user={user} region=\"us\" app_port=\"{port_us}\"
",
        db_manager = hosts.db_manager,
        db_eu = hosts.db_eu,
        db_us = hosts.db_us,
        app_wrk2 = hosts.app_wrk2,
        app_eu = hosts.app_eu,
        app_us = hosts.app_us,
        user = user,
        port_eu = APP_PORT,
        port_us = APP_PORT_US,
    )
}

/// Extra vars for the playbooks of the current deployment
pub fn render_ansible_vars(
    template: &str,
    base_dir: &Path,
    workload_timestamp: Option<&str>,
    deployment_type: Option<Target>,
) -> Result<String, TemplateError> {
    let mut doc: Value = serde_yaml::from_str(template)?;
    if doc.is_null() {
        doc = Value::Mapping(Mapping::new());
    }
    let map = doc.as_mapping_mut().ok_or(TemplateError::NotAMapping)?;

    map.insert(
        "base_dir".into(),
        Value::String(base_dir.to_string_lossy().into_owned()),
    );
    map.insert(
        "workload_timestamp".into(),
        workload_timestamp.map_or(Value::Null, |ts| Value::String(ts.to_string())),
    );
    map.insert(
        "deployment_type".into(),
        deployment_type.map_or(Value::Null, |t| Value::String(t.as_str().to_string())),
    );

    Ok(serde_yaml::to_string(&doc)?)
}
