//! Public address discovery for cloud instances

use tracing::debug;

use crate::config::{GcpInstance, GcpProfile};
use crate::utils::{CommandRunner, CommandSpec, ConfigError, ManagerError};

/// Resolves instance NAT addresses through `gcloud`
pub struct HostResolver<'a> {
    runner: &'a dyn CommandRunner,
    profile: &'a GcpProfile,
}

impl<'a> HostResolver<'a> {
    pub fn new(runner: &'a dyn CommandRunner, profile: &'a GcpProfile) -> Self {
        Self { runner, profile }
    }

    fn describe(&self, instance: &GcpInstance) -> CommandSpec {
        CommandSpec::new("gcloud").args([
            "compute",
            "instances",
            "describe",
            instance.name.as_str(),
            "--zone",
            instance.zone.as_str(),
            "--project",
            self.profile.project_id.as_str(),
            "--format=get(networkInterfaces[0].accessConfigs[0].natIP)",
        ])
    }

    /// Public IP of the first network interface
    pub fn public_host(&self, instance: &GcpInstance) -> Result<String, ManagerError> {
        let output = self.runner.output(&self.describe(instance))?;
        let host = output.lines().map(str::trim).find(|l| !l.is_empty());
        match host {
            Some(host) => {
                debug!("{} @ {}", instance.name, host);
                Ok(host.to_string())
            }
            None => Err(ConfigError::NoAddress(instance.name.clone()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command::fake::FakeRunner;

    fn profile() -> GcpProfile {
        GcpProfile {
            project_id: "dsb-project".to_string(),
            username: "bench".to_string(),
        }
    }

    fn instance() -> GcpInstance {
        GcpInstance::new("weaver-dsb-db-eu", "europe-west3-a")
    }

    #[test]
    fn test_public_host() {
        let runner = FakeRunner::new();
        runner.stdout("weaver-dsb-db-eu", "34.89.10.2\n");
        let profile = profile();
        let resolver = HostResolver::new(&runner, &profile);
        assert_eq!(resolver.public_host(&instance()).unwrap(), "34.89.10.2");
        assert!(runner.call_lines()[0].contains("--project dsb-project"));
    }

    #[test]
    fn test_missing_address() {
        let runner = FakeRunner::new();
        runner.stdout("weaver-dsb-db-eu", "\n");
        let profile = profile();
        let resolver = HostResolver::new(&runner, &profile);
        assert!(matches!(
            resolver.public_host(&instance()),
            Err(ManagerError::Config(ConfigError::NoAddress(_)))
        ));
    }
}
