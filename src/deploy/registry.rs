//! Command registry
//!
//! Every supported (target, command) pair is registered explicitly with its
//! handler. Pairs without a handler are rejected before anything runs.

use std::collections::HashMap;
use std::fmt;

use super::{gcp, local, Context};
use crate::config::{Command, Target};
use crate::utils::{ConfigError, Result};

/// Command without its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandTag {
    Configure,
    Deploy,
    Start,
    Stop,
    Restart,
    Clean,
    Info,
    StorageBuild,
    StorageDeploy,
    StorageRun,
    StorageInfo,
    StorageClean,
    InitSocialGraph,
    Wrk2,
    Metrics,
}

impl From<&Command> for CommandTag {
    fn from(command: &Command) -> Self {
        match command {
            Command::Configure => CommandTag::Configure,
            Command::Deploy => CommandTag::Deploy,
            Command::Start => CommandTag::Start,
            Command::Stop => CommandTag::Stop,
            Command::Restart => CommandTag::Restart,
            Command::Clean => CommandTag::Clean,
            Command::Info => CommandTag::Info,
            Command::StorageBuild => CommandTag::StorageBuild,
            Command::StorageDeploy => CommandTag::StorageDeploy,
            Command::StorageRun => CommandTag::StorageRun,
            Command::StorageInfo => CommandTag::StorageInfo,
            Command::StorageClean => CommandTag::StorageClean,
            Command::InitSocialGraph => CommandTag::InitSocialGraph,
            Command::Wrk2(_) => CommandTag::Wrk2,
            Command::Metrics(_) => CommandTag::Metrics,
        }
    }
}

impl CommandTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandTag::Configure => "configure",
            CommandTag::Deploy => "deploy",
            CommandTag::Start => "start",
            CommandTag::Stop => "stop",
            CommandTag::Restart => "restart",
            CommandTag::Clean => "clean",
            CommandTag::Info => "info",
            CommandTag::StorageBuild => "storage-build",
            CommandTag::StorageDeploy => "storage-deploy",
            CommandTag::StorageRun => "storage-run",
            CommandTag::StorageInfo => "storage-info",
            CommandTag::StorageClean => "storage-clean",
            CommandTag::InitSocialGraph => "init-social-graph",
            CommandTag::Wrk2 => "wrk2",
            CommandTag::Metrics => "metrics",
        }
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Handler = fn(&Context<'_>, &Command) -> Result<()>;

pub struct CommandRegistry {
    handlers: HashMap<(Target, CommandTag), Handler>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Every command the manager supports
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.register(Target::Gcp, CommandTag::Configure, gcp::configure);
        registry.register(Target::Gcp, CommandTag::Deploy, gcp::deploy);
        registry.register(Target::Gcp, CommandTag::Start, gcp::start);
        registry.register(Target::Gcp, CommandTag::Stop, gcp::stop);
        registry.register(Target::Gcp, CommandTag::Restart, gcp::restart);
        registry.register(Target::Gcp, CommandTag::Clean, gcp::clean);
        registry.register(Target::Gcp, CommandTag::Info, gcp::info);
        registry.register(Target::Gcp, CommandTag::InitSocialGraph, gcp::init_social_graph);
        registry.register(Target::Gcp, CommandTag::Wrk2, gcp::wrk2);
        registry.register(Target::Gcp, CommandTag::Metrics, gcp::metrics);

        registry.register(Target::Local, CommandTag::StorageBuild, local::storage_build);
        registry.register(Target::Local, CommandTag::StorageDeploy, local::nothing_to_do);
        registry.register(Target::Local, CommandTag::StorageRun, local::storage_run);
        registry.register(Target::Local, CommandTag::StorageInfo, local::nothing_to_do);
        registry.register(Target::Local, CommandTag::StorageClean, local::storage_clean);
        registry.register(Target::Local, CommandTag::InitSocialGraph, local::init_social_graph);
        registry.register(Target::Local, CommandTag::Wrk2, local::wrk2);
        registry.register(Target::Local, CommandTag::Metrics, local::metrics);

        registry
    }

    pub fn register(&mut self, target: Target, tag: CommandTag, handler: Handler) {
        self.handlers.insert((target, tag), handler);
    }

    pub fn resolve(
        &self,
        target: Target,
        tag: CommandTag,
    ) -> std::result::Result<Handler, ConfigError> {
        self.handlers
            .get(&(target, tag))
            .copied()
            .ok_or_else(|| ConfigError::Unsupported {
                command: tag.as_str().to_string(),
                target: target.as_str().to_string(),
            })
    }

    /// Commands available for a target, in declaration order
    pub fn commands_for(&self, target: Target) -> Vec<CommandTag> {
        let mut tags: Vec<CommandTag> = self
            .handlers
            .keys()
            .filter(|(t, _)| *t == target)
            .map(|(_, tag)| *tag)
            .collect();
        tags.sort();
        tags
    }

    /// Run the handler registered for the context's target
    pub fn dispatch(&self, ctx: &Context<'_>, command: &Command) -> Result<()> {
        let handler = self.resolve(ctx.config.target, CommandTag::from(command))?;
        handler(ctx, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::RecordingPacer;
    use crate::config::ManagerConfig;
    use crate::utils::command::fake::FakeRunner;
    use crate::utils::ManagerError;

    #[test]
    fn test_coverage() {
        let registry = CommandRegistry::standard();
        assert_eq!(registry.commands_for(Target::Gcp).len(), 10);
        assert_eq!(
            registry.commands_for(Target::Local),
            vec![
                CommandTag::StorageBuild,
                CommandTag::StorageDeploy,
                CommandTag::StorageRun,
                CommandTag::StorageInfo,
                CommandTag::StorageClean,
                CommandTag::InitSocialGraph,
                CommandTag::Wrk2,
                CommandTag::Metrics,
            ]
        );
    }

    #[test]
    fn test_unsupported_pair() {
        let registry = CommandRegistry::standard();
        let err = registry
            .resolve(Target::Local, CommandTag::Deploy)
            .unwrap_err();
        assert_eq!(err.to_string(), "command 'deploy' is not available for local");
        assert!(registry.resolve(Target::Gcp, CommandTag::StorageRun).is_err());
    }

    #[test]
    fn test_dispatch_runs_nothing_for_unsupported() {
        let config = ManagerConfig::for_tests();
        let runner = FakeRunner::new();
        let ctx = Context::with_pacer(&config, &runner, Box::new(RecordingPacer::default()));

        let err = CommandRegistry::standard()
            .dispatch(&ctx, &Command::StorageBuild)
            .unwrap_err();
        assert!(matches!(err, ManagerError::Config(ConfigError::Unsupported { .. })));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_dispatch_by_target() {
        let config = ManagerConfig::for_tests();
        let runner = FakeRunner::new();
        let ctx = Context::with_pacer(&config, &runner, Box::new(RecordingPacer::default()));

        CommandRegistry::standard().dispatch(&ctx, &Command::Stop).unwrap();
        assert_eq!(runner.calls().len(), 2);
        assert!(runner.call_lines()[0].contains("stop-datastores.yml"));
    }

    #[test]
    fn test_tag_names_match_cli() {
        let commands = [Command::Configure, Command::StorageClean, Command::InitSocialGraph];
        for command in &commands {
            assert_eq!(CommandTag::from(command).as_str(), command.name());
        }
    }
}
