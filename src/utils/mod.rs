//! Utility modules

pub mod command;
pub mod error;
pub mod progress;

pub use command::{CommandRunner, CommandSpec, DryRunRunner, SystemRunner};
pub use error::{
    CommandError, ConfigError, ManagerError, MetricsError, ReadinessError, Result, TemplateError,
};
pub use progress::{countdown, ProgressTicker};
