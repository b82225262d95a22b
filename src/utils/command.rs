//! External process boundary
//!
//! Every tool the manager drives (terraform, ansible, docker, gcloud, wrk2,
//! weaver) is invoked through a [`CommandRunner`], so orchestration code never
//! touches `std::process` directly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use super::error::CommandError;

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Executes external commands
pub trait CommandRunner {
    /// Run to completion and capture stdout. Non-zero exit is an error.
    fn output(&self, spec: &CommandSpec) -> Result<String, CommandError>;

    /// Run in the foreground with inherited stdio. Non-zero exit is an error.
    fn run(&self, spec: &CommandSpec) -> Result<(), CommandError>;
}

/// Runs commands on the local system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        debug!("exec: {}", spec);
        let output = spec
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CommandError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: spec.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| CommandError::InvalidOutput {
            program: spec.program.clone(),
        })
    }

    fn run(&self, spec: &CommandSpec) -> Result<(), CommandError> {
        debug!("exec (fg): {}", spec);
        let status = spec
            .to_command()
            .status()
            .map_err(|source| CommandError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CommandError::Failed {
                command: spec.to_string(),
                status,
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

/// Logs commands instead of executing them
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn output(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        info!("[dry-run] {}", spec);
        Ok(String::new())
    }

    fn run(&self, spec: &CommandSpec) -> Result<(), CommandError> {
        info!("[dry-run] {}", spec);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted runner for unit tests

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::process::ExitStatus;

    use super::*;

    /// Canned response for one invocation
    pub enum Reply {
        Stdout(String),
        Fail,
    }

    /// Replays replies in order, keyed by the first argument that matches
    #[derive(Default)]
    pub struct FakeRunner {
        scripts: RefCell<Vec<(String, VecDeque<Reply>)>>,
        calls: RefCell<Vec<CommandSpec>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a reply for commands whose rendered line contains `needle`
        pub fn reply(&self, needle: &str, reply: Reply) {
            let mut scripts = self.scripts.borrow_mut();
            match scripts.iter_mut().find(|(n, _)| n == needle) {
                Some((_, queue)) => queue.push_back(reply),
                None => scripts.push((needle.to_string(), VecDeque::from([reply]))),
            }
        }

        pub fn stdout(&self, needle: &str, text: &str) {
            self.reply(needle, Reply::Stdout(text.to_string()));
        }

        pub fn fail(&self, needle: &str) {
            self.reply(needle, Reply::Fail);
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.borrow().clone()
        }

        pub fn call_lines(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.to_string()).collect()
        }

        fn next(&self, spec: &CommandSpec) -> Option<Reply> {
            let line = spec.to_string();
            let mut scripts = self.scripts.borrow_mut();
            let (_, queue) = scripts.iter_mut().find(|(n, _)| line.contains(n.as_str()))?;
            // The last reply for a needle is sticky
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().map(|r| match r {
                    Reply::Stdout(s) => Reply::Stdout(s.clone()),
                    Reply::Fail => Reply::Fail,
                })
            }
        }

        fn failure(spec: &CommandSpec) -> CommandError {
            CommandError::Failed {
                command: spec.to_string(),
                status: failed_status(),
                stderr: "scripted failure".to_string(),
            }
        }
    }

    #[cfg(unix)]
    fn failed_status() -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(1 << 8)
    }

    #[cfg(windows)]
    fn failed_status() -> ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(1)
    }

    impl CommandRunner for FakeRunner {
        fn output(&self, spec: &CommandSpec) -> Result<String, CommandError> {
            self.calls.borrow_mut().push(spec.clone());
            match self.next(spec) {
                Some(Reply::Stdout(s)) => Ok(s),
                Some(Reply::Fail) => Err(Self::failure(spec)),
                None => Ok(String::new()),
            }
        }

        fn run(&self, spec: &CommandSpec) -> Result<(), CommandError> {
            self.output(spec).map(|_| ())
        }
    }
}
