//! Readiness gates
//!
//! A gate blocks the deployment until an external status listing reports
//! exactly the expected number of ready members. Each cycle waits, then
//! checks once:
//!
//! ```text
//! WAITING -> CHECKING -> SATISFIED
//!                     -> WAITING   (budget left)
//!                     -> FAILED    (budget exhausted)
//! ```
//!
//! The budget is accounted in whole seconds and shrinks by the length of
//! every wait, so a gate that never converges fails on the check that follows
//! the wait which brings the budget to zero.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::utils::{countdown, CommandError, CommandRunner, CommandSpec, ReadinessError};

/// What a gate counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessDimension {
    /// Machines joined to the swarm
    SwarmNodes,
    /// Swarm services at full replica count
    SwarmServices,
}

impl fmt::Display for ReadinessDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessDimension::SwarmNodes => f.write_str("swarm nodes"),
            ReadinessDimension::SwarmServices => f.write_str("swarm services"),
        }
    }
}

/// Result of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessCheck {
    pub dimension: ReadinessDimension,
    pub target: usize,
    pub actual: usize,
}

impl ReadinessCheck {
    /// Exact match only; more members than expected is not ready either
    pub fn passes(&self) -> bool {
        self.actual == self.target
    }
}

/// Count status lines containing `filter`
pub fn count_matching(output: &str, filter: &str) -> usize {
    output.lines().filter(|line| line.contains(filter)).count()
}

/// A status command plus the line filter and count it must reach
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    pub dimension: ReadinessDimension,
    pub target: usize,
    pub status: CommandSpec,
    pub filter: String,
}

impl ReadinessGate {
    /// Run the status command once and count matching lines
    pub fn check(&self, runner: &dyn CommandRunner) -> Result<ReadinessCheck, CommandError> {
        let output = runner.output(&self.status)?;
        Ok(ReadinessCheck {
            dimension: self.dimension,
            target: self.target,
            actual: count_matching(&output, &self.filter),
        })
    }
}

/// Poll state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Waiting { remaining_secs: u64 },
    Checking,
    Satisfied(ReadinessCheck),
    Failed(ReadinessCheck),
}

/// Budget and pacing for a poll sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Length of each wait, in seconds. Zero is treated as one.
    pub interval_secs: u64,
    /// Total wait budget, in seconds
    pub budget_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            budget_secs: 120,
        }
    }
}

/// Successful poll summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub check: ReadinessCheck,
    pub attempts: u32,
    pub waited_secs: u64,
}

/// Performs the waits of the orchestration: between readiness checks and
/// while freshly started machines settle
pub trait Pacer {
    fn wait(&mut self, secs: u64, message: &str);
}

/// Blocking countdown with a progress bar
#[derive(Debug, Default, Clone, Copy)]
pub struct CountdownPacer {
    pub hidden: bool,
}

impl Pacer for CountdownPacer {
    fn wait(&mut self, secs: u64, message: &str) {
        countdown(Duration::from_secs(secs), message, self.hidden);
    }
}

/// Drives readiness gates against a command runner
pub struct ReadinessPoller<'a> {
    runner: &'a dyn CommandRunner,
    config: PollConfig,
}

impl<'a> ReadinessPoller<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: PollConfig) -> Self {
        Self { runner, config }
    }

    /// Wait until the gate is satisfied or the budget runs out
    pub fn wait_for(
        &self,
        gate: &ReadinessGate,
        pacer: &mut dyn Pacer,
    ) -> Result<PollOutcome, ReadinessError> {
        info!(
            "waiting for {} {} (budget {}s)",
            gate.target, gate.dimension, self.config.budget_secs
        );
        let outcome = poll(gate.dimension, gate.target, &self.config, pacer, || {
            gate.check(self.runner).map(|c| c.actual)
        })?;
        info!(
            "{} ready: {}/{} after {} check(s)",
            gate.dimension, outcome.check.actual, outcome.check.target, outcome.attempts
        );
        Ok(outcome)
    }
}

/// Core poll loop over an arbitrary probe
pub fn poll<F>(
    dimension: ReadinessDimension,
    target: usize,
    config: &PollConfig,
    pacer: &mut dyn Pacer,
    mut probe: F,
) -> Result<PollOutcome, ReadinessError>
where
    F: FnMut() -> Result<usize, CommandError>,
{
    let interval = config.interval_secs.max(1);
    let mut remaining = config.budget_secs;
    let mut attempts = 0u32;
    let mut state = PollState::Waiting {
        remaining_secs: remaining,
    };

    loop {
        debug!("{}: {:?}", dimension, state);
        match state {
            PollState::Waiting { remaining_secs } => {
                let step = interval.min(remaining_secs);
                pacer.wait(
                    step,
                    &format!("waiting for {} ({}s budget left)", dimension, remaining_secs),
                );
                remaining = remaining_secs - step;
                state = PollState::Checking;
            }
            PollState::Checking => {
                attempts += 1;
                let actual = probe().map_err(|source| ReadinessError::Status { dimension, source })?;
                let check = ReadinessCheck {
                    dimension,
                    target,
                    actual,
                };

                state = if check.passes() {
                    PollState::Satisfied(check)
                } else if remaining == 0 {
                    PollState::Failed(check)
                } else {
                    info!(
                        "{}: {}/{} ready, retrying ({}s budget left)",
                        dimension, actual, target, remaining
                    );
                    PollState::Waiting {
                        remaining_secs: remaining,
                    }
                };
            }
            PollState::Satisfied(check) => {
                return Ok(PollOutcome {
                    check,
                    attempts,
                    waited_secs: config.budget_secs - remaining,
                });
            }
            PollState::Failed(check) => {
                return Err(ReadinessError::Timeout {
                    dimension,
                    expected: check.target,
                    actual: check.actual,
                    budget_secs: config.budget_secs,
                });
            }
        }
    }
}
