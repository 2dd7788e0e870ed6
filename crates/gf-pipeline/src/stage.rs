//! The [`Stage`] trait defines a single external-process step.
//!
//! A stage knows how to build its ffmpeg invocation from the shared
//! [`StageContext`]; running it is handled by [`runner::run_stage`] unless a
//! stage overrides [`Stage::run`].

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use gf_av::ToolCommand;

use crate::context::StageContext;
use crate::runner;

/// An executable plus its ordered argument list, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl StageCommand {
    /// Start a command for `program` with no arguments.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    /// Append arguments while building.
    pub fn args(mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Append `flag value` when `value` is present.
    pub fn opt(self, flag: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.args([flag.to_string(), v.into()]),
            None => self,
        }
    }

    /// The process builder that executes this command.
    pub fn to_tool_command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.args(self.args.iter().cloned());
        cmd
    }
}

impl fmt::Display for StageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a stage that completed without error.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: &'static str,
    pub command: StageCommand,
    /// `false` when the command was only previewed.
    pub executed: bool,
}

/// A single step in the conversion pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// A short, human-readable name for this stage (e.g. "extract").
    fn name(&self) -> &'static str;

    /// Build the command for this run. Must not touch the filesystem.
    fn build(&self, ctx: &StageContext) -> gf_core::Result<StageCommand>;

    /// Side effects the command needs in place before it is spawned.
    ///
    /// Skipped in dry-run mode. The default is a no-op.
    async fn prepare(&self, _ctx: &StageContext) -> gf_core::Result<()> {
        Ok(())
    }

    /// Whether this stage honors cancellation before spawning.
    fn cancellable(&self) -> bool {
        false
    }

    /// Relative weight of this stage for progress reporting.
    fn weight(&self) -> f32 {
        1.0
    }

    /// Build, prepare and execute the stage.
    async fn run(&self, ctx: &StageContext) -> gf_core::Result<StageReport> {
        runner::run_stage(self, ctx).await
    }
}
