//! Unified error type for gifforge.
//!
//! Every crate in the workspace funnels its failures into [`Error`], which
//! carries enough context for the binary to pick a process exit status via
//! [`Error::exit_code`].

/// Unified error type covering all failure modes in gifforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Arguments, configuration or input file failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool could not be located on `PATH` or at its configured path.
    #[error("Tool not found [{tool}]: is it installed and in PATH?")]
    ToolNotFound {
        /// Name of the missing tool.
        tool: String,
    },

    /// An external tool (ffmpeg, ffprobe) failed to spawn or returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Probing the input failed in a way that makes it unusable.
    #[error("Probe error: {0}")]
    Probe(String),

    /// A pipeline stage failed; wraps the stage's own error.
    #[error("Stage [{stage}] failed: {source}")]
    Stage {
        /// Name of the stage that failed.
        stage: String,
        /// The error the stage produced.
        source: Box<Error>,
    },

    /// The pipeline could not be orchestrated.
    #[error("Pipeline error [{step}]: {message}")]
    Pipeline {
        /// The pipeline step that failed.
        step: String,
        /// Human-readable error description.
        message: String,
    },

    /// A cancellation request was honored before work started.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to the process exit status the CLI reports.
    ///
    /// `1` for bad input, `126` when an external tool could not do its job,
    /// `127` when a tool is missing altogether and `130` for cancellation.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Validation(_) => 1,
            Error::Probe(_) => 1,
            Error::Io { .. } => 126,
            Error::ToolNotFound { .. } => 127,
            Error::Tool { .. } => 126,
            Error::Stage { source, .. } => source.exit_code(),
            Error::Pipeline { .. } => 126,
            Error::Cancelled(_) => 130,
            Error::Internal(_) => 70,
        }
    }

    /// Whether this error, or the error a stage wrapped, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled(_) => true,
            Error::Stage { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::ToolNotFound`].
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Error::ToolNotFound { tool: tool.into() }
    }

    /// Convenience constructor for [`Error::Stage`].
    pub fn stage(stage: impl Into<String>, source: Error) -> Self {
        Error::Stage {
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// Convenience constructor for [`Error::Pipeline`].
    pub fn pipeline(step: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Pipeline {
            step: step.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
