use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for slicer operations
#[derive(Error, Diagnostic, Debug)]
pub enum SlicerError {
    #[error("IO error: {0}")]
    #[diagnostic(code(slicer::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(slicer::io))]
    Io { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(slicer::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Archive {path} is busy")]
    #[diagnostic(
        code(slicer::archive_busy),
        help("Close any other tool that has the archive open and run again")
    )]
    ArchiveBusy { path: PathBuf },

    #[error("{tool} exited with {}", exit_code_label(.code))]
    #[diagnostic(code(slicer::tool))]
    Tool {
        tool: String,
        code: Option<i32>,
        output: String,
    },

    #[error("{tool} did not finish within {timeout:?} and was killed")]
    #[diagnostic(code(slicer::tool_timeout))]
    ToolTimeout { tool: String, timeout: Duration },

    #[error("Parse error: {message}")]
    #[diagnostic(code(slicer::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Image error with {path}: {message}")]
    #[diagnostic(code(slicer::image))]
    Image { path: PathBuf, message: String },

    #[error("Expected output {path} was not produced")]
    #[diagnostic(code(slicer::missing))]
    Missing { path: PathBuf },
}

impl SlicerError {
    /// Whether the caller may succeed by simply trying the same item again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SlicerError::ArchiveBusy { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        SlicerError::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, SlicerError>;
