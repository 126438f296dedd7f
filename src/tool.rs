//! External tool invocation.
//!
//! The archive extractor and the texture converter are black boxes. They are
//! run to completion and judged by exit code and captured output.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, SlicerError};

/// How often a running child is polled when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exit status and captured output of one tool run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Stdout followed by stderr, lossily decoded.
    pub output: String,
}

impl ToolOutput {
    pub fn new(code: i32, output: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can be run with arguments to completion.
pub trait Tool {
    /// Display name used in logs and errors.
    fn name(&self) -> &str;

    /// Run to completion. An `Err` means the tool could not be run at all;
    /// a nonzero exit code is reported through [`ToolOutput::code`].
    fn run(&self, args: &[OsString]) -> Result<ToolOutput>;
}

/// An executable on disk.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: PathBuf,
    name: String,
    timeout: Option<Duration>,
}

impl ExternalTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self {
            program,
            name,
            timeout: None,
        }
    }

    /// Kill the tool if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Find a tool from a configured path.
    ///
    /// A directory is searched (non-recursively, case-insensitively) for
    /// `file_name`; a file is used as-is.
    pub fn locate(path: &Path, file_name: &str) -> Result<Self> {
        if path.is_file() {
            return Ok(Self::new(path));
        }

        if path.is_dir() {
            let entries = std::fs::read_dir(path)
                .map_err(|e| SlicerError::io(path, format!("Failed to list tool directory: {}", e)))?;

            for entry in entries.flatten() {
                if entry.file_name().to_string_lossy().eq_ignore_ascii_case(file_name) {
                    return Ok(Self::new(entry.path()));
                }
            }
        }

        Err(SlicerError::Config {
            message: format!("{} was not found at {}", file_name, path.display()),
            help: Some("Point tools.* in slicer.yaml at the executable or its directory".to_string()),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Tool for ExternalTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, args: &[OsString]) -> Result<ToolOutput> {
        tracing::debug!(tool = %self.name, ?args, "running external tool");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SlicerError::io(&self.program, format!("Failed to start {}: {}", self.name, e)))?;

        // Drain both pipes on their own threads so a chatty tool cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.timeout {
            None => child.wait()?,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::warn!(tool = %self.name, timeout_ms = timeout.as_millis() as u64, "tool timed out");
                        return Err(SlicerError::ToolTimeout {
                            tool: self.name.clone(),
                            timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let mut output = stdout.map(join_drain).unwrap_or_default();
        output.push_str(&stderr.map(join_drain).unwrap_or_default());

        Ok(ToolOutput {
            code: status.code(),
            output,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_drain(handle: thread::JoinHandle<Vec<u8>>) -> String {
    handle
        .join()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Turn an unsuccessful run into a [`SlicerError::Tool`].
pub fn check(tool: &dyn Tool, output: ToolOutput) -> Result<ToolOutput> {
    if output.success() {
        Ok(output)
    } else {
        Err(SlicerError::Tool {
            tool: tool.name().to_string(),
            code: output.code,
            output: output.output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_locate_in_directory_ignores_case() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("extractggpk.EXE"), b"").unwrap();

        let tool = ExternalTool::locate(dir.path(), "ExtractGGPK.exe").unwrap();
        assert_eq!(tool.name(), "extractggpk.EXE");
    }

    #[test]
    fn test_locate_file_directly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("texconv.exe");
        std::fs::write(&path, b"").unwrap();

        let tool = ExternalTool::locate(&path, "ignored").unwrap();
        assert_eq!(tool.program(), path.as_path());
    }

    #[test]
    fn test_locate_missing_is_config_error() {
        let dir = tempdir().unwrap();
        let err = ExternalTool::locate(dir.path(), "ExtractGGPK.exe").unwrap_err();
        assert!(matches!(err, SlicerError::Config { .. }));
    }

    #[test]
    fn test_check_maps_nonzero_exit() {
        let tool = ExternalTool::new("texconv.exe");
        assert!(check(&tool, ToolOutput::new(0, "ok")).is_ok());

        let err = check(&tool, ToolOutput::new(1, "boom")).unwrap_err();
        match err {
            SlicerError::Tool { code, output, .. } => {
                assert_eq!(code, Some(1));
                assert_eq!(output, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_output_and_code() {
        let tool = ExternalTool::new("sh");
        let out = tool
            .run(&["-c".into(), "echo hello; echo oops >&2; exit 3".into()])
            .unwrap();

        assert_eq!(out.code, Some(3));
        assert!(out.output.contains("hello"));
        assert!(out.output.contains("oops"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_times_out() {
        let tool = ExternalTool::new("sh").with_timeout(Some(Duration::from_millis(100)));
        let err = tool.run(&["-c".into(), "sleep 5".into()]).unwrap_err();
        assert!(matches!(err, SlicerError::ToolTimeout { .. }));
        assert!(err.to_string().contains("100ms"), "{}", err);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_within_timeout() {
        let tool = ExternalTool::new("sh").with_timeout(Some(Duration::from_secs(10)));
        let out = tool.run(&["-c".into(), "exit 0".into()]).unwrap();
        assert!(out.success());
    }
}
