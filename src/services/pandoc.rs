//! Runs the external document converter.
//!
//! The converter is invoked with a fixed argument set and raced against a
//! wall-clock deadline. It runs in its own process group; once it exits or the
//! deadline expires the whole group is killed, so neither the converter nor
//! anything it started (e.g. the PDF engine) outlives the request.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::{io::AsyncReadExt, process::Command, task::JoinHandle};

use crate::config::Config;

/// Input format: Markdown with raw TeX passed straight through to the engine.
const INPUT_FORMAT: &str = "markdown+raw_tex";

/// How much of the converter's stderr is kept for the error message.
const STDERR_TAIL_BYTES: usize = 2000;

/// How long stderr may keep draining after the converter has exited.
const STDERR_GRACE: Duration = Duration::from_millis(500);

/// Failure modes of a single converter run.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{status}{}", detail_suffix(.stderr))]
    Failed { status: ExitStatus, stderr: String },

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("waiting for converter: {0}")]
    Wait(#[source] std::io::Error),
}

fn detail_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Converter invocation settings, fixed at startup and shared by all requests.
#[derive(Debug, Clone)]
pub struct Converter {
    program: PathBuf,
    pdf_engine: String,
    timeout: Duration,
}

impl Converter {
    pub fn new(
        program: impl Into<PathBuf>,
        pdf_engine: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            pdf_engine: pdf_engine.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.pandoc_path,
            config.pdf_engine.clone(),
            config.pandoc_timeout(),
        )
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arguments for one conversion, in the order the converter receives them.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "--verbose".into(),
            format!("--pdf-engine={}", self.pdf_engine).into(),
            "-f".into(),
            INPUT_FORMAT.into(),
            input.as_os_str().to_owned(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ]
    }

    /// Convert `input` into `output`, failing if the converter does not finish in time.
    ///
    /// Only the converter's own exit is raced against the deadline. Helpers it
    /// leaves running are killed with the rest of its process group and do not
    /// turn a finished conversion into a timeout.
    ///
    /// # Errors
    ///
    /// - `Spawn` if the executable cannot be started
    /// - `Failed` if it exits non-zero (carries the tail of its stderr)
    /// - `TimedOut` if the deadline expires; the group has been killed and the
    ///   child reaped by then
    pub async fn run(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| ConvertError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        // Covers the request future being dropped mid-conversion.
        let mut group = ProcessGroup::new(child.id());

        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                // Stderr is only diagnostic; a broken pipe must not mask the exit status.
                let _ = pipe.read_to_end(&mut buf).await;
                buf
            })
        });

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        match waited {
            Ok(Ok(status)) => {
                group.kill();
                let stderr = collect_stderr(stderr).await;
                if status.success() {
                    Ok(())
                } else {
                    Err(ConvertError::Failed {
                        status,
                        stderr: stderr_tail(&stderr),
                    })
                }
            }
            Ok(Err(err)) => {
                group.kill();
                abort_stderr(stderr);
                Err(ConvertError::Wait(err))
            }
            Err(_) => {
                tracing::warn!(
                    program = %self.program.display(),
                    timeout = ?self.timeout,
                    "converter timed out, killing its process group"
                );
                group.kill();
                if let Err(err) = child.kill().await {
                    tracing::error!(error = %err, "failed to kill converter");
                }
                abort_stderr(stderr);
                Err(ConvertError::TimedOut(self.timeout))
            }
        }
    }
}

/// The converter's process group; killed at most once, at the latest on drop.
struct ProcessGroup(Option<u32>);

impl ProcessGroup {
    fn new(leader: Option<u32>) -> Self {
        Self(leader)
    }

    #[cfg(unix)]
    fn kill(&mut self) {
        use nix::{
            errno::Errno,
            sys::signal::{Signal, killpg},
            unistd::Pid,
        };

        let Some(pgid) = self.0.take().and_then(|id| i32::try_from(id).ok()) else {
            return;
        };
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            // ESRCH: every member has already exited.
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(err) => {
                tracing::warn!(pgid, error = %err, "failed to kill converter process group");
            }
        }
    }

    #[cfg(not(unix))]
    fn kill(&mut self) {
        self.0 = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Wait briefly for the stderr reader once the converter has exited.
async fn collect_stderr(task: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    let Some(mut task) = task else {
        return Vec::new();
    };
    match tokio::time::timeout(STDERR_GRACE, &mut task).await {
        Ok(Ok(stderr)) => stderr,
        Ok(Err(_)) => Vec::new(),
        Err(_) => {
            task.abort();
            Vec::new()
        }
    }
}

fn abort_stderr(task: Option<JoinHandle<Vec<u8>>>) {
    if let Some(task) = task {
        task.abort();
    }
}

/// Last few lines of the converter's stderr, lossily decoded.
fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_follow_fixed_order() {
        let converter = Converter::new("pandoc", "lualatex", Duration::from_secs(10));
        let args = converter.args(Path::new("/tmp/in1.md"), Path::new("/tmp/out1.pdf"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "--verbose",
                "--pdf-engine=lualatex",
                "-f",
                "markdown+raw_tex",
                "/tmp/in1.md",
                "-o",
                "/tmp/out1.pdf",
            ]
        );
    }

    #[test]
    fn stderr_tail_keeps_the_end() {
        let mut noise = vec![b'x'; STDERR_TAIL_BYTES + 10];
        noise.extend_from_slice(b"Error producing PDF.\n");
        let tail = stderr_tail(&noise);
        assert!(tail.ends_with("Error producing PDF."));
        assert!(tail.len() <= STDERR_TAIL_BYTES);
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let converter = Converter::new(
            "/definitely/not/a/converter",
            "lualatex",
            Duration::from_secs(1),
        );
        let err = converter
            .run(Path::new("in.md"), Path::new("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failure_without_stderr_has_no_dangling_separator() {
        use std::os::unix::process::ExitStatusExt;

        let failed = |stderr: &str| ConvertError::Failed {
            status: ExitStatus::from_raw(43 << 8),
            stderr: stderr.to_string(),
        };
        assert_eq!(failed("").to_string(), "exit status: 43");
        assert_eq!(
            failed("Error producing PDF.").to_string(),
            "exit status: 43: Error producing PDF."
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_distinct_from_timeout() {
        // `false` ignores its arguments and exits 1.
        let converter = Converter::new("false", "lualatex", Duration::from_secs(5));
        let err = converter
            .run(Path::new("in.md"), Path::new("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Failed { .. }));
    }
}
