//! Running external command line tools under a deadline.
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot find `{program}` in PATH")]
    NotFound { program: String },
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("`{command}` exited with {status}: {stderr}")]
    ExitStatus {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Locates `program` like a shell would.
///
/// Names containing a `/` are taken as paths; bare names are searched in `PATH`.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// A located executable that can be run with a bounded deadline.
#[derive(Debug, Clone)]
pub struct Tool {
    path: PathBuf,
    timeout: Duration,
}

impl Tool {
    /// Looks up `program` and binds it to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the executable is not available.
    pub fn locate(program: &str, timeout: Duration) -> Result<Self> {
        find_executable(program)
            .map(|path| Self { path, timeout })
            .ok_or_else(|| Error::NotFound {
                program: program.to_owned(),
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs the tool and returns its stdout.
    ///
    /// The child is killed if it outlives the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the process cannot be started or its output not read,
    /// [`Error::Timeout`] if the deadline expires and [`Error::ExitStatus`] if it exits
    /// unsuccessfully.
    pub async fn output<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = tokio::process::Command::new(&self.path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let rendered = render(&command);
        log::info!("Running command: {rendered}");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(output) => output.map_err(|source| Error::Spawn {
                command: rendered.clone(),
                source,
            })?,
            Err(_) => {
                return Err(Error::Timeout {
                    command: rendered,
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(Error::ExitStatus {
                command: rendered,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn render(command: &tokio::process::Command) -> String {
    let inner = command.as_std();
    std::iter::once(inner.get_program())
        .chain(inner.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
