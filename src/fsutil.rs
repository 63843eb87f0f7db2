use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileOpenError {
    /// Returns `true` if the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

/// Error that occurs when reading a line from an opened file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to read line for file `{path}`: {source}")]
pub struct ReadLineError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use cgroup_name::fsutil;
/// let reader = fsutil::open_file_reader("/etc/cgroup-name/cgroups-names.conf")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Returns the first line of `reader` for which `matcher` yields a value.
///
/// Reading stops at the first match; `origin` is only used for error messages.
///
/// # Errors
///
/// Returns a [`ReadLineError`] if reading from `reader` fails.
pub fn find_line<R, T>(
    mut reader: R,
    origin: &Path,
    mut matcher: impl FnMut(&str) -> Option<T>,
) -> Result<Option<T>, ReadLineError>
where
    R: BufRead,
{
    let mut line = String::with_capacity(256);

    while reader
        .read_line(&mut line)
        .map_err(|source| ReadLineError {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        if let Some(found) = matcher(line.trim_end_matches(['\n', '\r'])) {
            return Ok(Some(found));
        }
        line.clear();
    }

    Ok(None)
}
