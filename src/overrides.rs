//! Administrator supplied names.
//!
//! An override table is a plain text file with one `<identifier> <name>` entry per line. Runs
//! of whitespace separate the fields, the identifier must match exactly and any other line is
//! ignored.
use std::path::Path;

use crate::fsutil::{self, FileOpenError, ReadLineError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] FileOpenError),
    #[error(transparent)]
    ReadLine(#[from] ReadLineError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Looks up `identifier` in `sources`, in order, and returns the first non-empty name.
///
/// Missing sources are skipped silently, unreadable ones with a warning.
pub fn lookup<P: AsRef<Path>>(identifier: &str, sources: &[P]) -> Option<String> {
    for source in sources {
        let source = source.as_ref();
        match lookup_in_file(identifier, source) {
            Ok(Some(name)) => {
                log::info!(
                    "cgroup `{}` is named `{}` by `{}`",
                    identifier,
                    name,
                    source.display()
                );
                return Some(name);
            }
            Ok(None) => {}
            Err(Error::FileOpen(err)) if err.is_not_found() => {
                log::debug!("override table `{}` does not exist", source.display())
            }
            Err(err) => log::warn!("skipping override table: {err}"),
        }
    }

    None
}

/// Searches a single override table.
///
/// # Errors
///
/// Returns [`Error::FileOpen`] if the table cannot be opened and [`Error::ReadLine`] if reading
/// it fails midway.
pub fn lookup_in_file(identifier: &str, path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    let reader = fsutil::open_file_reader(path)?;
    let name = fsutil::find_line(reader, path, |line| parse_entry(line, identifier))?;

    Ok(name)
}

fn parse_entry(line: &str, identifier: &str) -> Option<String> {
    let mut fields = line.split_whitespace();
    if fields.next()? != identifier {
        return None;
    }
    fields.next().map(str::to_owned)
}
