//! Error types for the converter.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`ConvertError`].
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Fatal errors that stop a conversion run.
///
/// Malformed input lines are not errors at this level; they are reported and
/// skipped by the converter.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The input file could not be opened.
    #[error("Error opening file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from the input stream failed.
    #[error("Error reading input after line {line}: {source}")]
    Read {
        line: u64,
        #[source]
        source: io::Error,
    },

    /// Writing converted output failed.
    #[error("Error writing output: {0}")]
    Write(#[source] io::Error),
}

impl ConvertError {
    /// Whether the output side went away (e.g. piped into `head`).
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Write(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}
