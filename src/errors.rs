use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for corpus configuration, block parsing and batch arguments.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{}:{line}: expected an integer, found '{content}'", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        content: String,
    },
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid batch arguments: {0}")]
    Argument(String),
}

impl StreamError {
    /// Re-labels a parse or read failure as a configuration failure, keeping its message.
    pub(crate) fn into_config(self) -> StreamError {
        match self {
            StreamError::Config(_) => self,
            other => StreamError::Config(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
