use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A device, attribute or stream could not be located or written.
    #[error("could not configure {what}: {reason}")]
    Config { what: &'static str, reason: String },

    /// The streaming channel refused a buffer.
    #[error("buffer push failed: {0}")]
    Push(String),

    #[error("source I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("buffer of {capacity} symbols cannot hold the {header} symbol frame header")]
    FrameTooSmall { capacity: usize, header: usize },
}

impl Error {
    pub(crate) fn config(what: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Config {
            what,
            reason: err.to_string(),
        }
    }
}
