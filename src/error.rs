//! Error taxonomy for the extprot codec.

use std::fmt;

use crate::wire::WireType;

/// Errors raised while reading, writing, or skipping extprot values.
#[derive(Debug)]
pub enum Error {
    /// No more values remain at the top level (a clean boundary between values).
    Eof,
    /// The stream ended in the middle of a value.
    UnexpectedEof,
    /// The prefix named a wire type the descriptor does not accept here,
    /// or a sum constructor tag the descriptor does not recognize.
    UnexpectedWireType {
        /// Wire type actually present on the wire.
        found: WireType,
        /// Tag actually present on the wire.
        tag: u64,
    },
    /// Well-formed bytes, semantically invalid for the descriptor in play.
    ParseError(String),
    /// `default_value()` was requested for a descriptor with no default.
    UndefinedDefault,
    /// Underlying I/O failure from a sink/source stream.
    Io(std::io::Error),
}

/// Specialized `Result` for extprot operations.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Eof => write!(f, "no more values"),
            Error::UnexpectedEof => write!(f, "unexpected end of stream"),
            Error::UnexpectedWireType { found, tag } => {
                write!(f, "unexpected wire type {found:?} with tag {tag}")
            }
            Error::ParseError(msg) => write!(f, "parse error: {msg}"),
            Error::UndefinedDefault => write!(f, "no default value defined"),
            Error::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
