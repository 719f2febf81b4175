/*!
Errors that can happen during the application's runtime
*/

use std::{
    backtrace::Backtrace,
    fmt::{Display, Formatter, Result},
    io::Error as IoError,
    path::PathBuf,
};

use java_stream::error::stream::StreamError;

/// Errors that can happen during the application's runtime
#[derive(Debug)]
pub enum RuntimeError {
    InvalidOptions(String),
    FileError(IoError, PathBuf, Backtrace),
    StreamError(StreamError, Backtrace),
    OutputError(IoError),
    MissingContent(usize, usize),
    WrongContent(usize, &'static str, &'static str),
}

impl RuntimeError {
    /// The call stack captured when reading or decoding the stream failed
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            RuntimeError::FileError(_, _, backtrace) | RuntimeError::StreamError(_, backtrace) => {
                Some(backtrace)
            }
            _ => None,
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            RuntimeError::InvalidOptions(why) => write!(fmt, "{why}"),
            RuntimeError::FileError(why, path, _) => write!(fmt, "{why}: {path:?}"),
            RuntimeError::StreamError(why, _) => write!(fmt, "{why}"),
            RuntimeError::OutputError(why) => write!(fmt, "{why}"),
            RuntimeError::MissingContent(idx, len) => {
                write!(fmt, "No content at index {idx}, the stream has {len} contents")
            }
            RuntimeError::WrongContent(idx, expected, found) => {
                write!(fmt, "Content {idx} is a {found}, not a {expected}")
            }
        }
    }
}
