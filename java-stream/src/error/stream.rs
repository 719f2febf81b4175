/*!
 Errors that can happen when decoding a Java Object Serialization Stream.
*/

use std::{
    array::TryFromSliceError,
    fmt::{Display, Formatter, Result},
};

/// Errors that can happen when decoding a Java Object Serialization Stream
#[derive(Debug)]
pub enum StreamError {
    OutOfBounds(usize, usize),
    InvalidMagic(u16),
    UnsupportedVersion(u16),
    SliceError(TryFromSliceError),
    StringParseError(usize),
    InvalidTag(u8, usize),
    InvalidFieldType(u8, usize),
    InvalidHandle(u32),
    InvalidReference(u32, &'static str),
    InvalidArrayType(String),
    NegativeLength(i32, usize),
    UnsupportedExternalContents(String),
    MaxDepthExceeded(usize),
}

impl Display for StreamError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            StreamError::OutOfBounds(idx, len) => {
                write!(fmt, "Index {idx:x} is outside of range {len:x}!")
            }
            StreamError::InvalidMagic(magic) => {
                write!(fmt, "Invalid stream magic: 0x{magic:04x}")
            }
            StreamError::UnsupportedVersion(version) => {
                write!(fmt, "Unsupported stream version: {version}")
            }
            StreamError::SliceError(why) => {
                write!(fmt, "Unable to slice source stream: {why}")
            }
            StreamError::StringParseError(offset) => {
                write!(fmt, "Failed to parse modified UTF-8 string at {offset:x}")
            }
            StreamError::InvalidTag(tag, offset) => {
                write!(fmt, "Unexpected content tag 0x{tag:02x} at {offset:x}")
            }
            StreamError::InvalidFieldType(code, offset) => {
                write!(fmt, "Invalid field type code 0x{code:02x} at {offset:x}")
            }
            StreamError::InvalidHandle(handle) => {
                write!(fmt, "Reference to unknown handle 0x{handle:x}")
            }
            StreamError::InvalidReference(handle, expected) => {
                write!(fmt, "Handle 0x{handle:x} does not refer to a {expected}")
            }
            StreamError::InvalidArrayType(name) => {
                write!(fmt, "Failed to parse array type from class name {name:?}")
            }
            StreamError::NegativeLength(len, offset) => {
                write!(fmt, "Negative length {len} at {offset:x}")
            }
            StreamError::UnsupportedExternalContents(class) => {
                write!(
                    fmt,
                    "Externalizable class {class} was written without block data"
                )
            }
            StreamError::MaxDepthExceeded(offset) => {
                write!(fmt, "Maximum nesting depth exceeded at {offset:x}")
            }
        }
    }
}

impl std::error::Error for StreamError {}
