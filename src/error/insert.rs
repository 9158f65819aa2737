//! Contains the error for the insert() function.

use std::error::Error;
use std::fmt;
use std::io;

/// Custom error type for inserts.
#[derive(Debug)]
pub enum InsertError {
    /// Key is empty or contains a zero byte (zero is reserved to mark empty
    /// slots and terminate stored keys).
    InvalidKey,
    /// Key is longer than the fixed key capacity.
    KeyLength,
    /// Value is longer than the fixed value capacity.
    ValueLength,
    /// A bucket header claims free capacity but its pages hold no empty slot.
    /// The index no longer matches the slots on disk.
    IndexCorrupted,
    /// An underlying IO error.
    IO(io::Error),
}

impl Error for InsertError {}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Self::InvalidKey => write!(f, "key is empty or contains a zero byte"),
            Self::KeyLength => write!(f, "key longer than key capacity"),
            Self::ValueLength => write!(f, "value longer than value capacity"),
            Self::IndexCorrupted => write!(f, "bucket header does not match its slots"),
            Self::IO(e) => write!(f, "io: {}", e),
        }
    }
}

impl From<io::Error> for InsertError {
    fn from(io_err: io::Error) -> Self {
        Self::IO(io_err)
    }
}
