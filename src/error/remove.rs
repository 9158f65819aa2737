//! Contains the error for the remove() function.

use crate::error::insert::InsertError;
use std::error::Error;
use std::fmt;
use std::io;

/// Custom error type for removes.
#[derive(Debug)]
pub enum RemoveError {
    /// An underlying IO error.
    IO(io::Error),
    /// Error re-placing entries while merging buckets after a remove dropped
    /// the load factor below the minimum.
    Merge(InsertError),
}

impl Error for RemoveError {}

impl fmt::Display for RemoveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Self::IO(e) => write!(f, "io: {}", e),
            Self::Merge(e) => write!(f, "merge: {}", e),
        }
    }
}

impl From<io::Error> for RemoveError {
    fn from(io_err: io::Error) -> Self {
        Self::IO(io_err)
    }
}
