//! Implements the errors for the store.

pub mod insert;
pub mod remove;

use std::error::Error;
use std::fmt;
use std::io;

/// Error on loading the primary file header.
#[derive(Debug)]
pub enum LoadHeaderError {
    /// The header counters fail the linear hash bookkeeping invariant-
    /// corrupted or not a store file.
    InvalidHeader,
    /// An underlying IO error while loading the header.
    IO(io::Error),
}

impl Error for LoadHeaderError {}

impl fmt::Display for LoadHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::IO(e) => write!(f, "io: {}", e),
        }
    }
}

impl From<io::Error> for LoadHeaderError {
    fn from(io_err: io::Error) -> Self {
        Self::IO(io_err)
    }
}

/// Error on opening a store.
#[derive(Debug)]
pub enum OpenError {
    /// Could not create the directory to contain the store files.
    CreateDir(io::Error),
    /// Error opening the primary data file.
    DataFileOpen(LoadHeaderError),
}

impl Error for OpenError {}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Self::CreateDir(e) => write!(f, "create dir failed: {}", e),
            Self::DataFileOpen(e) => write!(f, "data open failed: {}", e),
        }
    }
}

/// Error on reading the values stored for a key.
#[derive(Debug)]
pub enum FetchError {
    /// An IO error scanning the key's bucket.
    IO(io::Error),
}

impl Error for FetchError {}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Self::IO(e) => write!(f, "io: {}", e),
        }
    }
}

impl From<io::Error> for FetchError {
    fn from(io_err: io::Error) -> Self {
        Self::IO(io_err)
    }
}

/// Error from commit().
#[derive(Debug)]
pub enum CommitError {
    /// Error writing the header back to the data file.
    HeaderWrite(io::Error),
    /// An io error occured syncing the data file.
    DataFileSync(io::Error),
    /// An io error occured syncing an open extension file.
    ExtensionFileSync(io::Error),
}

impl Error for CommitError {}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Self::HeaderWrite(e) => write!(f, "write header: {}", e),
            Self::DataFileSync(e) => write!(f, "data sync: {}", e),
            Self::ExtensionFileSync(e) => write!(f, "extension sync: {}", e),
        }
    }
}
