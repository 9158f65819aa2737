//! Bounded cache of open overflow file handles.  A bucket may be backed by as
//! many extension files as its deepest overflow level and opening every file
//! for every operation is wasteful, so a small fixed number stay open and the
//! oldest opened handle is closed to make room (simple FIFO, not LRU- a cache
//! hit does not renew a handle's place in line).

use crate::db_files::DbFiles;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io;

/// Owns the open extension file handles for a store.
#[derive(Debug)]
pub(crate) struct ExtensionPool {
    files: DbFiles,
    open: VecDeque<(u32, File)>,
    limit: usize,
}

impl ExtensionPool {
    /// Create an empty pool holding at most limit open handles.
    pub fn new(files: DbFiles, limit: usize) -> Self {
        Self {
            files,
            open: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    /// Return the open handle for extension, opening the file on a miss and
    /// evicting the oldest opened handle first if the pool is at its limit.
    /// The file is created on first use; min_len is the bytes needed for one
    /// page per existing bucket and the file is extended (zero filled) to it,
    /// so a fresh file starts out as all empty slots.
    pub fn get(&mut self, extension: u32, min_len: u64) -> Result<&mut File, io::Error> {
        if let Some(pos) = self.open.iter().position(|(e, _)| *e == extension) {
            return Ok(&mut self.open[pos].1);
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(self.files.extension_path(extension))?;
        if file.metadata()?.len() < min_len {
            file.set_len(min_len)?;
        }
        if self.open.len() >= self.limit {
            // Dropping the handle closes it.
            self.open.pop_front();
        }
        self.open.push_back((extension, file));
        Ok(&mut self.open.back_mut().expect("just pushed").1)
    }

    /// Sync every cached handle to disk.
    pub fn sync_all(&mut self) -> Result<(), io::Error> {
        for (_, file) in &self.open {
            file.sync_all()?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn cached(&self) -> Vec<u32> {
        self.open.iter().map(|(e, _)| *e).collect()
    }
}
