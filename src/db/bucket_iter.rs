//! Implements the iterator over the live records in one bucket.  This handles
//! the bucket's overflow pages as well and allows a bucket to be scanned
//! without worrying about the underlying files or offsets.

use crate::db::bucket_header::BucketHeader;
use crate::db::entry::{Entry, ENTRY_SIZE};
use crate::db::extension_pool::ExtensionPool;
use crate::db::layout;
use std::fs::File;
use std::io;
use std::io::{Read, Seek, SeekFrom};

/// Iterates over the (slot index, record) pairs of a bucket's live records,
/// one page buffer at a time: the primary page first, then each extension
/// page in depth order.  Stops as soon as the bucket's live count has been
/// seen so trailing empty pages are never read.
pub(crate) struct BucketIter<'src> {
    data_file: &'src mut File,
    pool: &'src mut ExtensionPool,
    bucket: u32,
    entries_per_page: u32,
    extensions: u32,
    remaining: u32,
    ext_file_len: u64,
    page: Vec<u8>,
    depth: u32,
    slot_in_page: u32,
    loaded: bool,
    failure: Option<io::Error>,
}

impl<'src> BucketIter<'src> {
    pub(super) fn new(
        data_file: &'src mut File,
        pool: &'src mut ExtensionPool,
        bucket: u32,
        header: &BucketHeader,
        entries_per_page: u32,
        ext_file_len: u64,
    ) -> Self {
        Self {
            data_file,
            pool,
            bucket,
            entries_per_page,
            extensions: header.extensions(),
            remaining: header.entries(),
            ext_file_len,
            page: vec![0; layout::page_size(entries_per_page) as usize],
            depth: 0,
            slot_in_page: 0,
            loaded: false,
            failure: None,
        }
    }

    /// The IO error that stopped the scan, if any.  Check after iterating- a
    /// failed iterator ends early rather than yielding bad data.
    pub(super) fn take_failure(&mut self) -> Option<io::Error> {
        self.failure.take()
    }

    fn load_page(&mut self) -> Result<(), io::Error> {
        let offset = layout::page_offset(self.bucket, self.depth, self.entries_per_page);
        if self.depth == 0 {
            self.data_file.seek(SeekFrom::Start(offset))?;
            self.data_file.read_exact(&mut self.page)?;
        } else {
            let file = self.pool.get(self.depth, self.ext_file_len)?;
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut self.page)?;
        }
        Ok(())
    }
}

impl<'src> Iterator for BucketIter<'src> {
    type Item = (u64, Entry);

    fn next(&mut self) -> Option<Self::Item> {
        if self.failure.is_some() {
            return None;
        }
        loop {
            if self.remaining == 0 || self.depth > self.extensions {
                return None;
            }
            if !self.loaded {
                if let Err(err) = self.load_page() {
                    self.failure = Some(err);
                    return None;
                }
                self.loaded = true;
            }
            while self.slot_in_page < self.entries_per_page {
                let start = self.slot_in_page as usize * ENTRY_SIZE;
                let slot = self.slot_in_page;
                self.slot_in_page += 1;
                let buffer = &self.page[start..(start + ENTRY_SIZE)];
                if buffer[0] != 0 {
                    self.remaining -= 1;
                    let index = self.depth as u64 * self.entries_per_page as u64 + slot as u64;
                    return Some((index, Entry::from_bytes(buffer)));
                }
            }
            self.depth += 1;
            self.slot_in_page = 0;
            self.loaded = false;
        }
    }
}
