//! Define and manage the primary data file header.

use crate::db_config::DbConfig;
use crate::error::LoadHeaderError;
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};

/// Size in bytes of the header on disk.
pub(crate) const DATA_HEADER_SIZE: usize = 28;

/// Header at offset 0 of the primary data file.  This is not a log file, the
/// counters change in place over time and are written back before the
/// operation that changed them returns.
///
/// The whole table addressing state lives in these counters: `buckets` is
/// always `base_buckets * 2^level + next`, and a digest routes through
/// `base_buckets * 2^level` first and retries at the next level when it lands
/// below the split pointer.
#[derive(Debug, Copy, Clone)]
pub(crate) struct DataHeader {
    base_buckets: u32,  // Bucket count the store was created with.
    level: u32,         // Completed rounds of table doubling.
    pages: u32,         // Allocated pages, primary plus overflow.
    entries: u32,       // Live records in the store.
    buckets: u32,       // Logical bucket count.
    next: u32,          // Next bucket due to split at this level.
    max_extension: u32, // Deepest overflow level allocated by any bucket.
}

impl DataHeader {
    /// Return a fresh header for a store created from config.
    pub fn new(config: &DbConfig) -> Self {
        Self {
            base_buckets: config.initial_buckets,
            level: 0,
            pages: config.initial_buckets,
            entries: 0,
            buckets: config.initial_buckets,
            next: 0,
            max_extension: 0,
        }
    }

    /// Load a DataHeader from source.  This will seek to the beginning and
    /// leave source positioned after the header.
    pub fn load_header<R: Read + Seek>(source: &mut R) -> Result<Self, LoadHeaderError> {
        source.seek(SeekFrom::Start(0))?;
        let mut buffer = [0_u8; DATA_HEADER_SIZE];
        let mut buf32 = [0_u8; 4];
        let mut pos = 0;
        source.read_exact(&mut buffer[..])?;
        buf32.copy_from_slice(&buffer[pos..(pos + 4)]);
        let base_buckets = u32::from_le_bytes(buf32);
        pos += 4;
        buf32.copy_from_slice(&buffer[pos..(pos + 4)]);
        let level = u32::from_le_bytes(buf32);
        pos += 4;
        buf32.copy_from_slice(&buffer[pos..(pos + 4)]);
        let pages = u32::from_le_bytes(buf32);
        pos += 4;
        buf32.copy_from_slice(&buffer[pos..(pos + 4)]);
        let entries = u32::from_le_bytes(buf32);
        pos += 4;
        buf32.copy_from_slice(&buffer[pos..(pos + 4)]);
        let buckets = u32::from_le_bytes(buf32);
        pos += 4;
        buf32.copy_from_slice(&buffer[pos..(pos + 4)]);
        let next = u32::from_le_bytes(buf32);
        pos += 4;
        buf32.copy_from_slice(&buffer[pos..(pos + 4)]);
        let max_extension = u32::from_le_bytes(buf32);
        let header = Self {
            base_buckets,
            level,
            pages,
            entries,
            buckets,
            next,
            max_extension,
        };
        if !header.invariant_holds() {
            return Err(LoadHeaderError::InvalidHeader);
        }
        Ok(header)
    }

    /// Write this header to sync.  Seeks to the beginning first.
    pub fn write_header<W: Write + Seek>(&self, sync: &mut W) -> Result<(), io::Error> {
        sync.seek(SeekFrom::Start(0))?;
        let mut buffer = [0_u8; DATA_HEADER_SIZE];
        let mut pos = 0;
        buffer[pos..(pos + 4)].copy_from_slice(&self.base_buckets.to_le_bytes());
        pos += 4;
        buffer[pos..(pos + 4)].copy_from_slice(&self.level.to_le_bytes());
        pos += 4;
        buffer[pos..(pos + 4)].copy_from_slice(&self.pages.to_le_bytes());
        pos += 4;
        buffer[pos..(pos + 4)].copy_from_slice(&self.entries.to_le_bytes());
        pos += 4;
        buffer[pos..(pos + 4)].copy_from_slice(&self.buckets.to_le_bytes());
        pos += 4;
        buffer[pos..(pos + 4)].copy_from_slice(&self.next.to_le_bytes());
        pos += 4;
        buffer[pos..(pos + 4)].copy_from_slice(&self.max_extension.to_le_bytes());
        pos += 4;
        assert_eq!(pos, DATA_HEADER_SIZE);
        sync.write_all(&buffer)?;
        Ok(())
    }

    /// True if the counters satisfy the linear hash bookkeeping invariant.
    fn invariant_holds(&self) -> bool {
        if self.base_buckets == 0 || self.level >= 32 {
            return false;
        }
        let modulus = (self.base_buckets as u64) << self.level;
        (self.next as u64) < modulus && self.buckets as u64 == modulus + self.next as u64
    }

    /// The table modulus for the current level.
    pub fn modulus(&self) -> u64 {
        (self.base_buckets as u64) << self.level
    }

    /// Bucket count the store was created with.  Merges never shrink the
    /// table below this.
    pub fn base_buckets(&self) -> u32 {
        self.base_buckets
    }

    /// Completed rounds of table doubling.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Allocated pages, primary plus overflow.
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Live records in the store.
    pub fn entries(&self) -> u32 {
        self.entries
    }

    /// Logical bucket count.
    pub fn buckets(&self) -> u32 {
        self.buckets
    }

    /// Index of the next bucket due to split at this level.
    pub fn next(&self) -> u32 {
        self.next
    }

    /// Deepest overflow level allocated by any bucket.
    pub fn max_extension(&self) -> u32 {
        self.max_extension
    }

    /// Increment the live record count by 1.
    pub fn inc_entries(&mut self) {
        self.entries += 1;
    }

    /// Decrement the live record count by 1.
    pub fn dec_entries(&mut self) {
        self.entries -= 1;
    }

    /// Increment the allocated page count by 1.
    pub fn inc_pages(&mut self) {
        self.pages += 1;
    }

    /// Decrement the allocated page count by pages.
    pub fn dec_pages(&mut self, pages: u32) {
        self.pages -= pages;
    }

    /// Record a new deepest overflow level.
    pub fn set_max_extension(&mut self, extension: u32) {
        self.max_extension = extension;
    }

    /// Account for one new bucket and advance the split pointer, rolling the
    /// level over when every bucket at this level has split once.
    pub fn advance_split(&mut self) {
        let modulus = self.modulus();
        self.buckets += 1;
        self.next += 1;
        if self.next as u64 == modulus {
            self.next = 0;
            self.level += 1;
        }
    }

    /// Reverse the bookkeeping of one split before the last bucket is merged
    /// away.  The bucket count itself is decremented by the caller once the
    /// bucket is empty.
    pub fn retreat_split(&mut self) {
        if self.next > 0 {
            self.next -= 1;
        } else {
            self.level -= 1;
            self.next = self.modulus() as u32 - 1;
        }
    }

    /// Remove the merged away bucket from the count.
    pub fn dec_buckets(&mut self) {
        self.buckets -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_config::DbConfig;
    use std::io::Cursor;

    #[test]
    fn test_round_trip() {
        let config = DbConfig::new("dir", "name")
            .set_initial_buckets(3)
            .set_entries_per_page(2);
        let mut header = DataHeader::new(&config);
        header.inc_entries();
        header.inc_entries();
        header.inc_pages();
        header.advance_split();
        header.set_max_extension(1);

        let mut cursor = Cursor::new(Vec::new());
        header.write_header(&mut cursor).unwrap();
        assert_eq!(cursor.get_ref().len(), DATA_HEADER_SIZE);
        let loaded = DataHeader::load_header(&mut cursor).unwrap();
        assert_eq!(loaded.base_buckets(), 3);
        assert_eq!(loaded.level(), 0);
        assert_eq!(loaded.pages(), 4);
        assert_eq!(loaded.entries(), 2);
        assert_eq!(loaded.buckets(), 4);
        assert_eq!(loaded.next(), 1);
        assert_eq!(loaded.max_extension(), 1);
    }

    #[test]
    fn test_invalid_header_rejected() {
        // buckets must equal base * 2^level + next.
        let buffer: Vec<u8> = [3_u32, 0, 3, 0, 5, 1, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut cursor = Cursor::new(buffer);
        assert!(matches!(
            DataHeader::load_header(&mut cursor),
            Err(LoadHeaderError::InvalidHeader)
        ));
    }

    #[test]
    fn test_split_bookkeeping_rolls_level() {
        let config = DbConfig::new("dir", "name").set_initial_buckets(2);
        let mut header = DataHeader::new(&config);
        // Two splits complete level 0.
        header.advance_split();
        assert_eq!((header.level(), header.next(), header.buckets()), (0, 1, 3));
        header.advance_split();
        assert_eq!((header.level(), header.next(), header.buckets()), (1, 0, 4));
        // Reverse both.
        header.retreat_split();
        header.dec_buckets();
        assert_eq!((header.level(), header.next(), header.buckets()), (0, 1, 3));
        header.retreat_split();
        header.dec_buckets();
        assert_eq!((header.level(), header.next(), header.buckets()), (0, 0, 2));
    }
}
