//! Define and manage the per bucket header stored inline in the primary file.

use std::io;
use std::io::{Read, Seek, SeekFrom, Write};

/// Size in bytes of a bucket header on disk.
pub(crate) const BUCKET_HEADER_SIZE: usize = 8;

/// Header stored immediately ahead of a bucket's first page of slots in the
/// primary file.  Extension pages carry no header of their own- a bucket's
/// live count spans all its pages.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub(crate) struct BucketHeader {
    extensions: u32, // Overflow pages allocated for this bucket.
    entries: u32,    // Live records across all the bucket's pages.
}

impl BucketHeader {
    /// Load a BucketHeader from source at offset.
    pub fn load<R: Read + Seek>(source: &mut R, offset: u64) -> Result<Self, io::Error> {
        source.seek(SeekFrom::Start(offset))?;
        let mut buffer = [0_u8; BUCKET_HEADER_SIZE];
        source.read_exact(&mut buffer[..])?;
        let mut buf32 = [0_u8; 4];
        buf32.copy_from_slice(&buffer[0..4]);
        let extensions = u32::from_le_bytes(buf32);
        buf32.copy_from_slice(&buffer[4..8]);
        let entries = u32::from_le_bytes(buf32);
        Ok(Self {
            extensions,
            entries,
        })
    }

    /// Write this header to sync at offset.
    pub fn write<W: Write + Seek>(&self, sync: &mut W, offset: u64) -> Result<(), io::Error> {
        sync.seek(SeekFrom::Start(offset))?;
        let mut buffer = [0_u8; BUCKET_HEADER_SIZE];
        buffer[0..4].copy_from_slice(&self.extensions.to_le_bytes());
        buffer[4..8].copy_from_slice(&self.entries.to_le_bytes());
        sync.write_all(&buffer)?;
        Ok(())
    }

    /// Overflow pages allocated for this bucket.
    pub fn extensions(&self) -> u32 {
        self.extensions
    }

    /// Live records across all the bucket's pages.
    pub fn entries(&self) -> u32 {
        self.entries
    }

    /// Record capacity at the bucket's current overflow depth.
    pub fn capacity(&self, entries_per_page: u32) -> u64 {
        (self.extensions as u64 + 1) * entries_per_page as u64
    }

    /// True if every slot across the bucket's pages is in use.
    pub fn is_full(&self, entries_per_page: u32) -> bool {
        self.entries as u64 >= self.capacity(entries_per_page)
    }

    /// Account for one more overflow page.
    pub fn inc_extensions(&mut self) {
        self.extensions += 1;
    }

    /// Increment the live record count by 1.
    pub fn inc_entries(&mut self) {
        self.entries += 1;
    }

    /// Decrement the live record count by 1.
    pub fn dec_entries(&mut self) {
        self.entries -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_round_trip_at_offset() {
        let mut header = BucketHeader::default();
        header.inc_extensions();
        header.inc_entries();
        header.inc_entries();
        header.inc_entries();

        let mut cursor = Cursor::new(vec![0_u8; 64]);
        header.write(&mut cursor, 40).unwrap();
        let loaded = BucketHeader::load(&mut cursor, 40).unwrap();
        assert_eq!(loaded, header);
        assert_eq!(loaded.extensions(), 1);
        assert_eq!(loaded.entries(), 3);
        // Offset 0 was untouched and reads back as an empty bucket.
        let empty = BucketHeader::load(&mut cursor, 0).unwrap();
        assert_eq!(empty, BucketHeader::default());
    }

    #[test]
    fn test_capacity() {
        let mut header = BucketHeader::default();
        assert_eq!(header.capacity(2), 2);
        assert!(!header.is_full(2));
        header.inc_entries();
        header.inc_entries();
        assert!(header.is_full(2));
        header.inc_extensions();
        assert_eq!(header.capacity(2), 4);
        assert!(!header.is_full(2));
    }
}
