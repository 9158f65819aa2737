//! Main module for the store.  This implements the core sync single threaded
//! access to the linear hash table: routing keys to buckets, growing the
//! table one bucket at a time as load rises and merging buckets back as load
//! falls.

mod bucket_header;
mod bucket_iter;
mod data_header;
mod entry;
mod extension_pool;
mod layout;

pub use entry::{KEY_CAPACITY, VALUE_CAPACITY};

use crate::db::bucket_header::BucketHeader;
use crate::db::bucket_iter::BucketIter;
use crate::db::data_header::DataHeader;
use crate::db::entry::{Entry, ENTRY_SIZE};
use crate::db::extension_pool::ExtensionPool;
use crate::db::layout::{SlotAddr, SlotFile};
use crate::db_config::DbConfig;
use crate::error::insert::InsertError;
use crate::error::remove::RemoveError;
use crate::error::{CommitError, FetchError, LoadHeaderError, OpenError};
use crate::fxhasher::FxHasher;
use std::fs;
use std::fs::{File, OpenOptions};
use std::hash::{BuildHasher, BuildHasherDefault, Hasher};
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};

/// An instance of a store.
/// Consists of a primary data file (table header, bucket headers and each
/// bucket's first page of records) plus one overflow file per extension
/// depth.  All counters are written through to disk before the operation that
/// changed them returns, so a store closed at any operation boundary reopens
/// consistent.
pub struct DbCore<S = BuildHasherDefault<FxHasher>>
where
    S: BuildHasher + Default,
{
    header: DataHeader,
    data_file: File,
    extensions: ExtensionPool,
    hasher: S,
    config: DbConfig,
}

/// Digest the key bytes with the store's hasher.
fn key_digest<S: BuildHasher>(hasher: &S, key: &[u8]) -> u64 {
    let mut hasher = hasher.build_hasher();
    hasher.write(key);
    hasher.finish()
}

/// Map a digest to its bucket under the given split schedule.  A digest that
/// lands below the split pointer belongs to a bucket that already split this
/// round, so it is re-addressed with the next level's modulus.
fn route_digest(digest: u64, modulus: u64, next: u64) -> u32 {
    let bucket = digest % modulus;
    if bucket < next {
        (digest % (modulus * 2)) as u32
    } else {
        bucket as u32
    }
}

impl<S> Drop for DbCore<S>
where
    S: BuildHasher + Default,
{
    fn drop(&mut self) {
        let _ = self.commit();
    }
}

impl<S> DbCore<S>
where
    S: BuildHasher + Default,
{
    /// Open a new or reopen an existing store.
    pub fn open(config: DbConfig) -> Result<Self, OpenError> {
        fs::create_dir_all(config.files.store_dir()).map_err(OpenError::CreateDir)?;
        let (data_file, header) =
            Self::open_data_file(&config).map_err(OpenError::DataFileOpen)?;
        let extensions = ExtensionPool::new(config.files.clone(), config.extension_cache);
        Ok(Self {
            header,
            data_file,
            extensions,
            hasher: S::default(),
            config,
        })
    }

    /// Insert a new record.  Keys are at most [`KEY_CAPACITY`] bytes with no
    /// zero bytes, values at most [`VALUE_CAPACITY`] bytes; both are stored
    /// zero padded and a value reads back up to its first zero byte.
    /// Duplicate keys are allowed- every inserted record stays visible to
    /// fetch until removed.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), InsertError> {
        if key.is_empty() || key.contains(&0) {
            return Err(InsertError::InvalidKey);
        }
        if key.len() > KEY_CAPACITY {
            return Err(InsertError::KeyLength);
        }
        if value.len() > VALUE_CAPACITY {
            return Err(InsertError::ValueLength);
        }
        let bucket = self.bucket_for_key(key);
        let entry = Entry::new(key, value);
        self.place_entry(bucket, &entry)?;
        if self.config.allow_bucket_expansion && self.load_factor() > self.config.max_load {
            self.split_one_bucket()?;
        }
        self.header.write_header(&mut self.data_file)?;
        Ok(())
    }

    /// Return every value stored under key, in unspecified order.  An empty
    /// result means the key is absent- never an error.
    pub fn fetch(&mut self, key: &[u8]) -> Result<Vec<Vec<u8>>, FetchError> {
        let bucket = self.bucket_for_key(key);
        let header = self.read_bucket_header(bucket)?;
        let entries_per_page = self.config.entries_per_page;
        let ext_file_len = self.ext_file_len();
        let mut iter = BucketIter::new(
            &mut self.data_file,
            &mut self.extensions,
            bucket,
            &header,
            entries_per_page,
            ext_file_len,
        );
        let mut values = Vec::new();
        for (_slot, entry) in &mut iter {
            if entry.key() == key {
                values.push(entry.value().to_vec());
            }
        }
        if let Some(err) = iter.take_failure() {
            return Err(err.into());
        }
        Ok(values)
    }

    /// Remove every record stored under key and return how many were removed
    /// (0 if the key is absent, leaving the store untouched).  Dropping below
    /// the minimum load factor merges the last bucket away, repeatedly, until
    /// load recovers or the table is back at its initial size.
    pub fn remove(&mut self, key: &[u8]) -> Result<u64, RemoveError> {
        let bucket = self.bucket_for_key(key);
        let mut header = self.read_bucket_header(bucket)?;
        let slots = self.collect_matching_slots(bucket, &header, key)?;
        if slots.is_empty() {
            return Ok(0);
        }
        let entries_per_page = self.config.entries_per_page;
        for slot in &slots {
            self.clear_slot(layout::slot_addr(bucket, *slot, entries_per_page))?;
            header.dec_entries();
            self.header.dec_entries();
        }
        self.write_bucket_header(bucket, &header)?;
        while self.config.allow_bucket_expansion
            && self.header.buckets() > self.header.base_buckets()
            && self.load_factor() < self.config.min_load
        {
            self.merge_last_bucket()?;
        }
        self.header.write_header(&mut self.data_file)?;
        Ok(slots.len() as u64)
    }

    /// Return the number of records in the store.
    pub fn len(&self) -> usize {
        self.header.entries() as usize
    }

    /// Is the store empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the header through and sync every open file.
    /// All data should be safely on disk if this call succeeds.
    pub fn commit(&mut self) -> Result<(), CommitError> {
        self.header
            .write_header(&mut self.data_file)
            .map_err(CommitError::HeaderWrite)?;
        self.data_file
            .sync_all()
            .map_err(CommitError::DataFileSync)?;
        self.extensions
            .sync_all()
            .map_err(CommitError::ExtensionFileSync)?;
        Ok(())
    }

    fn open_data_file(config: &DbConfig) -> Result<(File, DataHeader), LoadHeaderError> {
        let data_path = config.files.data_path();
        if config.truncate {
            // Rebuilds the store with this config's parameters.
            OpenOptions::new()
                .write(true)
                .create(config.create)
                .truncate(true)
                .open(&data_path)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create)
            .open(&data_path)?;
        let file_end = file.seek(SeekFrom::End(0))?;
        let header = if file_end == 0 {
            let header = DataHeader::new(config);
            header.write_header(&mut file)?;
            // Zero fill the initial bucket segments (a zero first key byte
            // marks an empty slot).
            let segment =
                vec![0_u8; layout::bucket_segment_size(config.entries_per_page) as usize];
            for _ in 0..config.initial_buckets {
                file.write_all(&segment)?;
            }
            header
        } else {
            DataHeader::load_header(&mut file)?
        };
        Ok((file, header))
    }

    /// The bucket key routes to under the current split schedule.
    fn bucket_for_key(&self, key: &[u8]) -> u32 {
        route_digest(
            key_digest(&self.hasher, key),
            self.header.modulus(),
            self.header.next() as u64,
        )
    }

    /// Live records divided by total record capacity across allocated pages.
    fn load_factor(&self) -> f32 {
        let capacity = self.header.pages() as u64 * self.config.entries_per_page as u64;
        self.header.entries() as f32 / capacity as f32
    }

    /// Bytes an extension file needs to hold one page per existing bucket.
    fn ext_file_len(&self) -> u64 {
        self.header.buckets() as u64 * layout::page_size(self.config.entries_per_page)
    }

    fn read_bucket_header(&mut self, bucket: u32) -> Result<BucketHeader, io::Error> {
        BucketHeader::load(
            &mut self.data_file,
            layout::bucket_offset(bucket, self.config.entries_per_page),
        )
    }

    fn write_bucket_header(
        &mut self,
        bucket: u32,
        header: &BucketHeader,
    ) -> Result<(), io::Error> {
        header.write(
            &mut self.data_file,
            layout::bucket_offset(bucket, self.config.entries_per_page),
        )
    }

    /// Read one page of a bucket's slots (depth 0 is the primary page).
    fn read_page(&mut self, bucket: u32, depth: u32) -> Result<Vec<u8>, io::Error> {
        let entries_per_page = self.config.entries_per_page;
        let mut page = vec![0_u8; layout::page_size(entries_per_page) as usize];
        let offset = layout::page_offset(bucket, depth, entries_per_page);
        if depth == 0 {
            self.data_file.seek(SeekFrom::Start(offset))?;
            self.data_file.read_exact(&mut page)?;
        } else {
            let min_len = self.ext_file_len();
            let file = self.extensions.get(depth, min_len)?;
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut page)?;
        }
        Ok(page)
    }

    /// Linear scan for the first tombstoned or never written slot across the
    /// bucket's pages.  Callers have ensured free capacity exists; running
    /// off the end of the chain anyway means the bucket header no longer
    /// matches the slots on disk.
    fn find_first_empty_slot(
        &mut self,
        bucket: u32,
        header: &BucketHeader,
    ) -> Result<u64, InsertError> {
        let entries_per_page = self.config.entries_per_page;
        for depth in 0..=header.extensions() {
            let page = self.read_page(bucket, depth)?;
            for slot in 0..entries_per_page {
                if page[slot as usize * ENTRY_SIZE] == 0 {
                    return Ok(depth as u64 * entries_per_page as u64 + slot as u64);
                }
            }
        }
        Err(InsertError::IndexCorrupted)
    }

    fn write_entry_at(&mut self, addr: SlotAddr, entry: &Entry) -> Result<(), io::Error> {
        let bytes = entry.to_bytes();
        match addr.file {
            SlotFile::Primary => {
                self.data_file.seek(SeekFrom::Start(addr.offset))?;
                self.data_file.write_all(&bytes)?;
            }
            SlotFile::Extension(depth) => {
                let min_len = self.ext_file_len();
                let file = self.extensions.get(depth, min_len)?;
                file.seek(SeekFrom::Start(addr.offset))?;
                file.write_all(&bytes)?;
            }
        }
        Ok(())
    }

    /// Tombstone a slot by zeroing the first key byte.
    fn clear_slot(&mut self, addr: SlotAddr) -> Result<(), io::Error> {
        match addr.file {
            SlotFile::Primary => {
                self.data_file.seek(SeekFrom::Start(addr.offset))?;
                self.data_file.write_all(&[0_u8])?;
            }
            SlotFile::Extension(depth) => {
                let min_len = self.ext_file_len();
                let file = self.extensions.get(depth, min_len)?;
                file.seek(SeekFrom::Start(addr.offset))?;
                file.write_all(&[0_u8])?;
            }
        }
        Ok(())
    }

    /// Allocate one more overflow page for the bucket owning header.  Getting
    /// the file from the pool creates and zero fills it on first use; the
    /// bucket's page within it is addressed by offset alone.
    fn extend_bucket(&mut self, header: &mut BucketHeader) -> Result<(), io::Error> {
        let depth = header.extensions() + 1;
        let min_len = self.ext_file_len();
        self.extensions.get(depth, min_len)?;
        header.inc_extensions();
        self.header.inc_pages();
        if depth > self.header.max_extension() {
            self.header.set_max_extension(depth);
        }
        Ok(())
    }

    /// Write entry into bucket, extending the bucket's overflow chain first
    /// when it is full for its current depth.  Updates and persists the
    /// bucket header and bumps the global live count; the caller persists the
    /// table header.
    fn place_entry(&mut self, bucket: u32, entry: &Entry) -> Result<(), InsertError> {
        let mut header = self.read_bucket_header(bucket)?;
        if header.is_full(self.config.entries_per_page) {
            self.extend_bucket(&mut header)?;
        }
        let slot = self.find_first_empty_slot(bucket, &header)?;
        let addr = layout::slot_addr(bucket, slot, self.config.entries_per_page);
        self.write_entry_at(addr, entry)?;
        header.inc_entries();
        self.write_bucket_header(bucket, &header)?;
        self.header.inc_entries();
        Ok(())
    }

    /// Split the bucket the split pointer schedules next, then redistribute
    /// its records under the advanced schedule.  The records that re-route go
    /// to the newly added bucket; the rest stay put.
    fn split_one_bucket(&mut self) -> Result<(), InsertError> {
        let entries_per_page = self.config.entries_per_page;
        let source = self.header.next();
        self.header.inc_pages();
        self.header.advance_split();
        let new_bucket = self.header.buckets() - 1;
        // Zero fill the new bucket's primary segment and its page in every
        // allocated extension file.  A segment can be left over from a merged
        // away bucket and still hold stale slots, so an explicit zero write
        // is needed- growing the file is not enough.
        let segment = vec![0_u8; layout::bucket_segment_size(entries_per_page) as usize];
        self.data_file.seek(SeekFrom::Start(layout::bucket_offset(
            new_bucket,
            entries_per_page,
        )))?;
        self.data_file.write_all(&segment)?;
        let page = vec![0_u8; layout::page_size(entries_per_page) as usize];
        let min_len = self.ext_file_len();
        for depth in 1..=self.header.max_extension() {
            let file = self.extensions.get(depth, min_len)?;
            file.seek(SeekFrom::Start(layout::extension_offset(
                new_bucket,
                entries_per_page,
            )))?;
            file.write_all(&page)?;
        }
        self.redistribute(source)
    }

    /// Fold the last bucket back into the table, reversing one split.  The
    /// split bookkeeping is retreated first so the hash can no longer route
    /// to the dying bucket, then its records are moved out.
    fn merge_last_bucket(&mut self) -> Result<(), RemoveError> {
        self.header.retreat_split();
        let last = self.header.buckets() - 1;
        let pages = self.read_bucket_header(last)?.extensions() + 1;
        self.redistribute(last).map_err(RemoveError::Merge)?;
        self.header.dec_pages(pages);
        self.header.dec_buckets();
        // The dying bucket's slots are already tombstoned; clear its header
        // so the segment reads as empty if a later split reuses it.
        self.write_bucket_header(last, &BucketHeader::default())?;
        Ok(())
    }

    /// Move every record whose hash no longer routes to bucket out to its
    /// current target.  Collects the moves first, then tombstones and
    /// re-places, so the scan never interleaves with the writes.
    fn redistribute(&mut self, bucket: u32) -> Result<(), InsertError> {
        let entries_per_page = self.config.entries_per_page;
        let mut header = self.read_bucket_header(bucket)?;
        let ext_file_len = self.ext_file_len();
        let modulus = self.header.modulus();
        let next = self.header.next() as u64;
        let mut moved: Vec<(u64, Entry)> = Vec::new();
        {
            let hasher = &self.hasher;
            let mut iter = BucketIter::new(
                &mut self.data_file,
                &mut self.extensions,
                bucket,
                &header,
                entries_per_page,
                ext_file_len,
            );
            for (slot, entry) in &mut iter {
                let target = route_digest(key_digest(hasher, entry.key()), modulus, next);
                if target != bucket {
                    moved.push((slot, entry));
                }
            }
            if let Some(err) = iter.take_failure() {
                return Err(err.into());
            }
        }
        for (slot, _) in &moved {
            self.clear_slot(layout::slot_addr(bucket, *slot, entries_per_page))?;
            header.dec_entries();
            self.header.dec_entries();
        }
        self.write_bucket_header(bucket, &header)?;
        for (_, entry) in &moved {
            let target = self.bucket_for_key(entry.key());
            self.place_entry(target, entry)?;
        }
        Ok(())
    }

    /// Slot indexes of every live record in bucket whose key matches.
    fn collect_matching_slots(
        &mut self,
        bucket: u32,
        header: &BucketHeader,
        key: &[u8],
    ) -> Result<Vec<u64>, io::Error> {
        let entries_per_page = self.config.entries_per_page;
        let ext_file_len = self.ext_file_len();
        let mut iter = BucketIter::new(
            &mut self.data_file,
            &mut self.extensions,
            bucket,
            header,
            entries_per_page,
            ext_file_len,
        );
        let mut slots = Vec::new();
        for (slot, entry) in &mut iter {
            if entry.key() == key {
                slots.push(slot);
            }
        }
        if let Some(err) = iter.take_failure() {
            return Err(err);
        }
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestDb = DbCore;

    fn assert_counters_consistent(db: &TestDb) {
        assert_eq!(
            db.header.buckets() as u64,
            db.header.modulus() + db.header.next() as u64
        );
        assert!((db.header.next() as u64) < db.header.modulus());
    }

    #[test]
    fn test_insert_fetch_remove() {
        let tmp = TempDir::new().unwrap();
        let mut db: TestDb = DbConfig::new(tmp.path(), "basic").create().build().unwrap();
        db.insert(b"alpha", b"one").unwrap();
        db.insert(b"beta", b"two").unwrap();
        // Duplicate keys are allowed.
        db.insert(b"alpha", b"three").unwrap();
        assert_eq!(db.len(), 3);

        let mut values = db.fetch(b"alpha").unwrap();
        values.sort();
        assert_eq!(values, vec![b"one".to_vec(), b"three".to_vec()]);
        assert_eq!(db.fetch(b"beta").unwrap(), vec![b"two".to_vec()]);
        assert!(db.fetch(b"gamma").unwrap().is_empty());

        assert_eq!(db.remove(b"alpha").unwrap(), 2);
        assert!(db.fetch(b"alpha").unwrap().is_empty());
        assert_eq!(db.len(), 1);
        assert_eq!(db.remove(b"alpha").unwrap(), 0);
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_rejects_bad_records() {
        let tmp = TempDir::new().unwrap();
        let mut db: TestDb = DbConfig::new(tmp.path(), "bad").create().build().unwrap();
        assert!(matches!(
            db.insert(b"", b"value"),
            Err(InsertError::InvalidKey)
        ));
        assert!(matches!(
            db.insert(b"a\0b", b"value"),
            Err(InsertError::InvalidKey)
        ));
        assert!(matches!(
            db.insert(&[b'k'; KEY_CAPACITY + 1], b"value"),
            Err(InsertError::KeyLength)
        ));
        assert!(matches!(
            db.insert(b"key", &[b'v'; VALUE_CAPACITY + 1]),
            Err(InsertError::ValueLength)
        ));
        assert_eq!(db.len(), 0);
        // Full capacity is fine and an empty value is fine.
        db.insert(&[b'k'; KEY_CAPACITY], &[b'v'; VALUE_CAPACITY])
            .unwrap();
        db.insert(b"key", b"").unwrap();
        assert_eq!(db.fetch(b"key").unwrap(), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let tmp = TempDir::new().unwrap();
        let mut db: TestDb = DbConfig::new(tmp.path(), "noop").create().build().unwrap();
        db.insert(b"here", b"value").unwrap();
        let before = db.header;
        assert_eq!(db.remove(b"not here").unwrap(), 0);
        let after = db.header;
        assert_eq!(before.entries(), after.entries());
        assert_eq!(before.pages(), after.pages());
        assert_eq!(before.buckets(), after.buckets());
        assert_eq!(before.level(), after.level());
        assert_eq!(before.next(), after.next());
    }

    #[test]
    fn test_grow_and_shrink_small_table() {
        let tmp = TempDir::new().unwrap();
        let mut db: TestDb = DbConfig::new(tmp.path(), "small")
            .create()
            .set_initial_buckets(3)
            .set_entries_per_page(2)
            .build()
            .unwrap();
        let keys = [
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
        ];
        for key in keys {
            db.insert(key.as_bytes(), format!("value {}", key).as_bytes())
                .unwrap();
            assert_counters_consistent(&db);
        }
        assert_eq!(db.len(), keys.len());
        // Thirteen records in six initial slots guarantees growth.
        assert!(db.header.buckets() > 3);
        for key in keys {
            assert_eq!(
                db.fetch(key.as_bytes()).unwrap(),
                vec![format!("value {}", key).into_bytes()]
            );
        }

        // Remove everything but "c"; load collapses and the table merges all
        // the way back to its initial three buckets.
        for key in keys {
            if key != "c" {
                assert_eq!(db.remove(key.as_bytes()).unwrap(), 1);
                assert_counters_consistent(&db);
            }
        }
        assert_eq!(db.len(), 1);
        assert_eq!(db.header.buckets(), 3);
        assert!(db.fetch(b"d").unwrap().is_empty());
        assert_eq!(db.fetch(b"c").unwrap(), vec![b"value c".to_vec()]);
    }

    #[test]
    fn test_growth_keeps_counters_consistent() {
        let tmp = TempDir::new().unwrap();
        let config = DbConfig::new(tmp.path(), "grow")
            .create()
            .set_initial_buckets(4)
            .set_entries_per_page(4);
        let mut db: TestDb = config.clone().build().unwrap();
        for i in 0..200 {
            db.insert(
                format!("key-{}", i).as_bytes(),
                format!("value {}", i).as_bytes(),
            )
            .unwrap();
            assert_counters_consistent(&db);
        }
        assert_eq!(db.len(), 200);
        assert!(db.header.level() > 0);
        let before = db.header;
        drop(db);

        // Reopen and verify the table state and every record survived.
        let mut db: TestDb = config.build().unwrap();
        let after = db.header;
        assert_eq!(before.buckets(), after.buckets());
        assert_eq!(before.level(), after.level());
        assert_eq!(before.next(), after.next());
        assert_eq!(before.pages(), after.pages());
        assert_eq!(before.max_extension(), after.max_extension());
        assert_eq!(db.len(), 200);
        for i in 0..200 {
            assert_eq!(
                db.fetch(format!("key-{}", i).as_bytes()).unwrap(),
                vec![format!("value {}", i).into_bytes()]
            );
        }

        // Removing everything shrinks the table back to its initial size but
        // never below it.
        for i in 0..200 {
            assert_eq!(db.remove(format!("key-{}", i).as_bytes()).unwrap(), 1);
            assert_counters_consistent(&db);
        }
        assert!(db.is_empty());
        assert_eq!(db.header.buckets(), 4);
        assert_eq!(db.header.level(), 0);
        assert!(db.fetch(b"key-0").unwrap().is_empty());
    }

    #[test]
    fn test_overflow_chains_without_expansion() {
        let tmp = TempDir::new().unwrap();
        let mut db: TestDb = DbConfig::new(tmp.path(), "overflow")
            .create()
            .set_initial_buckets(2)
            .set_entries_per_page(2)
            .no_bucket_expansion()
            .build()
            .unwrap();
        for i in 0..60 {
            db.insert(
                format!("okey-{}", i).as_bytes(),
                format!("val {}", i).as_bytes(),
            )
            .unwrap();
        }
        // All growth went into overflow chains deep enough to churn the
        // extension pool past its five open handles.
        assert_eq!(db.header.buckets(), 2);
        assert!(db.header.max_extension() >= 6);
        for i in 0..60 {
            assert_eq!(
                db.fetch(format!("okey-{}", i).as_bytes()).unwrap(),
                vec![format!("val {}", i).into_bytes()]
            );
        }

        for i in (0..60).step_by(2) {
            assert_eq!(db.remove(format!("okey-{}", i).as_bytes()).unwrap(), 1);
        }
        assert_eq!(db.len(), 30);
        assert!(db.fetch(b"okey-0").unwrap().is_empty());
        assert_eq!(db.fetch(b"okey-1").unwrap(), vec![b"val 1".to_vec()]);

        // Re-inserting reuses tombstoned slots instead of allocating pages.
        let pages = db.header.pages();
        db.insert(b"okey-0", b"val 0 again").unwrap();
        assert_eq!(db.header.pages(), pages);
        assert_eq!(db.fetch(b"okey-0").unwrap(), vec![b"val 0 again".to_vec()]);
    }

    #[test]
    fn test_routing_stable_for_unsplit_buckets() {
        // With 4 base buckets at level 0 and the split pointer advanced past
        // bucket 0, digests that land on buckets 1..4 keep their bucket and
        // digests landing on the split bucket re-route within {0, 4}.
        for digest in 0..1000_u64 {
            let before = route_digest(digest, 4, 0);
            let after = route_digest(digest, 4, 1);
            if before != 0 {
                assert_eq!(before, after);
            } else {
                assert!(after == 0 || after == 4);
            }
        }
    }

    #[test]
    fn test_write_through_layout() {
        let tmp = TempDir::new().unwrap();
        let mut db: TestDb = DbConfig::new(tmp.path(), "raw")
            .create()
            .set_initial_buckets(2)
            .set_entries_per_page(2)
            .build()
            .unwrap();
        let data_path = db.config.files.data_path();
        // Header plus two bucket segments of 8 + 2 * 72 bytes.
        assert_eq!(fs::metadata(&data_path).unwrap().len(), 28 + 2 * 152);
        db.insert(b"key", b"value").unwrap();
        // Counters hit the disk before insert returns, no commit needed.
        let bytes = fs::read(&data_path).unwrap();
        let entries = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_open_missing_fails_without_create() {
        let tmp = TempDir::new().unwrap();
        let result: Result<TestDb, OpenError> = DbConfig::new(tmp.path(), "missing").build();
        assert!(matches!(result, Err(OpenError::DataFileOpen(_))));
    }

    #[test]
    fn test_truncate_rebuilds() {
        let tmp = TempDir::new().unwrap();
        let mut db: TestDb = DbConfig::new(tmp.path(), "trunc").create().build().unwrap();
        db.insert(b"key", b"value").unwrap();
        drop(db);
        let mut db: TestDb = DbConfig::new(tmp.path(), "trunc")
            .create()
            .truncate()
            .build()
            .unwrap();
        assert!(db.is_empty());
        assert!(db.fetch(b"key").unwrap().is_empty());
    }
}
