//! Define the configuration used to create a store.

use crate::db::DbCore;
use crate::db_files::DbFiles;
use crate::error::OpenError;
use std::hash::BuildHasher;
use std::path::PathBuf;

/// Configuration for a store.
///
/// The on disk format records the table counters but not the geometry, so a
/// store must be reopened with the same initial_buckets and entries_per_page
/// it was created with.  Reopening with different values is undefined (the
/// header invariant check catches gross mismatches but not all).
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub(crate) files: DbFiles,
    pub(crate) initial_buckets: u32,
    pub(crate) entries_per_page: u32,
    pub(crate) max_load: f32,
    pub(crate) min_load: f32,
    pub(crate) extension_cache: usize,
    pub(crate) create: bool,
    pub(crate) truncate: bool,
    pub(crate) allow_bucket_expansion: bool, // don't split or merge- for testing lots of overflows...
}

impl DbConfig {
    /// Create a new config for a store under dir/name.
    /// Defaults follow the reference deployment: eleven initial buckets of
    /// eleven records each, splitting above a load factor of 0.8 and merging
    /// below 0.3, with at most five extension files open at a time.
    pub fn new<P: Into<PathBuf>, S: Into<String>>(dir: P, name: S) -> Self {
        Self {
            files: DbFiles::new(dir, name),
            initial_buckets: 11,
            entries_per_page: 11,
            max_load: 0.8,
            min_load: 0.3,
            extension_cache: 5,
            create: false,
            truncate: false,
            allow_bucket_expansion: true,
        }
    }

    /// If the store does not exist then create it, otherwise open existing.
    pub fn create(mut self) -> Self {
        self.create = true;
        self
    }

    /// If the store exists then truncate it on open.
    /// This will rebuild the store with new parameters instead of using the
    /// old parameters.
    pub fn truncate(mut self) -> Self {
        self.truncate = true;
        self
    }

    /// Set the bucket count the store starts with.  Merges will never shrink
    /// the table below this.
    /// Panics if buckets is 0.
    pub fn set_initial_buckets(mut self, buckets: u32) -> Self {
        if buckets == 0 {
            panic!("Invalid initial buckets, must be at least 1");
        }
        self.initial_buckets = buckets;
        self
    }

    /// Set the record slots in each page.
    /// Panics if entries is 0.
    pub fn set_entries_per_page(mut self, entries: u32) -> Self {
        if entries == 0 {
            panic!("Invalid entries per page, must be at least 1");
        }
        self.entries_per_page = entries;
        self
    }

    /// Set the load factor above which an insert splits a bucket.
    pub fn set_max_load(mut self, max_load: f32) -> Self {
        self.max_load = max_load;
        self
    }

    /// Set the load factor below which a remove merges buckets away.
    pub fn set_min_load(mut self, min_load: f32) -> Self {
        self.min_load = min_load;
        self
    }

    /// Set how many extension files may be open at once.
    pub fn set_extension_cache(mut self, open_files: usize) -> Self {
        self.extension_cache = open_files;
        self
    }

    /// Never split or merge buckets- the table keeps its initial bucket count
    /// and growth goes entirely into overflow pages.
    pub fn no_bucket_expansion(mut self) -> Self {
        self.allow_bucket_expansion = false;
        self
    }

    /// Consumes the config and builds a DbCore.
    pub fn build<S: BuildHasher + Default>(self) -> Result<DbCore<S>, OpenError> {
        DbCore::open(self)
    }
}
