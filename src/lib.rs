#![deny(missing_docs)]

//! Crate implementing a disk backed key/value store built on linear hashing
//! (https://en.wikipedia.org/wiki/Linear_hashing).  The table grows one bucket
//! at a time as load rises and merges buckets back one at a time as load
//! falls, so resizing never rewrites the whole index at once.
//! Every bucket has a header and one page of record slots in a single primary
//! file; a bucket that outgrows its page spills into numbered extension files,
//! one file per overflow depth, shared by all buckets.  A bounded pool keeps a
//! few extension files open at a time so the file descriptor footprint stays
//! fixed no matter how deep the overflow chains get.
//! Keys and values are fixed capacity byte buffers (20 and 50 usable bytes)
//! stored zero padded.  Duplicate keys are allowed- a lookup returns every
//! matching value and a removal removes every matching record.
//! The default hasher is a stable Fx hash.  Note that the index lives on disk
//! so a stable hasher is required- the default Rust hasher is NOT appropriate
//! (it is randomly keyed per process for DOS protection, which would make the
//! index invalid when reopened).  Otherwise you can use your own hasher just
//! like HashMap.

pub mod db;
pub mod db_config;
pub mod db_files;
pub mod error;
pub mod fxhasher;
