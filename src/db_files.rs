//! Define the files used to store a DB.

use std::fs;
use std::path::{Path, PathBuf};

/// Contains the file names and paths for all the files in a DB.
///
/// A store lives in its own directory: with directory set to "/some/dir" and
/// name set to "test_db" the primary file is /some/dir/test_db/db.dat and
/// overflow depth k lives in /some/dir/test_db/db{k}.odx.
/// Extension file names are derived from the depth alone so a reopened store
/// rediscovers them without any separate metadata.
#[derive(Clone, Debug)]
pub struct DbFiles {
    /// The directory containing the DB.
    dir: PathBuf,
    /// Base name (without directory) of the DB.
    name: String,
}

impl DbFiles {
    /// Create a new DbFiles struct from a directory and name.
    pub fn new<P, S>(dir: P, name: S) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        DbFiles {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Return the root directory containing the DB directory.
    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    /// The name of the database.  Appended to dir to form the directory that
    /// contains all the DB files.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory containing the DB files.
    pub fn store_dir(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Path to the primary data file.
    pub fn data_path(&self) -> PathBuf {
        self.store_dir().join("db").with_extension("dat")
    }

    /// Path to the overflow file for extension depth (1 based).
    pub fn extension_path(&self, extension: u32) -> PathBuf {
        self.store_dir()
            .join(format!("db{}", extension))
            .with_extension("odx")
    }

    /// Delete the referenced DB files and the directory if empty.
    /// If it can not remove a file it will silently ignore this.
    pub fn delete(self) {
        let _ = fs::remove_file(self.data_path());
        let mut extension = 1;
        loop {
            let path = self.extension_path(extension);
            if !path.exists() {
                break;
            }
            let _ = fs::remove_file(path);
            extension += 1;
        }
        let _ = fs::remove_dir(self.store_dir());
        let _ = fs::remove_dir(&self.dir);
    }
}
