//! Storage configuration for a ledger instance
use std::path::{Path, PathBuf};

pub const DEFAULT_PATH: &str = "report-ledger.db";
pub const DEFAULT_CACHE_CAPACITY: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Directory sled keeps its files in
    pub path: PathBuf,
    /// Keep the database in a throwaway directory removed on drop
    pub temporary: bool,
    /// Page cache size in bytes
    pub cache_capacity: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            temporary: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn at(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Temporary ledgers let sled pick a fresh directory, so `path` is ignored.
    pub fn to_sled(&self) -> sled::Config {
        let config = sled::Config::new()
            .temporary(self.temporary)
            .cache_capacity(self.cache_capacity);
        if self.temporary {
            config
        } else {
            config.path(&self.path)
        }
    }
}
