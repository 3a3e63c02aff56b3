//! Local persistence: the ledger and the photo blob store.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <root>/
//!   ledger.sqlite    # Append-only ledger rows
//!   blobs/           # Uploaded photos, one file per upload
//! ```
//!
//! The capture flow only talks to the [`Ledger`] and [`BlobStore`] traits;
//! [`Storage`] is the local implementation of both.

mod blobs;
mod ledger;

use std::{fs, io, path::PathBuf};

use crate::model::LedgerRow;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt data: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Append-only record store for finalized captures.
pub trait Ledger: Send + Sync {
    /// Appends one row. Rows are never updated or deleted.
    fn append_row(&self, row: &LedgerRow) -> Result<()>;
}

/// Durable photo storage.
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `name` and returns a publicly readable URI.
    fn upload(&self, bytes: &[u8], name: &str) -> Result<String>;
}

/// Local file-based storage: an `SQLite` ledger plus a blob directory.
pub struct Storage {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl Storage {
    /// Creates a storage instance rooted at the given directory.
    ///
    /// The directory tree is created if missing and the ledger table is
    /// provisioned with its header columns.
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("blobs"))?;
        let storage = Self {
            root,
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        };
        storage.provision_ledger()?;
        Ok(storage)
    }

    /// Returns the default storage root: `~/.fieldbook/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fieldbook"))
    }

    fn ledger_path(&self) -> PathBuf {
        self.root.join("ledger.sqlite")
    }

    fn blob_dir(&self) -> PathBuf {
        self.root.join("blobs")
    }
}
