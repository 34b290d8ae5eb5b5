// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for the Brieflow pipeline.
//!
//! A WAL-mode SQLite database with embedded refinery migrations backs the
//! two job status stores. Bundles and cache entries live in a filesystem
//! object store.

pub mod database;
pub mod object_store;
pub mod status;

pub use database::Database;
pub use object_store::FilesystemObjectStore;
pub use status::{JobRow, KvStatusStore, RelationalStatusStore};

use brieflow_config::model::StorageConfig;
use brieflow_core::BrieflowError;

/// Everything the storage config describes, opened and migrated.
pub struct Storage {
    pub database: Database,
    pub objects: FilesystemObjectStore,
}

impl Storage {
    pub async fn open(config: &StorageConfig) -> Result<Self, BrieflowError> {
        let database = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self {
            database,
            objects: FilesystemObjectStore::new(&config.object_root),
        })
    }
}
