// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed object store.
//!
//! Keys are `/`-separated relative paths under a root directory. Writes go
//! to a temporary sibling first and are renamed into place, so readers never
//! observe a half-written bundle.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use brieflow_core::{BrieflowError, ObjectStore};
use tracing::debug;

pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root, rejecting anything that could escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf, BrieflowError> {
        if key.is_empty() || key.starts_with('/') || key.contains('\\') {
            return Err(BrieflowError::Security(format!("invalid object key `{key}`")));
        }
        let relative = Path::new(key);
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." {
                return Err(BrieflowError::Security(format!(
                    "object key `{key}` has an empty segment"
                )));
            }
        }
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(BrieflowError::Security(format!(
                "object key `{key}` escapes the store root"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrieflowError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BrieflowError::storage(e)),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), BrieflowError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BrieflowError::storage)?;
        }
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(BrieflowError::storage)?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(BrieflowError::storage(e));
        }
        debug!(key, size = bytes.len(), "object written");
        Ok(())
    }
}
