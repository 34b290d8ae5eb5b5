// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only reference image library on the local filesystem.
//!
//! The catalog is a JSON array of `{ "id", "description", "path" }` with
//! paths relative to the catalog file. Uploaded references live in a
//! separate directory as `<id>.<ext>`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use brieflow_config::model::LibraryConfig;
use brieflow_core::types::ReferenceImage;
use brieflow_core::{BrieflowError, ImageInput, ReferenceCatalog};
use serde::Deserialize;
use tracing::{debug, warn};

const EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
];

#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    id: String,
    description: String,
    path: PathBuf,
}

pub struct FilesystemReferenceCatalog {
    entries: Vec<ReferenceImage>,
    paths: HashMap<String, PathBuf>,
    uploads_dir: PathBuf,
}

impl FilesystemReferenceCatalog {
    /// Reads the catalog file. A missing catalog yields an empty library.
    pub async fn open(config: &LibraryConfig) -> Result<Self, BrieflowError> {
        let catalog_path = Path::new(&config.catalog_path);
        let entries: Vec<CatalogEntry> = match tokio::fs::read(catalog_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %catalog_path.display(), "reference catalog not found, library is empty");
                Vec::new()
            }
            Err(e) => return Err(BrieflowError::storage(e)),
        };
        let base = catalog_path.parent().unwrap_or(Path::new(""));
        debug!(entries = entries.len(), "reference catalog loaded");
        Ok(Self::from_entries(entries, base, PathBuf::from(&config.uploads_dir)))
    }

    fn from_entries(entries: Vec<CatalogEntry>, base: &Path, uploads_dir: PathBuf) -> Self {
        let paths = entries
            .iter()
            .map(|e| (e.id.clone(), base.join(&e.path)))
            .collect();
        let entries = entries
            .into_iter()
            .map(|e| ReferenceImage {
                id: e.id,
                description: e.description,
            })
            .collect();
        Self {
            entries,
            paths,
            uploads_dir,
        }
    }

    async fn find_upload(&self, id: &str) -> Result<PathBuf, BrieflowError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(BrieflowError::Validation(format!(
                "invalid reference id `{id}`"
            )));
        }
        for (ext, _) in EXTENSIONS {
            let candidate = self.uploads_dir.join(format!("{id}.{ext}"));
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Ok(candidate);
            }
        }
        Err(BrieflowError::Validation(format!(
            "unknown reference image `{id}`"
        )))
    }
}

fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or("image/png")
}

#[async_trait]
impl ReferenceCatalog for FilesystemReferenceCatalog {
    fn library(&self) -> Vec<ReferenceImage> {
        self.entries.clone()
    }

    async fn load(&self, id: &str) -> Result<ImageInput, BrieflowError> {
        let path = match self.paths.get(id) {
            Some(path) => path.clone(),
            None => self.find_upload(id).await?,
        };
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(BrieflowError::storage)?;
        Ok(ImageInput::from_bytes(media_type_for(&path), &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fixture() -> (tempfile::TempDir, FilesystemReferenceCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        let uploads = dir.path().join("uploads");
        std::fs::create_dir_all(lib.join("img")).unwrap();
        std::fs::create_dir_all(&uploads).unwrap();
        std::fs::write(lib.join("img/kitchen.jpg"), b"jpeg-bytes").unwrap();
        std::fs::write(uploads.join("u-1.webp"), b"webp-bytes").unwrap();
        std::fs::write(
            lib.join("catalog.json"),
            r#"[{"id": "lib-kitchen", "description": "bright kitchen counter", "path": "img/kitchen.jpg"}]"#,
        )
        .unwrap();
        let config = LibraryConfig {
            catalog_path: lib.join("catalog.json").display().to_string(),
            uploads_dir: uploads.display().to_string(),
            ..LibraryConfig::default()
        };
        let catalog = FilesystemReferenceCatalog::open(&config).await.unwrap();
        (dir, catalog)
    }

    #[tokio::test]
    async fn lists_library_entries() {
        let (_dir, catalog) = fixture().await;
        let library = catalog.library();
        assert_eq!(library.len(), 1);
        assert_eq!(library[0].id, "lib-kitchen");
        assert_eq!(library[0].description, "bright kitchen counter");
    }

    #[tokio::test]
    async fn loads_library_and_uploaded_images() {
        let (_dir, catalog) = fixture().await;
        let lib = catalog.load("lib-kitchen").await.unwrap();
        assert_eq!(lib.media_type, "image/jpeg");
        assert_eq!(lib.decode().unwrap(), b"jpeg-bytes");

        let upload = catalog.load("u-1").await.unwrap();
        assert_eq!(upload.media_type, "image/webp");
    }

    #[tokio::test]
    async fn unknown_and_traversal_ids_are_rejected() {
        let (_dir, catalog) = fixture().await;
        assert!(catalog.load("missing").await.is_err());
        assert!(catalog.load("../lib/img/kitchen").await.is_err());
    }

    #[tokio::test]
    async fn missing_catalog_is_empty_library() {
        let config = LibraryConfig {
            catalog_path: "/nonexistent/brieflow/catalog.json".into(),
            ..LibraryConfig::default()
        };
        let catalog = FilesystemReferenceCatalog::open(&config).await.unwrap();
        assert!(catalog.library().is_empty());
    }
}
