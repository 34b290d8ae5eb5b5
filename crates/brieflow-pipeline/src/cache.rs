// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed cache for page analysis and deep research.
//!
//! Entries live in the object store under `research-cache/{key}.json`. Every
//! failure mode (I/O, undecodable JSON, stale schema version) reads as a
//! miss; writes never fail the caller. Concurrent jobs may race on the same
//! key and the last write wins.

use std::sync::Arc;

use brieflow_config::model::CacheConfig;
use brieflow_core::brief::ResearchArtifacts;
use brieflow_core::ObjectStore;
use brieflow_core::types::now_timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

const PREFIX: &str = "research-cache";

/// One cached research result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub schema_version: u32,
    pub source_url: String,
    #[serde(default)]
    pub product_name: Option<String>,
    pub created_at: String,
    pub artifacts: ResearchArtifacts,
}

pub struct ResearchCache {
    objects: Arc<dyn ObjectStore>,
    enabled: bool,
    schema_version: u32,
}

impl ResearchCache {
    pub fn new(objects: Arc<dyn ObjectStore>, config: &CacheConfig) -> Self {
        Self {
            objects,
            enabled: config.enabled,
            schema_version: config.schema_version,
        }
    }

    /// Object-store key of the entry for these inputs.
    pub fn object_key(source_url: &str, product_name: Option<&str>) -> String {
        format!("{PREFIX}/{}.json", cache_key(source_url, product_name))
    }

    pub async fn get(
        &self,
        source_url: &str,
        product_name: Option<&str>,
    ) -> Option<ResearchArtifacts> {
        if !self.enabled {
            return None;
        }
        let key = Self::object_key(source_url, product_name);
        let bytes = match self.objects.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %key, "research cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "research cache read failed, treating as miss");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "undecodable research cache entry, treating as miss");
                return None;
            }
        };
        if entry.schema_version != self.schema_version {
            debug!(
                key = %key,
                found = entry.schema_version,
                current = self.schema_version,
                "stale research cache entry"
            );
            return None;
        }
        debug!(key = %key, "research cache hit");
        Some(entry.artifacts)
    }

    pub async fn put(
        &self,
        source_url: &str,
        product_name: Option<&str>,
        artifacts: &ResearchArtifacts,
    ) {
        if !self.enabled {
            return;
        }
        let entry = CacheEntry {
            cache_key: cache_key(source_url, product_name),
            schema_version: self.schema_version,
            source_url: source_url.to_string(),
            product_name: product_name.map(str::to_string),
            created_at: now_timestamp(),
            artifacts: artifacts.clone(),
        };
        let key = format!("{PREFIX}/{}.json", entry.cache_key);
        let bytes = match serde_json::to_vec_pretty(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode research cache entry");
                return;
            }
        };
        if let Err(e) = self.objects.put(&key, bytes).await {
            warn!(key = %key, error = %e, "research cache write failed");
        }
    }
}

/// sha256 hex over the normalized URL, plus `|` and the normalized product name when present.
pub fn cache_key(source_url: &str, product_name: Option<&str>) -> String {
    let mut material = normalize_url(source_url);
    if let Some(product) = product_name.map(normalize_product).filter(|p| !p.is_empty()) {
        material.push('|');
        material.push_str(&product);
    }
    hex::encode(Sha256::digest(material.as_bytes()))
}

/// Lowercases scheme and host, drops the fragment and a trailing slash, keeps the query.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = url::Url::parse(trimmed) else {
        return trimmed.to_lowercase();
    };
    url.set_fragment(None);
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
        if url.path().is_empty() {
            url.set_path("/");
        }
    }
    url.to_string()
}

pub fn normalize_product(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use brieflow_core::brief::PageAnalysis;
    use brieflow_test_utils::InMemoryObjectStore;
    use proptest::prelude::*;

    use super::*;

    fn artifacts() -> ResearchArtifacts {
        ResearchArtifacts {
            page_analysis: PageAnalysis {
                product_name: "Widget".into(),
                product_summary: "A widget".into(),
                key_benefits: vec![],
                price_points: vec![],
                audience_hints: vec![],
            },
            research_prompt: "research widgets".into(),
            research_document: "widgets are great".into(),
        }
    }

    fn cache(objects: Arc<InMemoryObjectStore>, version: u32) -> ResearchCache {
        ResearchCache::new(
            objects,
            &CacheConfig {
                enabled: true,
                schema_version: version,
            },
        )
    }

    #[test]
    fn url_normalization() {
        assert_eq!(
            normalize_url("  HTTPS://Shop.Example.COM/Widget/#reviews "),
            "https://shop.example.com/Widget"
        );
        assert_eq!(normalize_url("https://shop.example.com"), "https://shop.example.com/");
        assert_eq!(
            normalize_url("https://shop.example.com/p?id=7&Ref=Ad"),
            "https://shop.example.com/p?id=7&Ref=Ad"
        );
        assert_eq!(normalize_url(" Not A Url "), "not a url");
    }

    #[test]
    fn equivalent_inputs_share_a_key() {
        assert_eq!(
            cache_key("https://shop.example.com/widget/", Some(" Widget ")),
            cache_key("HTTPS://SHOP.example.com/widget#top", Some("widget"))
        );
        assert_eq!(
            cache_key("https://shop.example.com/widget", Some("  ")),
            cache_key("https://shop.example.com/widget", None)
        );
    }

    proptest! {
        #[test]
        fn key_is_deterministic(url in "https://[a-z]{1,12}\\.com/[a-z0-9]{0,8}", product in "[a-zA-Z ]{0,16}") {
            let a = cache_key(&url, Some(&product));
            let b = cache_key(&url, Some(&product));
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.len(), 64);
        }

        #[test]
        fn different_products_give_different_keys(
            url in "https://[a-z]{1,12}\\.com/[a-z0-9]{0,8}",
            a in "[a-z]{1,10}",
            b in "[a-z]{1,10}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(cache_key(&url, Some(&a)), cache_key(&url, Some(&b)));
        }
    }

    #[tokio::test]
    async fn put_then_get_hits() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let cache = cache(objects.clone(), 1);
        cache.put("https://shop.example.com/w", Some("Widget"), &artifacts()).await;

        assert_eq!(
            cache.get("https://shop.example.com/w/", Some("widget")).await,
            Some(artifacts())
        );
        assert!(cache.get("https://shop.example.com/w", None).await.is_none());
        let key = ResearchCache::object_key("https://shop.example.com/w", Some("Widget"));
        assert!(objects.keys().contains(&key));
    }

    #[tokio::test]
    async fn version_mismatch_is_a_miss_and_keeps_the_entry() {
        let objects = Arc::new(InMemoryObjectStore::new());
        cache(objects.clone(), 1)
            .put("https://a.example", None, &artifacts())
            .await;

        let newer = cache(objects.clone(), 2);
        assert!(newer.get("https://a.example", None).await.is_none());
        assert_eq!(objects.keys().len(), 1);
    }

    #[tokio::test]
    async fn io_and_decode_failures_are_misses() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let cache = cache(objects.clone(), 1);

        let key = ResearchCache::object_key("https://a.example", None);
        objects.insert(&key, b"{garbage".to_vec());
        assert!(cache.get("https://a.example", None).await.is_none());

        objects.set_fail_gets(true);
        assert!(cache.get("https://a.example", None).await.is_none());

        objects.set_fail_puts(true);
        cache.put("https://b.example", None, &artifacts()).await;
    }

    #[tokio::test]
    async fn disabled_cache_never_reads_or_writes() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let cache = ResearchCache::new(
            objects.clone(),
            &CacheConfig {
                enabled: false,
                schema_version: 1,
            },
        );
        cache.put("https://a.example", None, &artifacts()).await;
        assert!(objects.keys().is_empty());
        assert!(cache.get("https://a.example", None).await.is_none());
    }
}
