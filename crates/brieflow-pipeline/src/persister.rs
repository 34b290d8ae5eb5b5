// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable result documents under a project-time key and a job key.

use std::sync::Arc;

use brieflow_core::{BrieflowError, JobId, ObjectStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

pub const BRIEF_FILE: &str = "bundle.json";
pub const IMAGES_FILE: &str = "images.json";

pub struct ResultPersister {
    objects: Arc<dyn ObjectStore>,
}

impl ResultPersister {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Writes `document` to `{project_slug}/{timestamp}/{file}` and `{job_id}/{file}`.
    ///
    /// Returns both locations, project key first. Either write failing is an error.
    pub async fn persist<T: Serialize>(
        &self,
        project_name: &str,
        job_id: &JobId,
        file_name: &str,
        document: &T,
    ) -> Result<Vec<String>, BrieflowError> {
        let bytes = serde_json::to_vec_pretty(document)?;
        let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let locations = vec![
            format!("{}/{timestamp}/{file_name}", slugify(project_name)),
            job_location(job_id, file_name),
        ];
        for location in &locations {
            self.objects.put(location, bytes.clone()).await?;
        }
        info!(job_id = %job_id, locations = ?locations, "results persisted");
        Ok(locations)
    }

    /// Reads `{job_id}/{file}`. `None` when it was never written.
    pub async fn load<T: DeserializeOwned>(
        &self,
        job_id: &JobId,
        file_name: &str,
    ) -> Result<Option<T>, BrieflowError> {
        match self.objects.get(&job_location(job_id, file_name)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

pub fn job_location(job_id: &JobId, file_name: &str) -> String {
    format!("{job_id}/{file_name}")
}

/// Lowercase ASCII alphanumerics joined by single dashes; `project` when nothing survives.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "project".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use brieflow_test_utils::InMemoryObjectStore;
    use serde_json::json;

    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Widget Launch 2026!"), "widget-launch-2026");
        assert_eq!(slugify("  --Émile's  Shop-- "), "mile-s-shop");
        assert_eq!(slugify("???"), "project");
    }

    #[tokio::test]
    async fn writes_both_locations() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let persister = ResultPersister::new(objects.clone());
        let job = JobId("abc".into());
        let locations = persister
            .persist("Widget Launch", &job, BRIEF_FILE, &json!({"job_id": "abc"}))
            .await
            .unwrap();

        assert_eq!(locations.len(), 2);
        assert!(locations[0].starts_with("widget-launch/"));
        assert!(locations[0].ends_with("/bundle.json"));
        assert_eq!(locations[1], "abc/bundle.json");
        for location in &locations {
            assert_eq!(objects.get_json(location), Some(json!({"job_id": "abc"})));
        }

        let loaded: Option<serde_json::Value> = persister.load(&job, BRIEF_FILE).await.unwrap();
        assert_eq!(loaded, Some(json!({"job_id": "abc"})));
        let missing: Option<serde_json::Value> = persister.load(&job, IMAGES_FILE).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn write_failure_is_fatal() {
        let objects = Arc::new(InMemoryObjectStore::new());
        objects.set_fail_puts(true);
        let persister = ResultPersister::new(objects);
        let outcome = persister
            .persist("p", &JobId("abc".into()), BRIEF_FILE, &json!({}))
            .await;
        assert!(matches!(outcome, Err(BrieflowError::Storage { .. })));
    }
}
