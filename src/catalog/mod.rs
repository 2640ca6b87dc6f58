//! Static public catalog served to the marketing pages.
//!
//! The public product and service pages read a JSON file shipped with the
//! site, separate from the admin-managed tables.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// One product or service as shown on the public pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEntry {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub main_image: String,
    /// Listed under "upcoming services" rather than the live catalog
    #[serde(default)]
    pub upcoming: bool,
    /// Page-specific extras (features, specs, gallery, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The whole catalog file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicCatalog {
    #[serde(default)]
    pub products: Vec<PublicEntry>,
    #[serde(default)]
    pub services: Vec<PublicEntry>,
}

impl PublicCatalog {
    /// Load the catalog file. A missing file yields an empty catalog.
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Catalog file {:?} not found; serving an empty catalog", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "Failed to read catalog {:?}: {}",
                    path, e
                )))
            }
        };

        serde_json::from_str(&text)
            .map_err(|e| AppError::Internal(format!("Invalid catalog {:?}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = PublicCatalog::load(&dir.path().join("none.json")).await.unwrap();
        assert_eq!(catalog, PublicCatalog::default());
    }

    #[tokio::test]
    async fn test_keeps_extra_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(
            &path,
            r#"{"services": [{"id": 3, "title": "Crop spraying", "upcoming": true, "acres": 40}]}"#,
        )
        .await
        .unwrap();

        let catalog = PublicCatalog::load(&path).await.unwrap();
        assert!(catalog.products.is_empty());
        let entry = &catalog.services[0];
        assert!(entry.upcoming);
        assert_eq!(entry.extra["acres"], 40);
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(PublicCatalog::load(&path).await.is_err());
    }
}
