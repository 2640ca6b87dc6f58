//! Product and service models.
//!
//! Products and services share one shape and live in separate tables.

use serde::{Deserialize, Serialize};

use super::Category;

/// Which admin-managed catalog an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Product,
    Service,
}

impl CatalogKind {
    pub fn table(self) -> &'static str {
        match self {
            CatalogKind::Product => "products",
            CatalogKind::Service => "services",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CatalogKind::Product => "Product",
            CatalogKind::Service => "Service",
        }
    }

    pub fn category(self) -> Category {
        match self {
            CatalogKind::Product => Category::Product,
            CatalogKind::Service => Category::Service,
        }
    }
}

/// A product or service managed from the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Opaque image-host identifier
    pub main_image: String,
    pub created_at: String,
    pub updated_at: String,
}

pub type Product = CatalogItem;
pub type Service = CatalogItem;

/// Request body for creating a product or service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCatalogItemRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub main_image: String,
}

/// Request body for updating a product or service. Absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCatalogItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
}
