//! Customer query model, submitted through the public contact forms.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Contact form variant a query was submitted through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    ProductGeneral,
    ProductSecond,
    ProductThird,
    ProductFourth,
    ProductFifth,
    ServiceFirst,
    ServiceSecond,
    ServiceThird,
    ServiceFourth,
    ServiceFifth,
    ServiceGeneral,
}

impl QueryType {
    pub const ALL: [QueryType; 11] = [
        QueryType::ProductGeneral,
        QueryType::ProductSecond,
        QueryType::ProductThird,
        QueryType::ProductFourth,
        QueryType::ProductFifth,
        QueryType::ServiceFirst,
        QueryType::ServiceSecond,
        QueryType::ServiceThird,
        QueryType::ServiceFourth,
        QueryType::ServiceFifth,
        QueryType::ServiceGeneral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::ProductGeneral => "product_general",
            QueryType::ProductSecond => "product_second",
            QueryType::ProductThird => "product_third",
            QueryType::ProductFourth => "product_fourth",
            QueryType::ProductFifth => "product_fifth",
            QueryType::ServiceFirst => "service_first",
            QueryType::ServiceSecond => "service_second",
            QueryType::ServiceThird => "service_third",
            QueryType::ServiceFourth => "service_fourth",
            QueryType::ServiceFifth => "service_fifth",
            QueryType::ServiceGeneral => "service_general",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Resolve `/api/query/{group}/{form}`.
    pub fn from_route(group: &str, form: &str) -> Option<Self> {
        let query_type = match (group, form) {
            ("products", "gen") => QueryType::ProductGeneral,
            ("products", "second") => QueryType::ProductSecond,
            ("products", "third") => QueryType::ProductThird,
            ("products", "fourth") => QueryType::ProductFourth,
            ("products", "fifth") => QueryType::ProductFifth,
            ("services", "first") => QueryType::ServiceFirst,
            ("services", "second") => QueryType::ServiceSecond,
            ("services", "third") => QueryType::ServiceThird,
            ("services", "fourth") => QueryType::ServiceFourth,
            ("services", "fifth") => QueryType::ServiceFifth,
            ("services", "general") => QueryType::ServiceGeneral,
            _ => return None,
        };
        Some(query_type)
    }

    /// Submission path relative to `/api/query/`.
    pub fn route(&self) -> &'static str {
        match self {
            QueryType::ProductGeneral => "products/gen",
            QueryType::ProductSecond => "products/second",
            QueryType::ProductThird => "products/third",
            QueryType::ProductFourth => "products/fourth",
            QueryType::ProductFifth => "products/fifth",
            QueryType::ServiceFirst => "services/first",
            QueryType::ServiceSecond => "services/second",
            QueryType::ServiceThird => "services/third",
            QueryType::ServiceFourth => "services/fourth",
            QueryType::ServiceFifth => "services/fifth",
            QueryType::ServiceGeneral => "services/general",
        }
    }

    /// Detail forms go through CAPTCHA and email OTP before they are stored.
    pub fn requires_verification(&self) -> bool {
        !matches!(self, QueryType::ProductGeneral | QueryType::ServiceGeneral)
    }
}

/// Status given to freshly submitted queries.
pub const DEFAULT_QUERY_STATUS: &str = "pending";

/// A stored customer query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "querytype")]
    pub query_type: QueryType,
    /// Free-text workflow state (pending, approved, rejected, completed, ...)
    pub status: String,
    /// Form-specific payload
    pub data: Map<String, Value>,
    pub created_at: String,
}

/// Request body for the public query submission endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitQueryRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Request body for `PUT /api/query/updateStatus/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_resolve_back() {
        for query_type in QueryType::ALL {
            let (group, form) = query_type.route().split_once('/').unwrap();
            assert_eq!(QueryType::from_route(group, form), Some(query_type));
            assert_eq!(QueryType::from_str(query_type.as_str()), Some(query_type));
        }
        assert_eq!(QueryType::from_route("products", "general"), None);
        assert_eq!(QueryType::from_route("drones", "first"), None);
    }

    #[test]
    fn test_only_detail_forms_need_verification() {
        assert!(!QueryType::ProductGeneral.requires_verification());
        assert!(!QueryType::ServiceGeneral.requires_verification());
        assert!(QueryType::ProductThird.requires_verification());
        assert!(QueryType::ServiceFirst.requires_verification());
    }

    #[test]
    fn test_querytype_field_name() {
        let value = serde_json::to_value(Query {
            id: "q1".into(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
            query_type: QueryType::ServiceSecond,
            status: DEFAULT_QUERY_STATUS.into(),
            data: Map::new(),
            created_at: "2024-01-01T00:00:00Z".into(),
        })
        .unwrap();
        assert_eq!(value["querytype"], "service_second");
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00Z");
    }
}
