//! Audit log model.

use serde::{Deserialize, Serialize};

/// One entry of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    /// Acting admin
    pub username: String,
    pub change: String,
    pub created_at: String,
}
