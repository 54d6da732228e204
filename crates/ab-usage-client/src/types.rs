//! Response and query types for the AgenticBilling reporting API.
//!
//! Report rows are deliberately loose (`serde_json::Value`): the server's
//! row schema varies per report and per grouping, and the tool only
//! renders and exports them.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A page of report records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    /// Records in this page.
    #[serde(default)]
    pub items: Vec<serde_json::Value>,

    /// Total number of records on the server, when reported.
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// A grouped usage report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupedReport {
    /// Whether the server accepted the query.
    #[serde(default)]
    pub success: bool,

    /// Aggregated rows.
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,

    /// Echo of the query that produced the rows.
    #[serde(default)]
    pub metadata: GroupedMetadata,
}

/// Query echo attached to a grouped report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedMetadata {
    /// Start of the reported range.
    #[serde(default)]
    pub from_date: Option<String>,

    /// End of the reported range.
    #[serde(default)]
    pub to_date: Option<String>,

    /// Grouping columns, comma separated.
    #[serde(default)]
    pub group_by: Option<String>,
}

/// Parameters for the daily-grouped usage report.
#[derive(Debug, Clone)]
pub struct GroupedQuery {
    /// Start of the range (inclusive).
    pub from: DateTime<Utc>,

    /// End of the range (inclusive).
    pub to: DateTime<Utc>,

    /// Grouping columns, comma separated.
    pub group_by: String,

    /// Maximum number of rows to return.
    pub take: u32,

    /// Restrict to these providers (comma separated), if set.
    pub provider_csv: Option<String>,

    /// Restrict to these services (comma separated), if set.
    pub service_csv: Option<String>,

    /// Restrict to these meter IDs (comma separated), if set.
    pub meter_id_csv: Option<String>,
}

impl GroupedQuery {
    /// Default grouping columns.
    pub const DEFAULT_GROUP_BY: &'static str = "UsageDay,Provider,Service,MeterId,Unit";

    /// A query over `from..=to` with the default grouping and row cap.
    #[must_use]
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            group_by: Self::DEFAULT_GROUP_BY.to_string(),
            take: 1000,
            provider_csv: None,
            service_csv: None,
            meter_id_csv: None,
        }
    }
}

/// Structured error body returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

/// The `error` object within an [`ApiErrorBody`].
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}
