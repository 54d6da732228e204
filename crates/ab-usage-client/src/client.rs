//! AgenticBilling HTTP client implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;

use ab_usage_core::{TransportError, UsageEvent, UsageTransport};

use crate::error::ClientError;
use crate::types::{ApiErrorBody, GroupedQuery, GroupedReport, ReportPage};

/// AgenticBilling API client.
///
/// Submits CloudEvents usage envelopes and fetches aggregated usage and
/// cost reports. Every request carries the `x-api-key` header.
#[derive(Debug, Clone)]
pub struct UsageApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    provider: String,
}

/// Optional client settings.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl UsageApiClient {
    /// Create a new client with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        provider: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_options(base_url, api_key, provider, &ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        provider: impl Into<String>,
        options: &ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            provider: provider.into(),
        })
    }

    /// The provider name sent with submissions.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Submit one usage event.
    ///
    /// The envelope is serialized straight from the typed event so the
    /// CloudEvents field order is preserved on the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the
    /// event.
    pub async fn submit_usage(
        &self,
        event: &UsageEvent,
    ) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/api/v1/cloudevents/usage", self.base_url);
        tracing::debug!(event_id = %event.id, %url, "submitting usage event");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .query(&[("provider", self.provider.as_str())])
            .json(event)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Usage records for one hour.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an
    /// error.
    pub async fn hourly_usage(
        &self,
        usage_hour: DateTime<Utc>,
    ) -> Result<ReportPage, ClientError> {
        self.get_report(
            "/api/v1/reports/usage/hourly",
            &[("usageHour".to_string(), ts(usage_hour))],
        )
        .await
    }

    /// Daily usage records for a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an
    /// error.
    pub async fn daily_usage(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ReportPage, ClientError> {
        self.get_report("/api/v1/reports/usage/daily", &range(from, to)).await
    }

    /// Grouped daily usage summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an
    /// error.
    pub async fn daily_usage_grouped(
        &self,
        query: &GroupedQuery,
    ) -> Result<GroupedReport, ClientError> {
        let mut params = range(query.from, query.to);
        params.push(("groupBy".to_string(), query.group_by.clone()));
        params.push(("take".to_string(), query.take.to_string()));
        for (name, value) in [
            ("providerCsv", &query.provider_csv),
            ("serviceCsv", &query.service_csv),
            ("meterIdCsv", &query.meter_id_csv),
        ] {
            if let Some(value) = value {
                params.push((name.to_string(), value.clone()));
            }
        }
        self.get_report("/api/v1/reports/usage/daily-grouped", &params).await
    }

    /// Daily cost records for a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an
    /// error.
    pub async fn daily_costs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ReportPage, ClientError> {
        self.get_report("/api/v1/reports/priced/daily", &range(from, to)).await
    }

    /// Monthly cost summary grouped by tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an
    /// error.
    pub async fn monthly_tenant_costs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ReportPage, ClientError> {
        self.get_report("/api/v1/reports/priced/monthly/tenantSummary", &range(from, to))
            .await
    }

    /// Monthly cost summary grouped by tenant and service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an
    /// error.
    pub async fn monthly_service_costs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ReportPage, ClientError> {
        self.get_report(
            "/api/v1/reports/priced/monthly/tenantServiceSummary",
            &range(from, to),
        )
        .await
    }

    async fn get_report<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "fetching report");

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .query(params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map_or(body, |parsed| parsed.error.message);

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl UsageTransport for UsageApiClient {
    async fn send(&self, event: &UsageEvent) -> Result<serde_json::Value, TransportError> {
        self.submit_usage(event).await.map_err(TransportError::from)
    }
}

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<(String, String)> {
    vec![
        ("fromDate".to_string(), ts(from)),
        ("toDate".to_string(), ts(to)),
    ]
}
