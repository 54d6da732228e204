//! HTTP round-trip tests against a mock AgenticBilling API.

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ab_usage_client::{ClientError, GroupedQuery, UsageApiClient};
use ab_usage_core::{new_template, SequenceIds, TemplateKind, UsageTransport};

const API_KEY: &str = "test-key";
const PROVIDER: &str = "AgenticBilling.AI";

fn client(server: &MockServer) -> UsageApiClient {
    UsageApiClient::new(server.uri(), API_KEY, PROVIDER).unwrap()
}

#[tokio::test]
async fn submit_usage_posts_the_envelope() {
    let server = MockServer::start().await;
    let event = new_template(TemplateKind::AiChat, PROVIDER, &SequenceIds::new("evt"), &[])
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/cloudevents/usage"))
        .and(query_param("provider", PROVIDER))
        .and(header("x-api-key", API_KEY))
        .and(body_partial_json(json!({
            "specversion": "1.0",
            "type": "ai.agenticbilling.usage.v1",
            "data": {
                "service": "ai.chat",
                "tenantId": "org/acme",
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accepted": true,
            "eventId": "evt-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server).submit_usage(&event).await.unwrap();
    assert_eq!(response["accepted"], json!(true));
}

#[tokio::test]
async fn transport_impl_delegates_to_submit() {
    let server = MockServer::start().await;
    let event = new_template(TemplateKind::Storage, PROVIDER, &SequenceIds::new("evt"), &[])
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/cloudevents/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accepted": true })))
        .mount(&server)
        .await;

    let api = client(&server);
    let transport: &dyn UsageTransport = &api;
    let response = transport.send(&event).await.unwrap();
    assert_eq!(response["accepted"], json!(true));
}

#[tokio::test]
async fn structured_api_error_is_mapped() {
    let server = MockServer::start().await;
    let event = new_template(TemplateKind::SaasApi, PROVIDER, &SequenceIds::new("evt"), &[])
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/cloudevents/usage"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": { "code": "quota_exceeded", "message": "usage quota exceeded" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).submit_usage(&event).await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 402);
            assert_eq!(message, "usage quota exceeded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unstructured_error_body_is_passed_through() {
    let server = MockServer::start().await;
    let event = new_template(TemplateKind::BasicCompute, PROVIDER, &SequenceIds::new("evt"), &[])
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/cloudevents/usage"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server).submit_usage(&event).await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn hourly_usage_sends_the_hour_and_parses_the_page() {
    let server = MockServer::start().await;
    let hour = Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/reports/usage/hourly"))
        .and(query_param("usageHour", "2025-06-01T14:00:00Z"))
        .and(header("x-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "service": "ai.chat", "quantity": 1500, "unit": "tokens" }
            ],
            "totalCount": 1
        })))
        .mount(&server)
        .await;

    let page = client(&server).hourly_usage(hour).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_count, Some(1));
    assert_eq!(page.items[0]["service"], json!("ai.chat"));
}

#[tokio::test]
async fn daily_usage_sends_the_range() {
    let server = MockServer::start().await;
    let from = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2025, 6, 7, 23, 59, 59).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/reports/usage/daily"))
        .and(query_param("fromDate", "2025-06-01T00:00:00Z"))
        .and(query_param("toDate", "2025-06-07T23:59:59Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let page = client(&server).daily_usage(from, to).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, None);
}

#[tokio::test]
async fn grouped_query_includes_filters_only_when_set() {
    let server = MockServer::start().await;
    let from = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2025, 6, 7, 0, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/reports/usage/daily-grouped"))
        .and(query_param("groupBy", GroupedQuery::DEFAULT_GROUP_BY))
        .and(query_param("take", "1000"))
        .and(query_param("serviceCsv", "ai.chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "rows": [
                { "usageDay": "2025-06-01", "service": "ai.chat", "quantity": 2250 }
            ],
            "metadata": { "groupBy": GroupedQuery::DEFAULT_GROUP_BY }
        })))
        .mount(&server)
        .await;

    let mut query = GroupedQuery::new(from, to);
    query.service_csv = Some("ai.chat".to_string());

    let report = client(&server).daily_usage_grouped(&query).await.unwrap();
    assert!(report.success);
    assert_eq!(report.rows.len(), 1);
    assert_eq!(
        report.metadata.group_by.as_deref(),
        Some(GroupedQuery::DEFAULT_GROUP_BY)
    );
}

#[tokio::test]
async fn monthly_cost_reports_hit_their_endpoints() {
    let server = MockServer::start().await;
    let from = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/reports/priced/monthly/tenantSummary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [ { "usageMonth": "2025-05", "tenantId": "org/acme", "totalCost": 12.5 } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/reports/priced/monthly/tenantServiceSummary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [ { "usageMonth": "2025-05", "service": "ai.chat", "totalCost": 7.25 } ]
        })))
        .mount(&server)
        .await;

    let api = client(&server);
    let tenants = api.monthly_tenant_costs(from, to).await.unwrap();
    assert_eq!(tenants.items[0]["tenantId"], json!("org/acme"));

    let services = api.monthly_service_costs(from, to).await.unwrap();
    assert_eq!(services.items[0]["service"], json!("ai.chat"));
}
