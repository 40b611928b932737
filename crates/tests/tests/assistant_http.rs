use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use skybook_client::{HttpBackendConfig, HttpFlightBackend};
use skybook_core::{LocationCatalog, QueryResolver, ResolverConfig};
use skybook_dispatch::{ChatAssistant, CommandRegistry, Dispatcher};
use skybook_observability::DispatchMetrics;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn assistant(server: &MockServer) -> Result<ChatAssistant<HttpFlightBackend>> {
    let backend = HttpFlightBackend::new(
        HttpBackendConfig::default()
            .with_base_url(format!("{}/api", server.uri()))
            .with_timeout(Duration::from_secs(2)),
    )?;

    Ok(ChatAssistant::new(
        Arc::new(LocationCatalog::builtin()),
        QueryResolver::new(ResolverConfig::default()),
        Dispatcher::new(Arc::new(CommandRegistry::builtin())),
        Arc::new(backend),
        DispatchMetrics::shared(),
    )
    .with_search_limit(2)
    .with_today(NaiveDate::from_ymd_opt(2025, 11, 19).unwrap()))
}

fn offer(flight_number: &str, price: i64) -> serde_json::Value {
    json!({
        "flight_number": flight_number,
        "origin_code": "SGN",
        "destination_code": "DAD",
        "departure_time": "2025-11-20T07:30:00",
        "price_amount": price
    })
}

#[tokio::test]
async fn relative_date_query_searches_and_truncates() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/flights/search"))
        .and(body_partial_json(json!({
            "origin_code": "SGN",
            "destination_code": "DAD",
            "departure_date": "2025-11-20",
            "limit": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flights": [offer("VJ620", 1_290_000), offer("VN120", 1_650_000), offer("QH150", 990_000)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let assistant = assistant(&server)?;
    let reply = assistant
        .handle_message("vé máy bay từ Sài Gòn đi Đà Nẵng ngày mai")
        .await;

    assert_eq!(reply.decision.kind(), "structured_search");
    assert!(reply.error.is_none());
    assert_eq!(reply.offers.len(), 2);
    assert!(reply.text.starts_with("Tìm thấy 2 chuyến bay SGN → DAD ngày 20/11/2025"));
    assert!(reply.text.contains("1.290.000 VND"));
    Ok(())
}

#[tokio::test]
async fn backend_status_becomes_reply_text() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/flights/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let assistant = assistant(&server)?;
    let reply = assistant
        .handle_message("from Hanoi to Bangkok on 2025-12-05")
        .await;

    assert_eq!(reply.decision.kind(), "structured_search");
    assert!(reply.text.contains("error 503"));
    assert!(reply.error.is_some());

    let snapshot = assistant.metrics().snapshot();
    assert_eq!(snapshot.messages_total, 1);
    assert_eq!(snapshot.structured_search_total, 1);
    assert_eq!(snapshot.backend_failures_total, 1);
    Ok(())
}

#[tokio::test]
async fn topic_question_goes_to_chat_endpoint() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "context": { "topic": "family" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "Nên chọn chuyến bay buổi sáng cho trẻ nhỏ.",
            "suggestions": ["search SGN PQC 2025-12-20"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let assistant = assistant(&server)?;
    let reply = assistant
        .handle_message("tư vấn du lịch cho gia đình có trẻ nhỏ")
        .await;

    assert_eq!(reply.decision.kind(), "rule_command");
    assert_eq!(reply.text, "Nên chọn chuyến bay buổi sáng cho trẻ nhỏ.");
    assert_eq!(reply.suggestions, vec!["search SGN PQC 2025-12-20"]);
    Ok(())
}

#[tokio::test]
async fn reserved_test_command_never_reaches_the_backend() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let assistant = assistant(&server)?;
    let reply = assistant.handle_message("test timeout").await;

    assert_eq!(reply.decision.kind(), "rule_command");
    assert_eq!(reply.error.as_deref(), Some("backend request timed out"));
    Ok(())
}
