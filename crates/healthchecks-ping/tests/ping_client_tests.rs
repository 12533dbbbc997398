//! Integration tests for the ping client.
//!
//! wiremock stands in for the ping API so the GET/POST selection, response
//! echo and error classification can be checked end to end.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use healthchecks_ping::{ping_with, HealthchecksError, PingAction, PingClient, PingClientOptions, Payload};

const UUID: &str = "3c1169a0-7b50-11ea-873d-3c970e75c219";
const TEXT_CONTENT: &str = "text/plain; charset=utf-8";

fn options(server: &MockServer) -> PingClientOptions {
    PingClientOptions::new(UUID).with_base_url(server.uri())
}

fn client(server: &MockServer, return_response: bool) -> PingClient {
    PingClient::new(options(server).with_return_response(return_response)).unwrap()
}

async fn mount_ok(server: &MockServer, http_method: &str, route: String) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_echoes_response_when_enabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", UUID)))
        .and(header("user-agent", healthchecks_core::USER_AGENT))
        .and(header("accept", TEXT_CONTENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = client(&mock_server, true).success(Payload::Empty).await.unwrap();
    assert_eq!(response.as_deref(), Some("OK"));
}

#[tokio::test]
async fn test_success_returns_nothing_when_echo_disabled() {
    let mock_server = MockServer::start().await;
    mount_ok(&mock_server, "GET", format!("/{}", UUID)).await;

    let response = client(&mock_server, false).success(Payload::Empty).await.unwrap();
    assert_eq!(response, None);
}

#[tokio::test]
async fn test_success_posts_text_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}", UUID)))
        .and(header("content-type", TEXT_CONTENT))
        .and(body_string("some text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = client(&mock_server, true).success("some text").await.unwrap();
    assert_eq!(response.as_deref(), Some("OK"));
}

#[tokio::test]
async fn test_empty_string_payload_is_sent_as_get() {
    let mock_server = MockServer::start().await;
    mount_ok(&mock_server, "GET", format!("/{}", UUID)).await;

    client(&mock_server, false).success("").await.unwrap();
}

#[tokio::test]
async fn test_fail_and_start_paths() {
    let mock_server = MockServer::start().await;
    mount_ok(&mock_server, "GET", format!("/{}/fail", UUID)).await;
    mount_ok(&mock_server, "GET", format!("/{}/start", UUID)).await;

    Mock::given(method("POST"))
        .and(path(format!("/{}/fail", UUID)))
        .and(body_string("exit code 2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, true);
    assert_eq!(client.fail(None::<&str>).await.unwrap().as_deref(), Some("OK"));
    assert_eq!(client.fail("exit code 2").await.unwrap().as_deref(), Some("OK"));
    assert_eq!(client.start().await.unwrap().as_deref(), Some("OK"));
}

#[tokio::test]
async fn test_invalid_payload_never_reaches_the_network() {
    let mock_server = MockServer::start().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, true);

    let err = client.success(json!({})).await.unwrap_err();
    assert!(matches!(err, HealthchecksError::InvalidPayload { .. }));
    assert_eq!(err.to_string(), "The success payload must be a string");

    let err = client.fail(json!(["a"])).await.unwrap_err();
    assert_eq!(err.to_string(), "The fail payload must be a string");
}

#[tokio::test]
async fn test_not_found_is_status_code_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", UUID)))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    match client(&mock_server, true).success(Payload::Empty).await.unwrap_err() {
        HealthchecksError::StatusCode(err) => {
            assert_eq!(err.status_code, 404);
            assert_eq!(err.status_message.as_deref(), Some("Not Found"));
            assert_eq!(err.body, json!("not found"));
        }
        other => panic!("Expected StatusCodeError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_is_request_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}/start", UUID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("OK")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = PingClient::new(options(&mock_server).with_timeout(Duration::from_millis(50))).unwrap();
    let err = client.start().await.unwrap_err();
    assert!(err.is_request_error(), "got {:?}", err);
}

#[tokio::test]
async fn test_connection_refused_is_request_error() {
    let options = PingClientOptions::new(UUID).with_base_url("http://127.0.0.1:1");
    let err = PingClient::new(options).unwrap().start().await.unwrap_err();
    assert!(err.is_request_error(), "got {:?}", err);
}

#[tokio::test]
async fn test_ping_with_sends_the_requested_action() {
    let mock_server = MockServer::start().await;
    mount_ok(&mock_server, "GET", format!("/{}", UUID)).await;

    Mock::given(method("POST"))
        .and(path(format!("/{}/fail", UUID)))
        .and(body_string("boom"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let echo = options(&mock_server).with_return_response(true);

    let response = ping_with(echo.clone(), PingAction::Fail, "boom").await.unwrap();
    assert_eq!(response.as_deref(), Some("OK"));

    let response = ping_with(echo, PingAction::from("anything"), Payload::Empty)
        .await
        .unwrap();
    assert_eq!(response.as_deref(), Some("OK"));
}

#[tokio::test]
async fn test_ping_with_rejects_bad_uuid() {
    let err = ping_with(PingClientOptions::new("not-a-uuid"), PingAction::Success, Payload::Empty)
        .await
        .unwrap_err();
    assert!(matches!(err, HealthchecksError::Config(_)));
}
