//! Wiremock integration tests for [`CamaraClient`].
//!
//! These verify HTTP interaction, envelope decoding, and error mapping
//! against mocked upstream responses.

use std::time::Duration;

use jaburu::{CamaraClient, JaburuError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn get_decodes_envelope() {
    let mock_server = MockServer::start().await;

    let envelope = serde_json::json!({
        "dados": [{ "id": 204554, "nome": "Fulano da Silva" }],
        "links": [{ "rel": "self", "href": "/deputados" }]
    });

    Mock::given(method("GET"))
        .and(path("/deputados"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope))
        .mount(&mock_server)
        .await;

    let client = CamaraClient::with_base_url(mock_server.uri(), Duration::from_secs(5));
    let body = client.get("/deputados", &[]).await.expect("should succeed");

    assert_eq!(body["dados"][0]["id"], 204554);
    assert_eq!(body["links"][0]["rel"], "self");
}

#[tokio::test]
async fn get_forwards_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/deputados"))
        .and(query_param("siglaUf", "SP"))
        .and(query_param("ordem", "ASC"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "dados": [] })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CamaraClient::with_base_url(mock_server.uri(), Duration::from_secs(5));
    client
        .get("/deputados", &params(&[("siglaUf", "SP"), ("ordem", "ASC")]))
        .await
        .expect("should succeed");
}

#[tokio::test]
async fn not_found_maps_to_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/deputados/999999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = CamaraClient::with_base_url(mock_server.uri(), Duration::from_secs(5));
    let err = client.get("/deputados/999999", &[]).await.unwrap_err();

    match err {
        JaburuError::Api { status, endpoint } => {
            assert_eq!(status, 404);
            assert_eq!(endpoint, "/deputados/999999");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_maps_to_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = CamaraClient::with_base_url(mock_server.uri(), Duration::from_secs(5));
    let err = client.get("/votacoes", &[]).await.unwrap_err();

    assert!(matches!(err, JaburuError::Api { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn missing_dados_is_envelope_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [] })),
        )
        .mount(&mock_server)
        .await;

    let client = CamaraClient::with_base_url(mock_server.uri(), Duration::from_secs(5));
    let err = client.get("/deputados", &[]).await.unwrap_err();

    assert!(matches!(err, JaburuError::Envelope { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn non_json_body_is_envelope_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>maintenance page</html>")
                .insert_header("content-type", "application/json"),
        )
        .mount(&mock_server)
        .await;

    let client = CamaraClient::with_base_url(mock_server.uri(), Duration::from_secs(5));
    let err = client.get("/deputados", &[]).await.unwrap_err();

    assert!(matches!(err, JaburuError::Envelope { .. }));
}

#[tokio::test]
async fn slow_upstream_maps_to_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "dados": [] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = CamaraClient::with_base_url(mock_server.uri(), Duration::from_millis(50));
    let err = client.get("/proposicoes", &[]).await.unwrap_err();

    match err {
        JaburuError::Timeout { ref endpoint } => assert_eq!(endpoint, "/proposicoes"),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(err.is_retryable());
}
