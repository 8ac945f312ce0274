//! HTTP status fetcher against a raw TCP mock backend.

mod common;

use common::start_programmable_backend;
use url::Url;
use web_sdk::config::RemoteConfig;
use web_sdk::provider::ChainId;
use web_sdk::status::{HttpStatusFetcher, RemoteStatusFetcher, StatusError};

fn fetcher() -> HttpStatusFetcher {
    HttpStatusFetcher::new(&RemoteConfig {
        status_path: "/status".to_string(),
        timeout_secs: 2,
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetches_status_document() {
    let addr = start_programmable_backend(|| async {
        (
            200,
            r#"{"chainId":3,"networkOrHost":"ropsten","rollupContractAddress":"0x1234"}"#.to_string(),
        )
    })
    .await;

    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    let status = fetcher().fetch_status(&url).await.unwrap();

    assert_eq!(status.chain_id, ChainId(3));
    assert_eq!(status.network_or_host.as_deref(), Some("ropsten"));
    assert_eq!(status.rollup_contract_address.as_deref(), Some("0x1234"));
}

#[tokio::test]
async fn test_optional_fields_may_be_missing() {
    let addr = start_programmable_backend(|| async { (200, r#"{"chainId":1}"#.to_string()) }).await;

    let url = Url::parse(&format!("http://{}/api", addr)).unwrap();
    let status = fetcher().fetch_status(&url).await.unwrap();

    assert_eq!(status.chain_id, ChainId(1));
    assert!(status.network_or_host.is_none());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let addr = start_programmable_backend(|| async { (503, "unavailable".to_string()) }).await;

    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    let err = fetcher().fetch_status(&url).await.unwrap_err();

    assert!(matches!(err, StatusError::Http(503)));
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let addr = start_programmable_backend(|| async { (200, "<html>oops</html>".to_string()) }).await;

    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    let err = fetcher().fetch_status(&url).await.unwrap_err();

    assert!(matches!(err, StatusError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_reported() {
    // Bind and release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    let err = fetcher().fetch_status(&url).await.unwrap_err();

    assert!(matches!(err, StatusError::Unreachable(_)));
}
