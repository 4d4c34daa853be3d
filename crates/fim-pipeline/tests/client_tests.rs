//! HTTP client behaviour against an in-process API server.

mod common;

use common::TestServer;
use fim_common::{FimError, ReachId};
use fim_pipeline::{FimApiClient, FimSource, PipelineConfig};

#[tokio::test]
async fn test_fetch_catalog_parses_parallel_arrays() {
    let server = TestServer::start().await;
    server.api.add_catalog("7086109", test_utils::catalog::with_group());
    let client = FimApiClient::new(&server.config()).unwrap();

    let catalog = client
        .fetch_catalog(&ReachId::new("7086109").unwrap())
        .await
        .unwrap();
    assert_eq!(catalog.stages_m, vec![1.0, 2.0, 3.0]);
    assert_eq!(
        catalog.select_stage_files(2.0),
        vec!["b.tif".to_string(), "c.tif".to_string()]
    );
}

#[tokio::test]
async fn test_malformed_catalog_is_invalid_response() {
    let server = TestServer::start().await;
    server.api.add_catalog("5", serde_json::json!({ "files": 5, "stages_m": "high" }));
    let client = FimApiClient::new(&server.config()).unwrap();

    let err = client
        .fetch_catalog(&ReachId::new("5").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, FimError::InvalidResponse(_)));
    assert!(!err.to_string().contains("decode raster"));
}

#[tokio::test]
async fn test_unknown_reach_is_http_status() {
    let server = TestServer::start().await;
    let client = FimApiClient::new(&server.config()).unwrap();

    let err = client
        .fetch_catalog(&ReachId::new("999").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, FimError::HttpStatus { status: 404, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_relative_cog_path_resolves_against_base() {
    let server = TestServer::start().await;
    server.api.add_cog("a.tif", vec![1, 2, 3]);
    let client = FimApiClient::new(&server.config()).unwrap();

    let bytes = client.fetch_cog("cogs/a.tif").await.unwrap();
    assert_eq!(&bytes[..], &[1, 2, 3]);
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let client = FimApiClient::new(&PipelineConfig {
        api_base: "http://127.0.0.1:1".to_string(),
        connect_timeout_secs: 1,
        request_timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();

    let err = client.fetch_cog("cogs/a.tif").await.unwrap_err();
    assert!(matches!(err, FimError::Network(_)));
    assert!(err.is_transient());
}
