//! Quantiles service against an in-process API server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use common::TestServer;
use fim_common::{FimError, ReachId};
use fim_pipeline::{FimApiClient, FimSource, QuantilesOutcome, QuantilesService};

fn reach(id: &str) -> ReachId {
    ReachId::new(id).unwrap()
}

async fn service(server: &TestServer) -> QuantilesService {
    let client = FimApiClient::new(&server.config()).unwrap();
    QuantilesService::new(Arc::new(client), Duration::from_secs(24 * 60 * 60))
}

#[tokio::test]
async fn test_load_then_serve_from_cache() {
    let server = TestServer::start().await;
    server
        .api
        .add_quantiles("7086109", test_utils::quantiles::sample().to_string());
    let service = service(&server).await;

    let first = service.fetch_or_load(&reach("7086109"), 2025).await.unwrap();
    let (series, from_cache) = match first {
        QuantilesOutcome::Loaded { series, from_cache } => (series, from_cache),
        other => panic!("expected data, got {:?}", other),
    };
    assert!(!from_cache);
    assert_eq!(series.year, 2025);
    assert_eq!(series.q0.len(), 2);
    assert_eq!(series.q10.len(), 1);
    assert_eq!(series.q25[1].date, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

    let second = service.fetch_or_load(&reach("7086109"), 2025).await.unwrap();
    assert!(matches!(second, QuantilesOutcome::Loaded { from_cache: true, .. }));
    assert_eq!(server.api.quantile_requests(), 1);
}

#[tokio::test]
async fn test_empty_array_is_no_data_and_not_cached() {
    let server = TestServer::start().await;
    server.api.add_quantiles("1", "[]");
    let service = service(&server).await;

    assert_eq!(
        service.fetch_or_load(&reach("1"), 2025).await.unwrap(),
        QuantilesOutcome::NoData
    );
    assert_eq!(
        service.fetch_or_load(&reach("1"), 2025).await.unwrap(),
        QuantilesOutcome::NoData
    );
    assert_eq!(server.api.quantile_requests(), 2);
    assert!(service.cache().is_empty().await);
}

#[tokio::test]
async fn test_empty_body_and_null_are_no_data() {
    let server = TestServer::start().await;
    server.api.add_quantiles("2", "null");
    let service = service(&server).await;

    // No body registered for reach 3: the server answers with an empty body
    for id in ["2", "3"] {
        let outcome = service.fetch_or_load(&reach(id), 2025).await.unwrap();
        assert!(outcome.series().is_none());
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = TestServer::start().await;
    server.api.add_quantiles("4", "{not json");
    let client = FimApiClient::new(&server.config()).unwrap();

    let err = client.fetch_quantiles(&reach("4")).await.unwrap_err();
    assert!(matches!(err, FimError::InvalidResponse(_)));
    assert_eq!(err.notification_title(), "Invalid Response");
}
