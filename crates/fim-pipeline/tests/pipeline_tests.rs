//! End-to-end overlay selection against an in-process API server.

mod common;

use std::sync::Arc;

use common::{feature, TestServer};
use fim_common::{FimError, GeographicBounds, ReachId};
use fim_pipeline::{
    AlertLevel, CollectingNotifier, FimApiClient, MemoryCanvas, OverlayPipeline, Viewport,
};
use serde_json::json;
use test_utils::{create_binary_mask, extent, oversized_geotiff, GeoTiffBuilder};

struct Harness {
    server: TestServer,
    canvas: Arc<MemoryCanvas>,
    notifier: Arc<CollectingNotifier>,
    pipeline: OverlayPipeline,
}

async fn harness() -> Harness {
    let server = TestServer::start().await;
    let config = server.config();
    let source = Arc::new(FimApiClient::new(&config).unwrap());
    let canvas = Arc::new(MemoryCanvas::new(Viewport {
        zoom: 12.0,
        bounds: GeographicBounds::new(36.0, -93.0, 37.0, -91.0),
    }));
    let notifier = Arc::new(CollectingNotifier::new());
    let pipeline = OverlayPipeline::new(source, canvas.clone(), notifier.clone(), &config);

    Harness {
        server,
        canvas,
        notifier,
        pipeline,
    }
}

fn mask_cog() -> Vec<u8> {
    GeoTiffBuilder::new(4, 2, create_binary_mask(4, 2), extent::ozarks_reach())
        .no_data("-9999")
        .build()
}

#[tokio::test]
async fn test_select_reach_presents_matching_stage() {
    let h = harness().await;
    h.server.api.add_catalog("7086109", test_utils::catalog::hosted(&h.server.base()));
    h.server.api.add_cog("a.tif", mask_cog());
    h.server.api.add_cog("b.tif", mask_cog());

    let report = h
        .pipeline
        .select_reach(&feature(test_utils::feature::comid(7086109, "Roaring River")), 2.0)
        .await
        .unwrap();

    assert_eq!(report.presented.len(), 1);
    assert!(report.failed.is_empty());
    assert_eq!(report.flow_cms, Some(20.0));
    assert_eq!(report.presented[0].source_url, h.server.cog_url("b.tif"));

    let overlays = h.canvas.overlays().await;
    assert_eq!(overlays.len(), 1);
    let placed = &overlays[0].1;
    assert_eq!(placed.width, 4);
    assert_eq!(placed.height, 2);
    assert_eq!(placed.opacity, 0.8);
    assert!(placed.bounds.south_west_lat < placed.bounds.north_east_lat);
    assert!(placed.bounds.south_west_lng < placed.bounds.north_east_lng);
    assert!(placed.bounds.north_east_lng < -90.0 && placed.bounds.south_west_lng > -94.0);
    assert!(h.notifier.snapshot().is_empty());
}

#[tokio::test]
async fn test_bad_cog_does_not_abort_siblings() {
    let h = harness().await;
    let base = h.server.base();
    h.server.api.add_catalog(
        "42",
        json!({
            "files": [
                format!("{}/cogs/good.tif", base),
                [format!("{}/cogs/corrupt.tif", base), format!("{}/cogs/missing.tif", base), 1.0]
            ],
            "flows_cms": [5.0, 6.0],
            "stages_m": [1.0, 1.5]
        }),
    );
    h.server.api.add_cog("good.tif", mask_cog());
    h.server.api.add_cog("corrupt.tif", b"II*\0garbage".to_vec());

    let report = h
        .pipeline
        .select_reach(&feature(test_utils::feature::reach_id("42")), 1.0)
        .await
        .unwrap();

    assert_eq!(report.presented.len(), 1);
    assert_eq!(report.presented[0].source_url, h.server.cog_url("good.tif"));
    assert_eq!(report.failed.len(), 2);
    assert!(report
        .failed
        .iter()
        .any(|(_, e)| matches!(e, FimError::Decode(_))));
    assert!(report
        .failed
        .iter()
        .any(|(_, e)| matches!(e, FimError::HttpStatus { status: 404, .. })));
    assert_eq!(h.canvas.overlay_count().await, 1);

    let alerts = h.notifier.take();
    assert_eq!(alerts.len(), 2);
    assert!(alerts
        .iter()
        .all(|n| n.level == AlertLevel::Error && n.title == "Error Loading COG"));
}

#[tokio::test]
async fn test_oversized_cog_is_refused_without_aborting() {
    let h = harness().await;
    let base = h.server.base();
    h.server.api.add_catalog(
        "43",
        json!({
            "files": [[format!("{}/cogs/good.tif", base), format!("{}/cogs/huge.tif", base), 1.0]],
            "flows_cms": [5.0],
            "stages_m": [1.0]
        }),
    );
    h.server.api.add_cog("good.tif", mask_cog());
    h.server.api.add_cog("huge.tif", oversized_geotiff(40_000, 40_000));

    let report = h
        .pipeline
        .select_reach(&feature(test_utils::feature::reach_id("43")), 1.0)
        .await
        .unwrap();

    assert_eq!(report.presented.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, h.server.cog_url("huge.tif"));
    assert!(matches!(report.failed[0].1, FimError::Decode(_)));
    assert_eq!(h.notifier.take().len(), 1);
}

#[tokio::test]
async fn test_unknown_stage_warns_and_shows_nothing() {
    let h = harness().await;
    h.server.api.add_catalog("7", test_utils::catalog::two_stage());

    let report = h
        .pipeline
        .select_reach(&feature(test_utils::feature::comid(7, "Flat Creek")), 1.5)
        .await
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(h.canvas.overlay_count().await, 0);

    let alerts = h.notifier.take();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Warning);
    assert_eq!(alerts[0].title, "Stage Selection");
    assert_eq!(
        alerts[0].text,
        "No COGs found for reach: 7 with selected stage: 1.5m."
    );
}

#[tokio::test]
async fn test_catalog_failure_is_notified() {
    let h = harness().await;
    h.server.api.fail_catalogs(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

    let result = h
        .pipeline
        .select_reach(&feature(test_utils::feature::comid(1, "X")), 1.0)
        .await;

    assert!(matches!(result, Err(FimError::HttpStatus { status: 500, .. })));
    let alerts = h.notifier.take();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Error);
    assert_eq!(h.canvas.overlay_count().await, 0);
}

#[tokio::test]
async fn test_feature_without_identifier() {
    let h = harness().await;

    let result = h
        .pipeline
        .select_reach(&feature(test_utils::feature::anonymous()), 1.0)
        .await;

    assert!(matches!(result, Err(FimError::NotFound(_))));
    assert_eq!(h.server.api.catalog_requests(), 0);
}

#[tokio::test]
async fn test_reselect_replaces_overlays_and_reuses_catalog() {
    let h = harness().await;
    h.server.api.add_catalog("7086109", test_utils::catalog::hosted(&h.server.base()));
    h.server.api.add_cog("a.tif", mask_cog());
    h.server.api.add_cog("b.tif", mask_cog());
    let reach = ReachId::new("7086109").unwrap();

    let feature = feature(test_utils::feature::comid(7086109, "Roaring River"));
    h.pipeline.select_reach(&feature, 1.0).await.unwrap();
    let report = h.pipeline.select_stage(&reach, 2.0).await.unwrap();

    assert_eq!(h.server.api.catalog_requests(), 1);
    assert_eq!(report.presented.len(), 1);

    let overlays = h.canvas.overlays().await;
    assert_eq!(overlays.len(), 1);
    assert_eq!(overlays[0].1.source_url, h.server.cog_url("b.tif"));

    let stats = h.pipeline.resolver().cache_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_deselect_clears_everything() {
    let h = harness().await;
    h.server.api.add_catalog("7086109", test_utils::catalog::hosted(&h.server.base()));
    h.server.api.add_cog("a.tif", mask_cog());

    h.pipeline
        .select_reach(&feature(test_utils::feature::comid(7086109, "Roaring River")), 1.0)
        .await
        .unwrap();
    assert_eq!(h.canvas.overlay_count().await, 1);

    assert_eq!(h.pipeline.deselect().await, 1);
    assert_eq!(h.canvas.overlay_count().await, 0);
    assert_eq!(h.pipeline.deselect().await, 0);
}
