//! In-process stand-in for the inundation API and COG host.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fim_common::ReachFeature;
use fim_pipeline::PipelineConfig;
use serde_json::Value;

#[derive(Default)]
pub struct MockApi {
    catalogs: Mutex<HashMap<String, Value>>,
    quantiles: Mutex<HashMap<String, String>>,
    cogs: Mutex<HashMap<String, Vec<u8>>>,
    catalog_status: Mutex<Option<StatusCode>>,
    pub catalog_requests: AtomicUsize,
    pub quantile_requests: AtomicUsize,
}

impl MockApi {
    pub fn add_catalog(&self, reach: &str, catalog: Value) {
        self.catalogs.lock().unwrap().insert(reach.to_string(), catalog);
    }

    /// Raw quantiles response body for `reach`.
    pub fn add_quantiles(&self, reach: &str, body: impl Into<String>) {
        self.quantiles.lock().unwrap().insert(reach.to_string(), body.into());
    }

    pub fn add_cog(&self, name: &str, bytes: Vec<u8>) {
        self.cogs.lock().unwrap().insert(name.to_string(), bytes);
    }

    /// Answer every catalog request with `status`.
    pub fn fail_catalogs(&self, status: StatusCode) {
        *self.catalog_status.lock().unwrap() = Some(status);
    }

    pub fn catalog_requests(&self) -> usize {
        self.catalog_requests.load(Ordering::SeqCst)
    }

    pub fn quantile_requests(&self) -> usize {
        self.quantile_requests.load(Ordering::SeqCst)
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub api: Arc<MockApi>,
}

impl TestServer {
    pub async fn start() -> Self {
        let api = Arc::new(MockApi::default());
        let app = Router::new()
            .route("/fim", get(catalog))
            .route("/timeseries/historical-quantiles", get(quantiles))
            .route("/cogs/:name", get(cog))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, api }
    }

    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn cog_url(&self, name: &str) -> String {
        format!("{}/cogs/{}", self.base(), name)
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            api_base: self.base(),
            request_timeout_secs: 5,
            ..Default::default()
        }
    }
}

async fn catalog(
    State(api): State<Arc<MockApi>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    api.catalog_requests.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = *api.catalog_status.lock().unwrap() {
        return status.into_response();
    }
    let reach = params.get("reach_id").cloned().unwrap_or_default();
    match api.catalogs.lock().unwrap().get(&reach) {
        Some(value) => Json(value.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn quantiles(
    State(api): State<Arc<MockApi>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    api.quantile_requests.fetch_add(1, Ordering::SeqCst);
    let reach = params.get("feature_id").cloned().unwrap_or_default();
    let body = api.quantiles.lock().unwrap().get(&reach).cloned().unwrap_or_default();
    ([("content-type", "application/json")], body).into_response()
}

async fn cog(State(api): State<Arc<MockApi>>, Path(name): Path<String>) -> Response {
    match api.cogs.lock().unwrap().get(&name) {
        Some(bytes) => Bytes::from(bytes.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn feature(attributes: Value) -> ReachFeature {
    ReachFeature::new(attributes.as_object().cloned().unwrap())
}
