//! HTTP access to the inundation API and COG hosts.

use async_trait::async_trait;
use bytes::Bytes;
use fim_common::{FimError, FimResult, QuantileRecord, ReachCatalog, ReachId};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::config::PipelineConfig;

/// Everything the pipeline fetches over the network.
#[async_trait]
pub trait FimSource: Send + Sync {
    /// `GET {base}/fim?reach_id={id}`
    async fn fetch_catalog(&self, reach: &ReachId) -> FimResult<ReachCatalog>;

    /// `GET {base}/timeseries/historical-quantiles?feature_id={id}`.
    /// An empty array or empty body is `Ok(vec![])`.
    async fn fetch_quantiles(&self, reach: &ReachId) -> FimResult<Vec<QuantileRecord>>;

    /// Raw COG bytes.
    async fn fetch_cog(&self, url: &str) -> FimResult<Bytes>;
}

/// reqwest-backed [`FimSource`]. No retries.
#[derive(Debug, Clone)]
pub struct FimApiClient {
    client: Client,
    base: Url,
}

impl FimApiClient {
    pub fn new(config: &PipelineConfig) -> FimResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FimError::Config(format!("Failed to create HTTP client: {}", e)))?;

        // Trailing slash so relative COG paths join under the base path
        let base = Url::parse(&format!("{}/", config.api_base()))
            .map_err(|e| FimError::Config(format!("Invalid api_base '{}': {}", config.api_base, e)))?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> FimResult<Url> {
        self.base
            .join(path)
            .map_err(|e| FimError::Internal(format!("Bad endpoint path {}: {}", path, e)))
    }

    /// Absolute URLs pass through; relative ones resolve against the API base.
    pub fn resolve_url(&self, url: &str) -> FimResult<Url> {
        Url::parse(url)
            .or_else(|_| self.base.join(url))
            .map_err(|e| FimError::Network(format!("Invalid COG URL {}: {}", url, e)))
    }

    async fn get_bytes(&self, url: Url) -> FimResult<Bytes> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FimError::Network(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FimError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| FimError::Network(format!("Reading body of {}: {}", url, e)))
    }
}

#[async_trait]
impl FimSource for FimApiClient {
    #[instrument(skip(self), fields(reach_id = %reach))]
    async fn fetch_catalog(&self, reach: &ReachId) -> FimResult<ReachCatalog> {
        let mut url = self.endpoint("fim")?;
        url.query_pairs_mut().append_pair("reach_id", reach.as_str());

        let body = self.get_bytes(url).await?;
        let catalog: ReachCatalog = serde_json::from_slice(&body)?;
        debug!(entries = catalog.files.len(), "Fetched catalog");
        Ok(catalog)
    }

    #[instrument(skip(self), fields(reach_id = %reach))]
    async fn fetch_quantiles(&self, reach: &ReachId) -> FimResult<Vec<QuantileRecord>> {
        let mut url = self.endpoint("timeseries/historical-quantiles")?;
        url.query_pairs_mut().append_pair("feature_id", reach.as_str());

        let body = self.get_bytes(url).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let records: Option<Vec<QuantileRecord>> = serde_json::from_slice(&body)?;
        Ok(records.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn fetch_cog(&self, url: &str) -> FimResult<Bytes> {
        let url = self.resolve_url(url)?;
        let bytes = self.get_bytes(url).await?;
        debug!(bytes = bytes.len(), "Fetched COG");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> FimApiClient {
        FimApiClient::new(&PipelineConfig {
            api_base: base.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let c = client("https://api.example.org/v1/");
        assert_eq!(c.endpoint("fim").unwrap().as_str(), "https://api.example.org/v1/fim");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let c = client("https://api.example.org/v1");
        assert_eq!(
            c.resolve_url("cogs/a.tif").unwrap().as_str(),
            "https://api.example.org/v1/cogs/a.tif"
        );
        assert_eq!(
            c.resolve_url("https://bucket.example.org/b.tif").unwrap().as_str(),
            "https://bucket.example.org/b.tif"
        );
    }
}
