//! Web Feature Service client.
//!
//! Fetches region polygons with a single blocking `GetFeature` request. The
//! request has a bounded timeout so an unreachable service fails with an
//! error instead of hanging.

use crate::geometry::parse_feature_collection;
use crate::{ChoroplethError, RegionGeometry, Result};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of a WFS feature request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WfsRequest {
    /// Service endpoint, without query parameters.
    pub url: String,
    /// Feature type to request (`typeName`).
    pub type_name: String,
    /// Request type, normally `GetFeature`.
    pub request: String,
    /// Protocol version, omitted from the query when `None`.
    pub version: Option<String>,
    /// Response format, e.g. `application/json`.
    pub output_format: String,
}

impl WfsRequest {
    /// A `GetFeature` request for GeoJSON output.
    pub fn get_feature(url: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            type_name: type_name.into(),
            request: "GetFeature".to_string(),
            version: Some("2.0.0".to_string()),
            output_format: "application/json".to_string(),
        }
    }

    /// Full request URL including query parameters.
    pub fn to_url(&self) -> Result<Url> {
        let mut params: Vec<(&str, &str)> = vec![("service", "WFS")];
        if let Some(version) = &self.version {
            params.push(("version", version.as_str()));
        }
        params.push(("request", self.request.as_str()));
        params.push(("typeName", self.type_name.as_str()));
        params.push(("outputFormat", self.output_format.as_str()));

        Url::parse_with_params(&self.url, &params).map_err(|e| ChoroplethError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Blocking WFS client.
#[derive(Debug, Clone)]
pub struct WfsClient {
    /// HTTP client for feature requests.
    client: reqwest::blocking::Client,
    /// Request timeout.
    timeout: Duration,
}

impl WfsClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client with a specific request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the raw response body of a feature request.
    pub fn fetch_text(&self, request: &WfsRequest) -> Result<String> {
        let url = request.to_url()?;
        info!("Requesting features '{}' from {}", request.type_name, request.url);
        debug!("WFS request URL: {}", url);

        let response = self.client.get(url.clone()).send()?;
        if !response.status().is_success() {
            return Err(ChoroplethError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text()?;
        debug!("Received {} bytes of feature data", body.len());
        Ok(body)
    }

    /// Fetch and decode region geometries, keyed by `id_property`.
    pub fn fetch_geometries(
        &self,
        request: &WfsRequest,
        id_property: &str,
    ) -> Result<Vec<RegionGeometry>> {
        let body = self.fetch_text(request)?;
        let regions = parse_feature_collection(&body, id_property)?;
        info!("Fetched {} region geometries", regions.len());
        Ok(regions)
    }
}
