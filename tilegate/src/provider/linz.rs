//! LINZ (Land Information New Zealand) tile provider.
//!
//! Fetches raster tiles from the LINZ Data Service CDN, a metered service
//! billed per unique tile request.
//!
//! # URL Pattern
//!
//! `https://tiles-a.data-cdn.linz.govt.nz/services;key={key}/tiles/v4/{selector}/EPSG:3857/{z}/{x}/{y}.png`
//!
//! - `{key}` is the account API key (required; the process refuses to start
//!   without one)
//! - `{selector}` picks the basemap: `set=2` for aerial photography,
//!   `layer=2343` for the topographic map
//! - Coordinates are standard Web Mercator XYZ (EPSG:3857)
//!
//! Exactly one GET is issued per call; retries and backoff are deliberately
//! absent because every upstream request is billable.

use bytes::Bytes;

use crate::tile::TileAddress;

use super::http::HttpClient;
use super::types::ProviderError;

/// Base URL for the LINZ tile CDN.
const LINZ_BASE_URL: &str = "https://tiles-a.data-cdn.linz.govt.nz";

/// LINZ Data Service tile provider.
///
/// Generic over the HTTP client so tests can substitute a mock.
pub struct LinzProvider<C: HttpClient> {
    http_client: C,
    api_key: String,
}

impl<C: HttpClient> LinzProvider<C> {
    /// Creates a new LINZ provider.
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `api_key` - LINZ Data Service API key embedded in every tile URL
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
        }
    }

    /// Builds the upstream URL for the given tile address.
    fn build_url(&self, addr: &TileAddress) -> String {
        format!(
            "{}/services;key={}/tiles/v4/{}/EPSG:3857/{}/{}/{}.png",
            LINZ_BASE_URL,
            self.api_key,
            addr.layer.upstream_selector(),
            addr.coord.zoom,
            addr.coord.x,
            addr.coord.y,
        )
    }

    /// Fetches one tile from upstream. One attempt, no retries.
    pub async fn fetch_tile(&self, addr: &TileAddress) -> Result<Bytes, ProviderError> {
        let url = self.build_url(addr);
        self.http_client.get(&url).await
    }
}
