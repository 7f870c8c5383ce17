//! HTTP surface: the tile endpoint and the stats endpoint.
//!
//! - `GET /tiles/{aerial|topo}/{z}/{x}/{y}.png` — `200 image/png` with the
//!   tile bytes, or `404` with an empty body
//! - `GET /stats` — `200 application/json` with the counter snapshot
//!
//! Each request runs as its own task on the runtime; all shared state is
//! read-only or atomic.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::boundary::PointInPolygon;
use crate::metrics::MetricsSnapshot;
use crate::provider::HttpClient;
use crate::service::{TileOutcome, TileService};
use crate::tile::TileAddress;

/// Shared per-request state.
pub struct AppState<C: HttpClient, P: PointInPolygon> {
    service: Arc<TileService<C, P>>,
}

impl<C: HttpClient, P: PointInPolygon> Clone for AppState<C, P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

/// Builds the proxy router around a tile service.
pub fn router<C, P>(service: Arc<TileService<C, P>>) -> Router
where
    C: HttpClient + 'static,
    P: PointInPolygon + 'static,
{
    Router::new()
        .route("/tiles/:layer/:z/:x/:y", get(serve_tile::<C, P>))
        .route("/stats", get(serve_stats::<C, P>))
        .with_state(AppState { service })
}

/// Tile endpoint handler.
///
/// Counts every inbound request, then parses the path segments; a malformed
/// request is logged and answered with 404 without touching the cache or
/// the hit/miss counters.
async fn serve_tile<C, P>(
    State(state): State<AppState<C, P>>,
    Path((layer, z, x, y)): Path<(String, String, String, String)>,
) -> Response
where
    C: HttpClient + 'static,
    P: PointInPolygon + 'static,
{
    state.service.metrics().record_request();

    let addr = match TileAddress::from_segments(&layer, &z, &x, &y) {
        Ok(addr) => addr,
        Err(error) => {
            info!(%layer, %z, %x, %y, %error, outcome = "malformed", "rejected tile request");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    match state.service.handle(&addr).await {
        TileOutcome::Served(bytes) => {
            ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
        }
        TileOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Stats endpoint handler.
async fn serve_stats<C, P>(State(state): State<AppState<C, P>>) -> Json<MetricsSnapshot>
where
    C: HttpClient + 'static,
    P: PointInPolygon + 'static,
{
    Json(state.service.metrics().snapshot())
}
