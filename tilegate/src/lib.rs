//! Tilegate is a caching reverse proxy for a metered map tile provider.
//!
//! Inbound requests name a tile by layer and slippy-map coordinates. The
//! proxy rejects tiles that fall outside a configured geographic boundary,
//! answers from an on-disk cache when it can, and otherwise fetches from
//! the upstream provider exactly once per tile, persisting both successful
//! tiles and negative results.
//!
//! Module map:
//!
//! - [`coord`] — tile coordinates and the inverse Web-Mercator projection
//! - [`tile`] — layers and tile addresses parsed from request paths
//! - [`boundary`] — GeoJSON boundary loading and corner-based eligibility
//! - [`cache`] — the two-state on-disk tile store
//! - [`provider`] — the upstream HTTP client and URL construction
//! - [`metrics`] — request counters and the stats snapshot
//! - [`service`] — the request pipeline gluing the above together
//! - [`server`] — the axum HTTP surface
//! - [`config`] — environment-driven process configuration

pub mod boundary;
pub mod cache;
pub mod config;
pub mod coord;
pub mod metrics;
pub mod provider;
pub mod server;
pub mod service;
pub mod tile;
