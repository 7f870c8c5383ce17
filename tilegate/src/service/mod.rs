//! Tile service: the per-request orchestrator.
//!
//! Composes the boundary index, the disk cache, the upstream provider and
//! the counters. Each request walks a fixed state machine:
//!
//! 1. boundary gate — ineligible tiles are rejected before any I/O
//! 2. cache probe — a positive entry serves bytes, a negative entry serves
//!    NotFound; both count as hits
//! 3. fetch — on an unknown entry, one upstream attempt is made and its
//!    outcome committed to the cache
//!
//! The cold path is protected two ways: a per-tile single-flight gate so a
//! burst of requests for the same unseen tile produces exactly one upstream
//! call, and a semaphore bounding the total number of concurrent upstream
//! fetches against the metered provider.
//!
//! Failure policy: transport errors are negative-cached (the marker expires
//! after the store's TTL), non-success statuses are not cached and will be
//! retried by the next request for the same tile.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use crate::boundary::{BoundaryIndex, GeoContainment, PointInPolygon};
use crate::cache::{CacheState, TileStore};
use crate::metrics::ProxyMetrics;
use crate::provider::{HttpClient, LinzProvider, ProviderError};
use crate::tile::TileAddress;

/// Terminal outcome of one tile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileOutcome {
    /// Serve the tile bytes with `200 image/png`.
    Served(Bytes),
    /// Answer `404` with an empty body.
    NotFound,
}

/// Tunables for the service.
#[derive(Debug, Clone)]
pub struct TileServiceConfig {
    /// Upper bound on simultaneous upstream fetches.
    pub max_concurrent_fetches: usize,
}

impl Default for TileServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
        }
    }
}

/// Orchestrates boundary gating, caching and upstream fetching per request.
pub struct TileService<C: HttpClient, P: PointInPolygon = GeoContainment> {
    boundary: BoundaryIndex<P>,
    store: TileStore,
    provider: LinzProvider<C>,
    metrics: Arc<ProxyMetrics>,
    fetch_permits: Semaphore,
    in_flight: DashMap<TileAddress, Arc<Mutex<()>>>,
}

impl<C: HttpClient, P: PointInPolygon> TileService<C, P> {
    pub fn new(
        boundary: BoundaryIndex<P>,
        store: TileStore,
        provider: LinzProvider<C>,
        config: TileServiceConfig,
    ) -> Self {
        Self {
            boundary,
            store,
            provider,
            metrics: Arc::new(ProxyMetrics::new()),
            fetch_permits: Semaphore::new(config.max_concurrent_fetches.max(1)),
            in_flight: DashMap::new(),
        }
    }

    /// Shared counters, for the server layer and the stats endpoint.
    pub fn metrics(&self) -> &Arc<ProxyMetrics> {
        &self.metrics
    }

    /// Resolves one tile request.
    ///
    /// The caller has already parsed the address and counted the request;
    /// this method applies steps 2-5 of the request state machine.
    pub async fn handle(&self, addr: &TileAddress) -> TileOutcome {
        if !self.boundary.tile_eligible(&addr.coord) {
            info!(tile = %addr, outcome = "rejected", "tile outside boundary");
            return TileOutcome::NotFound;
        }

        if let Some(outcome) = self.cached_outcome(addr).await {
            return outcome;
        }

        self.resolve_miss(addr).await
    }

    /// Answers from the cache if the entry is already resolved.
    async fn cached_outcome(&self, addr: &TileAddress) -> Option<TileOutcome> {
        match self.store.probe(addr).await {
            CacheState::Positive => match self.store.read_positive(addr).await {
                Ok(bytes) => {
                    self.metrics.record_hit();
                    info!(tile = %addr, outcome = "hit", "served from cache");
                    Some(TileOutcome::Served(bytes))
                }
                Err(error) => {
                    warn!(tile = %addr, %error, "cached tile unreadable");
                    Some(TileOutcome::NotFound)
                }
            },
            CacheState::Negative => {
                self.metrics.record_hit();
                info!(tile = %addr, outcome = "negative-hit", "known failed tile");
                Some(TileOutcome::NotFound)
            }
            CacheState::Unknown => None,
        }
    }

    /// Cold path: serialize on the per-tile gate, re-probe, then fetch.
    ///
    /// Requesters that lose the race to fetch find the entry resolved when
    /// they re-probe under the gate, so the upstream sees exactly one call
    /// per unknown tile.
    async fn resolve_miss(&self, addr: &TileAddress) -> TileOutcome {
        let gate = self
            .in_flight
            .entry(*addr)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = gate.lock().await;
        let outcome = match self.cached_outcome(addr).await {
            Some(outcome) => outcome,
            None => self.fetch_and_cache(addr).await,
        };

        // Remove the gate while still holding it. Waiters queued on this
        // gate re-probe the cache once they acquire it; later arrivals find
        // the entry resolved before they reach the cold path.
        self.in_flight.remove(addr);

        outcome
    }

    /// Performs the single permitted upstream fetch and commits the result.
    async fn fetch_and_cache(&self, addr: &TileAddress) -> TileOutcome {
        if let Err(error) = self.store.ensure_directory(addr).await {
            warn!(tile = %addr, %error, "failed to create cache directory");
            return TileOutcome::NotFound;
        }

        let _permit = match self.fetch_permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(tile = %addr, "fetch semaphore closed");
                return TileOutcome::NotFound;
            }
        };

        match self.provider.fetch_tile(addr).await {
            Ok(bytes) => {
                if let Err(error) = self.store.write_positive(addr, &bytes).await {
                    // A tile we cannot commit is a failure, not a success:
                    // the next request must be able to retry the fetch.
                    warn!(tile = %addr, %error, "failed to commit tile to cache");
                    return TileOutcome::NotFound;
                }
                self.metrics.record_miss();
                info!(tile = %addr, outcome = "miss", bytes = bytes.len(), "fetched from upstream");
                TileOutcome::Served(bytes)
            }
            Err(ProviderError::Status(status)) => {
                // Not negative-cached: the next request for this tile will
                // attempt upstream again.
                warn!(tile = %addr, status, "upstream status error");
                TileOutcome::NotFound
            }
            Err(error) => {
                warn!(tile = %addr, %error, "upstream transport error");
                if let Err(error) = self.store.write_negative(addr).await {
                    warn!(tile = %addr, %error, "failed to write negative marker");
                }
                TileOutcome::NotFound
            }
        }
    }
}
