//! Filesystem-backed tile cache.
//!
//! Each tile address maps to `{base}/{layer}/{z}/{x}/{y}.png`. A cache entry
//! is in exactly one of three observed states:
//!
//! - **Positive**: the image file exists at the entry's path
//! - **Negative**: a zero-byte marker exists at the path plus `.404`
//! - **Unknown**: neither file exists; the tile has never been resolved
//!
//! Entries are written once on first resolution and never evicted by this
//! layer. Negative markers optionally expire after a TTL so a transient
//! upstream outage does not become a permanent gap.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::tile::TileAddress;

/// Suffix appended to the image path for negative markers.
pub const NEGATIVE_MARKER_SUFFIX: &str = ".404";

/// Suffix for in-progress positive writes, renamed into place on completion.
const TEMP_SUFFIX: &str = ".tmp";

/// Observed cache state for one tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// A cached image exists.
    Positive,
    /// A negative marker records a known-failed fetch.
    Negative,
    /// The tile has not been resolved yet.
    Unknown,
}

/// Errors from cache filesystem operations.
///
/// These are recoverable at the request level; callers log them and degrade
/// the request rather than crashing the process.
#[derive(Debug, Error)]
#[error("cache I/O error at {path}: {source}")]
pub struct StoreError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl StoreError {
    fn at(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Disk-backed key/value store for tile images and negative markers.
pub struct TileStore {
    base: PathBuf,
    negative_ttl: Option<Duration>,
}

impl TileStore {
    /// Creates a store rooted at `base`.
    ///
    /// `negative_ttl` bounds how long a negative marker short-circuits
    /// requests; `None` keeps markers forever.
    pub fn new(base: impl Into<PathBuf>, negative_ttl: Option<Duration>) -> Self {
        Self {
            base: base.into(),
            negative_ttl,
        }
    }

    /// Path of the cached image for an address.
    pub fn image_path(&self, addr: &TileAddress) -> PathBuf {
        self.base
            .join(addr.layer.as_str())
            .join(addr.coord.zoom.to_string())
            .join(addr.coord.x.to_string())
            .join(format!("{}.png", addr.coord.y))
    }

    /// Path of the negative marker for an address.
    pub fn marker_path(&self, addr: &TileAddress) -> PathBuf {
        append_suffix(&self.image_path(addr), NEGATIVE_MARKER_SUFFIX)
    }

    /// Positive-cache probe: does the image file exist?
    pub async fn exists(&self, addr: &TileAddress) -> bool {
        fs::metadata(self.image_path(addr)).await.is_ok()
    }

    /// Negative-cache probe: does a live marker exist?
    ///
    /// A marker older than the configured TTL is removed and reported
    /// absent, returning the entry to the Unknown state.
    pub async fn exists_negative(&self, addr: &TileAddress) -> bool {
        let marker = self.marker_path(addr);
        let meta = match fs::metadata(&marker).await {
            Ok(meta) => meta,
            Err(_) => return false,
        };

        if let Some(ttl) = self.negative_ttl {
            let expired = meta
                .modified()
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .is_some_and(|age| age > ttl);
            if expired {
                if let Err(error) = fs::remove_file(&marker).await {
                    debug!(marker = %marker.display(), %error, "failed to remove stale negative marker");
                }
                debug!(tile = %addr, "negative marker expired");
                return false;
            }
        }

        true
    }

    /// Combined probe for the orchestrator: positive wins over negative.
    pub async fn probe(&self, addr: &TileAddress) -> CacheState {
        if self.exists(addr).await {
            CacheState::Positive
        } else if self.exists_negative(addr).await {
            CacheState::Negative
        } else {
            CacheState::Unknown
        }
    }

    /// Idempotently creates all parent directories for an address.
    pub async fn ensure_directory(&self, addr: &TileAddress) -> Result<(), StoreError> {
        let image = self.image_path(addr);
        // `{y}.png` always has a parent under the base path
        if let Some(parent) = image.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(StoreError::at(parent))?;
        }
        Ok(())
    }

    /// Idempotently records a known-failed fetch as a zero-byte marker.
    pub async fn write_negative(&self, addr: &TileAddress) -> Result<(), StoreError> {
        let marker = self.marker_path(addr);
        fs::write(&marker, b"").await.map_err(StoreError::at(&marker))
    }

    /// Commits tile image bytes for an address.
    ///
    /// Writes to a temporary sibling and renames into place, so a partial
    /// write is never observable at the final path.
    pub async fn write_positive(&self, addr: &TileAddress, bytes: &[u8]) -> Result<(), StoreError> {
        let image = self.image_path(addr);
        let temp = append_suffix(&image, TEMP_SUFFIX);
        fs::write(&temp, bytes).await.map_err(StoreError::at(&temp))?;
        fs::rename(&temp, &image)
            .await
            .map_err(StoreError::at(&image))
    }

    /// Reads the cached image bytes for an address.
    pub async fn read_positive(&self, addr: &TileAddress) -> Result<Bytes, StoreError> {
        let image = self.image_path(addr);
        let data = fs::read(&image).await.map_err(StoreError::at(&image))?;
        Ok(Bytes::from(data))
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::tile::Layer;
    use tempfile::TempDir;

    fn addr(layer: Layer, zoom: u8, x: u32, y: u32) -> TileAddress {
        TileAddress {
            layer,
            coord: TileCoord { x, y, zoom },
        }
    }

    fn store(dir: &TempDir) -> TileStore {
        TileStore::new(dir.path(), None)
    }

    #[test]
    fn test_image_path_layout() {
        let s = TileStore::new("/mapcache", None);
        let a = addr(Layer::Topo, 14, 16100, 10240);
        assert_eq!(
            s.image_path(&a),
            PathBuf::from("/mapcache/topo/14/16100/10240.png")
        );
        assert_eq!(
            s.marker_path(&a),
            PathBuf::from("/mapcache/topo/14/16100/10240.png.404")
        );
    }

    #[tokio::test]
    async fn test_unknown_until_written() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let a = addr(Layer::Aerial, 5, 10, 12);

        assert_eq!(s.probe(&a).await, CacheState::Unknown);
        assert!(!s.exists(&a).await);
        assert!(!s.exists_negative(&a).await);
    }

    #[tokio::test]
    async fn test_positive_round_trip() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let a = addr(Layer::Aerial, 5, 10, 12);

        s.ensure_directory(&a).await.unwrap();
        s.write_positive(&a, b"PNGDATA").await.unwrap();

        assert_eq!(s.probe(&a).await, CacheState::Positive);
        assert_eq!(s.read_positive(&a).await.unwrap().as_ref(), b"PNGDATA");

        // No temp file left behind
        let dir_entries = std::fs::read_dir(s.image_path(&a).parent().unwrap())
            .unwrap()
            .count();
        assert_eq!(dir_entries, 1);
    }

    #[tokio::test]
    async fn test_negative_marker_round_trip() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let a = addr(Layer::Topo, 8, 3, 4);

        s.ensure_directory(&a).await.unwrap();
        s.write_negative(&a).await.unwrap();

        assert_eq!(s.probe(&a).await, CacheState::Negative);
        let marker = s.marker_path(&a);
        assert_eq!(std::fs::metadata(marker).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_positive_wins_over_negative_in_probe() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let a = addr(Layer::Aerial, 5, 1, 2);

        s.ensure_directory(&a).await.unwrap();
        s.write_negative(&a).await.unwrap();
        s.write_positive(&a, b"data").await.unwrap();

        assert_eq!(s.probe(&a).await, CacheState::Positive);
    }

    #[tokio::test]
    async fn test_ensure_directory_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let a = addr(Layer::Aerial, 5, 10, 12);

        s.ensure_directory(&a).await.unwrap();
        s.ensure_directory(&a).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_negative_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let a = addr(Layer::Aerial, 5, 10, 12);

        s.ensure_directory(&a).await.unwrap();
        s.write_negative(&a).await.unwrap();
        s.write_negative(&a).await.unwrap();
        assert!(s.exists_negative(&a).await);
    }

    #[tokio::test]
    async fn test_expired_marker_returns_to_unknown() {
        let dir = TempDir::new().unwrap();
        let s = TileStore::new(dir.path(), Some(Duration::ZERO));
        let a = addr(Layer::Aerial, 5, 10, 12);

        s.ensure_directory(&a).await.unwrap();
        s.write_negative(&a).await.unwrap();
        // Make sure the marker's age exceeds the zero TTL
        std::thread::sleep(Duration::from_millis(20));

        assert!(!s.exists_negative(&a).await);
        assert_eq!(s.probe(&a).await, CacheState::Unknown);
        // The stale marker was removed on probe
        assert!(!s.marker_path(&a).exists());
    }

    #[tokio::test]
    async fn test_unexpired_marker_survives_probe() {
        let dir = TempDir::new().unwrap();
        let s = TileStore::new(dir.path(), Some(Duration::from_secs(3600)));
        let a = addr(Layer::Aerial, 5, 10, 12);

        s.ensure_directory(&a).await.unwrap();
        s.write_negative(&a).await.unwrap();

        assert!(s.exists_negative(&a).await);
        assert!(s.marker_path(&a).exists());
    }

    #[tokio::test]
    async fn test_write_without_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let a = addr(Layer::Aerial, 5, 10, 12);

        let err = s.write_positive(&a, b"data").await.unwrap_err();
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }
}
