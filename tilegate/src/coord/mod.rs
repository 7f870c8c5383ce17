//! Coordinate conversion module
//!
//! Provides the inverse Web Mercator ("slippy map") projection from tile
//! coordinates to geographic coordinates, used to decide whether a tile
//! falls inside the configured boundary region.

mod types;

pub use types::{GeoPoint, TileCoord};

use std::f64::consts::PI;

/// Projects fractional tile coordinates to geographic coordinates.
///
/// Fractional inputs let callers project tile corners (`x + 1`, `y + 1`)
/// without constructing intermediate tile values.
#[inline]
fn project(x: f64, y: f64, zoom: u8) -> GeoPoint {
    let n = 2.0_f64.powi(zoom as i32);

    // Convert tile X coordinate to longitude
    let lon = x / n * 360.0 - 180.0;

    // Convert tile Y coordinate to latitude using inverse Web Mercator,
    // with sinh expressed via exp
    let m = PI - 2.0 * PI * y / n;
    let lat = 180.0 / PI * (0.5 * (m.exp() - (-m).exp())).atan();

    GeoPoint { lon, lat }
}

/// Converts tile coordinates to geographic coordinates.
///
/// Returns the longitude/latitude of the tile's northwest corner. Pure and
/// deterministic with no failure mode: coordinates beyond `2^zoom` still
/// produce a (possibly nonsensical) point rather than an error.
#[inline]
pub fn tile_to_lon_lat(tile: &TileCoord) -> GeoPoint {
    project(tile.x as f64, tile.y as f64, tile.zoom)
}

impl TileCoord {
    /// Returns the four geographic corner points of this tile's bounding box.
    ///
    /// The corners are the projections of `(x, y)`, `(x+1, y)`, `(x, y+1)`
    /// and `(x+1, y+1)`.
    pub fn corner_points(&self) -> [GeoPoint; 4] {
        let (x, y) = (self.x as f64, self.y as f64);
        [
            project(x, y, self.zoom),
            project(x + 1.0, y, self.zoom),
            project(x, y + 1.0, self.zoom),
            project(x + 1.0, y + 1.0, self.zoom),
        ]
    }
}
