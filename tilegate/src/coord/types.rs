//! Coordinate value types.

use std::fmt;

/// A slippy-map tile coordinate.
///
/// `x` is the column (west to east), `y` the row (north to south), and
/// `zoom` the zoom level. No validation against `2^zoom` is performed;
/// out-of-range coordinates still project to a geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A geographic point in degrees, WGS84 longitude/latitude.
///
/// Pure value with no identity; produced by the tile projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}
