//! Tile request addressing.
//!
//! A [`TileAddress`] identifies one raster tile: the upstream layer plus the
//! slippy-map coordinate. Addresses are constructed once per request from
//! the parsed path segments of the tile endpoint.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::coord::TileCoord;

/// Upstream raster layers served by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Aerial photography basemap.
    Aerial,
    /// Topographic map basemap.
    Topo,
}

impl Layer {
    /// Path segment and cache directory name for this layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Aerial => "aerial",
            Layer::Topo => "topo",
        }
    }

    /// The layer-specific selector embedded in the upstream tile URL.
    pub fn upstream_selector(&self) -> &'static str {
        match self {
            Layer::Aerial => "set=2",
            Layer::Topo => "layer=2343",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = ParseTileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aerial" => Ok(Layer::Aerial),
            "topo" => Ok(Layer::Topo),
            other => Err(ParseTileError::UnknownLayer(other.to_string())),
        }
    }
}

/// Errors produced while parsing tile path segments.
///
/// All variants map to a client-visible 404 with no state mutation.
#[derive(Debug, Error)]
pub enum ParseTileError {
    /// The layer segment is not a known layer name.
    #[error("unknown layer {0:?}")]
    UnknownLayer(String),

    /// A numeric path segment did not parse.
    #[error("non-numeric {segment} segment {value:?}")]
    BadNumber {
        segment: &'static str,
        value: String,
    },

    /// The final segment is missing the `.png` suffix.
    #[error("tile segment {0:?} missing .png suffix")]
    MissingImageSuffix(String),
}

/// Identifies one raster tile: layer plus slippy-map coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub layer: Layer,
    pub coord: TileCoord,
}

impl TileAddress {
    /// Builds an address from the four path segments of a tile request.
    ///
    /// The `y` segment carries the `.png` suffix (`{y}.png`). Coordinates
    /// are not validated against `2^z`; an out-of-range tile simply projects
    /// to a point the boundary gate will reject.
    pub fn from_segments(
        layer: &str,
        z: &str,
        x: &str,
        y: &str,
    ) -> Result<Self, ParseTileError> {
        let layer = layer.parse::<Layer>()?;
        let zoom = parse_segment::<u8>("z", z)?;
        let x = parse_segment::<u32>("x", x)?;
        let stem = y
            .strip_suffix(".png")
            .ok_or_else(|| ParseTileError::MissingImageSuffix(y.to_string()))?;
        let y = parse_segment::<u32>("y", stem)?;

        Ok(Self {
            layer,
            coord: TileCoord { x, y, zoom },
        })
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.layer, self.coord)
    }
}

fn parse_segment<T: FromStr>(
    segment: &'static str,
    value: &str,
) -> Result<T, ParseTileError> {
    value.parse().map_err(|_| ParseTileError::BadNumber {
        segment,
        value: value.to_string(),
    })
}
