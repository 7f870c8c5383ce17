//! Boundary index: the geographic gate in front of the metered provider.
//!
//! The index is loaded once at startup from a GeoJSON FeatureCollection and
//! is immutable (and safe for unsynchronized concurrent reads) for the rest
//! of the process lifetime. Only Polygon and MultiPolygon features take part
//! in the containment test; every other geometry kind in the file is
//! silently ignored.
//!
//! A tile is eligible for upstream fetching when at least one of its four
//! bounding-box corner points lies inside any feature. Sampling corners is
//! an accepted approximation: a polygon that traverses a tile's interior
//! without enclosing a corner yields a false negative.

use std::fs;
use std::path::{Path, PathBuf};

use geo::Contains;
use geo_types::{Geometry, MultiPolygon, Point, Polygon};
use geojson::GeoJson;
use thiserror::Error;

use crate::coord::{GeoPoint, TileCoord};

/// Errors raised while loading the boundary file.
///
/// All of these are fatal at startup: the process must not fall back to an
/// empty boundary set, which would silently reject every tile.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The boundary file could not be read.
    #[error("failed to read boundary file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid GeoJSON.
    #[error("failed to parse boundary GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    /// The file parsed but is not a FeatureCollection.
    #[error("boundary file is not a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    /// No polygonal features were found.
    #[error("boundary file contains no polygon or multi-polygon features")]
    NoRegions,
}

/// Capability for testing whether a point lies inside a polygon.
///
/// Abstracting the containment algorithm keeps it swappable without touching
/// the index or its call sites. The convention of the chosen algorithm
/// (boundary inclusivity in particular) belongs to the implementation.
pub trait PointInPolygon: Send + Sync {
    fn polygon_contains(&self, polygon: &Polygon<f64>, point: Point<f64>) -> bool;
    fn multi_polygon_contains(&self, multi: &MultiPolygon<f64>, point: Point<f64>) -> bool;
}

/// Default containment backed by `geo::Contains`.
///
/// This is an interior test: a point exactly on a polygon edge is NOT
/// considered contained.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoContainment;

impl PointInPolygon for GeoContainment {
    fn polygon_contains(&self, polygon: &Polygon<f64>, point: Point<f64>) -> bool {
        polygon.contains(&point)
    }

    fn multi_polygon_contains(&self, multi: &MultiPolygon<f64>, point: Point<f64>) -> bool {
        multi.contains(&point)
    }
}

/// A polygonal region geometry kept by the index.
enum RegionGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

/// Immutable set of region polygons with a point-in-polygon test.
pub struct BoundaryIndex<C: PointInPolygon = GeoContainment> {
    regions: Vec<RegionGeometry>,
    containment: C,
}

impl BoundaryIndex<GeoContainment> {
    /// Loads the index from a GeoJSON FeatureCollection file.
    pub fn from_geojson_file(path: impl AsRef<Path>) -> Result<Self, BoundaryError> {
        Self::from_geojson_file_with(path, GeoContainment)
    }

    /// Builds the index from GeoJSON text.
    pub fn from_geojson_str(raw: &str) -> Result<Self, BoundaryError> {
        Self::from_geojson_str_with(raw, GeoContainment)
    }
}

impl<C: PointInPolygon> BoundaryIndex<C> {
    /// Loads the index from a file with a custom containment algorithm.
    pub fn from_geojson_file_with(
        path: impl AsRef<Path>,
        containment: C,
    ) -> Result<Self, BoundaryError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| BoundaryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_geojson_str_with(&raw, containment)
    }

    /// Builds the index from GeoJSON text with a custom containment algorithm.
    ///
    /// Features are kept in file order. Geometry kinds other than Polygon and
    /// MultiPolygon are skipped; a file yielding no regions at all is an
    /// error rather than an index that rejects everything.
    pub fn from_geojson_str_with(raw: &str, containment: C) -> Result<Self, BoundaryError> {
        let geojson: GeoJson = raw.parse()?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(BoundaryError::NotFeatureCollection);
        };

        let mut regions = Vec::new();
        for feature in collection.features {
            let Some(geometry) = feature.geometry else {
                continue;
            };
            match Geometry::<f64>::try_from(geometry.value)? {
                Geometry::Polygon(polygon) => regions.push(RegionGeometry::Polygon(polygon)),
                Geometry::MultiPolygon(multi) => {
                    regions.push(RegionGeometry::MultiPolygon(multi))
                }
                // Points, lines and collections take no part in containment
                _ => {}
            }
        }

        if regions.is_empty() {
            return Err(BoundaryError::NoRegions);
        }

        Ok(Self {
            regions,
            containment,
        })
    }

    /// Returns true if the point lies inside any region.
    ///
    /// Regions are tested in file order, short-circuiting on first match.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        let point = Point::new(point.lon, point.lat);
        self.regions.iter().any(|region| match region {
            RegionGeometry::Polygon(polygon) => {
                self.containment.polygon_contains(polygon, point)
            }
            RegionGeometry::MultiPolygon(multi) => {
                self.containment.multi_polygon_contains(multi, point)
            }
        })
    }

    /// Returns true if at least one of the tile's four corner points is
    /// inside the boundary set.
    pub fn tile_eligible(&self, tile: &TileCoord) -> bool {
        tile.corner_points()
            .iter()
            .any(|corner| self.contains(corner))
    }

    /// Number of polygonal regions in the index.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}
