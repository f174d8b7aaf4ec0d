//! The static catalog of parks shown on the map.
//!
//! The catalog is loaded once, validated, and never changes afterwards. Input follows the
//! shape of the municipal open-data export of off-leash areas:
//!
//! ```json
//! [
//!   {
//!     "park_name": "Stanley Park",
//!     "geo_point_2d": { "lat": 49.30, "lon": -123.14 },
//!     "geom": {
//!       "type": "Feature",
//!       "properties": {},
//!       "geometry": {
//!         "type": "Polygon",
//!         "coordinates": [[[-123.141, 49.299], [-123.139, 49.299], [-123.140, 49.301], [-123.141, 49.299]]]
//!       }
//!     }
//!   }
//! ]
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use eyre::{Context, Result};
use geojson::{Feature, Value};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::Coordinate;

/// Errors that can occur while building a [`Catalog`].
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The input was not valid JSON, or did not have the expected shape.
    #[error("Malformed catalog data")]
    Malformed(#[from] serde_json::Error),

    /// A record had no usable polygon geometry.
    #[error("Area `{name}` has no polygon geometry")]
    MissingBoundary {
        /// The name of the offending area.
        name: String,
    },

    /// A boundary had fewer than three distinct points.
    #[error("Area `{name}` has {points} boundary points, at least 3 are required")]
    DegenerateBoundary {
        /// The name of the offending area.
        name: String,
        /// The number of distinct points found.
        points: usize,
    },

    /// Two areas share an id.
    #[error("Duplicate area id {0}")]
    DuplicateId(AreaId),
}

/// A unique identifier for an area within its catalog.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AreaId(pub u32);

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fenced off-leash area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Unique within the catalog.
    pub id: AreaId,

    /// Display name, also used for searching.
    pub name: String,

    /// Where the marker is placed.
    pub centroid: Coordinate,

    /// The nodes of the polygon, without a closing duplicate. Always 3 or more.
    pub boundary: Vec<Coordinate>,
}

/// An ordered, immutable list of areas.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    areas: Vec<Arc<Area>>,
}

impl Catalog {
    /// Builds a catalog, checking that every boundary has at least three distinct points and
    /// every id is unique. Order is preserved.
    pub fn new(areas: Vec<Area>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(areas.len());
        for area in &areas {
            let points = distinct_points(&area.boundary);
            if points < 3 {
                return Err(CatalogError::DegenerateBoundary {
                    name: area.name.clone(),
                    points,
                });
            }
            if !seen.insert(area.id) {
                return Err(CatalogError::DuplicateId(area.id));
            }
        }

        Ok(Self {
            areas: areas.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parses the open-data JSON export. Areas without an explicit `id` are numbered by their
    /// position in the input.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<ParkRecord> = serde_json::from_str(json)?;
        let areas = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_area(index))
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = Self::new(areas)?;
        debug!("Loaded {} areas", catalog.len());
        Ok(catalog)
    }

    /// Reads and parses a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read catalog from {}", path.display()))?;
        Self::from_json(&json)
            .wrap_err_with(|| format!("Failed to parse catalog from {}", path.display()))
    }

    /// All areas, in catalog order.
    pub fn areas(&self) -> &[Arc<Area>] {
        &self.areas
    }

    /// Iterates over the areas in catalog order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Area>> {
        self.areas.iter()
    }

    /// Looks an area up by id.
    pub fn get(&self, id: AreaId) -> Option<&Arc<Area>> {
        self.areas.iter().find(|area| area.id == id)
    }

    /// Number of areas.
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Whether the catalog has no areas.
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

fn distinct_points(boundary: &[Coordinate]) -> usize {
    boundary
        .iter()
        .map(|p| (p.lat.to_bits(), p.lon.to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

#[derive(Deserialize)]
struct ParkRecord {
    #[serde(default)]
    id: Option<u32>,
    park_name: String,
    geo_point_2d: Coordinate,
    geom: Feature,
}

impl ParkRecord {
    fn into_area(self, index: usize) -> Result<Area, CatalogError> {
        let ring = self
            .geom
            .geometry
            .and_then(|geometry| match geometry.value {
                Value::Polygon(mut rings) if !rings.is_empty() => Some(rings.swap_remove(0)),
                // Only the outer ring of the first polygon is kept.
                Value::MultiPolygon(mut polygons) if !polygons.is_empty() => {
                    let mut rings = polygons.swap_remove(0);
                    (!rings.is_empty()).then(|| rings.swap_remove(0))
                }
                _ => None,
            })
            .ok_or_else(|| CatalogError::MissingBoundary {
                name: self.park_name.clone(),
            })?;

        // GeoJSON positions are [lon, lat].
        let mut boundary: Vec<Coordinate> = ring
            .iter()
            .filter(|pos| pos.len() >= 2)
            .map(|pos| Coordinate::new(pos[1], pos[0]))
            .collect();

        if boundary.len() > 1 && boundary.first() == boundary.last() {
            boundary.pop();
        }

        Ok(Area {
            id: AreaId(self.id.unwrap_or(index as u32)),
            name: self.park_name,
            centroid: self.geo_point_2d,
            boundary,
        })
    }
}

/// A small square area around `(lat, lon)`, for tests.
#[cfg(test)]
pub(crate) fn square(name: &str, id: u32, lat: f64, lon: f64) -> Area {
    let d = 0.001;
    Area {
        id: AreaId(id),
        name: name.to_string(),
        centroid: Coordinate::new(lat, lon),
        boundary: vec![
            Coordinate::new(lat - d, lon - d),
            Coordinate::new(lat - d, lon + d),
            Coordinate::new(lat + d, lon + d),
            Coordinate::new(lat + d, lon - d),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {
            "park_name": "Stanley Park",
            "geo_point_2d": { "lat": 49.30, "lon": -123.14 },
            "geom": {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-123.141, 49.299], [-123.139, 49.299], [-123.140, 49.301], [-123.141, 49.299]]]
                }
            }
        },
        {
            "park_name": "Hastings Park",
            "geo_point_2d": { "lat": 49.28, "lon": -123.04 },
            "geom": {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[-123.041, 49.279], [-123.039, 49.279], [-123.039, 49.281], [-123.041, 49.281]]]]
                }
            }
        }
    ]"#;

    #[test]
    fn parses_open_data_export() {
        let catalog = Catalog::from_json(EXPORT).unwrap();
        assert_eq!(catalog.len(), 2);

        let stanley = &catalog.areas()[0];
        assert_eq!(stanley.id, AreaId(0));
        assert_eq!(stanley.name, "Stanley Park");
        assert_eq!(stanley.centroid, Coordinate::new(49.30, -123.14));
        // Closing point dropped, [lon, lat] swapped.
        assert_eq!(stanley.boundary.len(), 3);
        assert_eq!(stanley.boundary[0], Coordinate::new(49.299, -123.141));

        let hastings = catalog.get(AreaId(1)).unwrap();
        assert_eq!(hastings.name, "Hastings Park");
        assert_eq!(hastings.boundary.len(), 4);
    }

    #[test]
    fn rejects_degenerate_boundary() {
        let json = r#"[{
            "park_name": "Sliver",
            "geo_point_2d": { "lat": 1.0, "lon": 1.0 },
            "geom": { "type": "Feature", "properties": {}, "geometry": {
                "type": "Polygon", "coordinates": [[[1.0, 1.0], [1.1, 1.0], [1.0, 1.0]]]
            }}
        }]"#;
        match Catalog::from_json(json) {
            Err(CatalogError::DegenerateBoundary { name, points }) => {
                assert_eq!(name, "Sliver");
                assert_eq!(points, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_repeated_points() {
        let json = r#"[{
            "park_name": "Stutter",
            "geo_point_2d": { "lat": 1.0, "lon": 1.0 },
            "geom": { "type": "Feature", "properties": {}, "geometry": {
                "type": "Polygon", "coordinates": [[[1.0, 1.0], [1.0, 1.0], [1.1, 1.0], [1.0, 1.0]]]
            }}
        }]"#;
        match Catalog::from_json(json) {
            Err(CatalogError::DegenerateBoundary { name, points }) => {
                assert_eq!(name, "Stutter");
                assert_eq!(points, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn repeated_points_count_once() {
        let mut area = square("Square", 1, 49.30, -123.14);
        area.boundary.push(area.boundary[0]);
        area.boundary.push(area.boundary[1]);
        assert!(Catalog::new(vec![area]).is_ok());

        let corner = Coordinate::new(49.30, -123.14);
        let pinched = Area {
            id: AreaId(2),
            name: "Pinched".to_string(),
            centroid: corner,
            boundary: vec![corner, corner, Coordinate::new(49.31, -123.14), corner],
        };
        assert!(matches!(
            Catalog::new(vec![pinched]),
            Err(CatalogError::DegenerateBoundary { points: 2, .. })
        ));
    }

    #[test]
    fn rejects_missing_geometry() {
        let json = r#"[{
            "park_name": "Nowhere",
            "geo_point_2d": { "lat": 1.0, "lon": 1.0 },
            "geom": { "type": "Feature", "properties": {}, "geometry": {
                "type": "Point", "coordinates": [1.0, 1.0]
            }}
        }]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::MissingBoundary { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let areas = vec![square("A", 7, 1.0, 1.0), square("B", 7, 2.0, 2.0)];
        assert!(matches!(
            Catalog::new(areas),
            Err(CatalogError::DuplicateId(AreaId(7)))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Catalog::from_json("{ not json"),
            Err(CatalogError::Malformed(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Catalog::load("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err}").contains("/definitely/not/here.json"));
    }

    #[test]
    fn catalog_preserves_order() {
        let areas = vec![
            square("Charlie", 3, 0.0, 0.0),
            square("Alpha", 1, 0.0, 0.0),
            square("Bravo", 2, 0.0, 0.0),
        ];
        let catalog = Catalog::new(areas).unwrap();
        let names: Vec<_> = catalog.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Charlie", "Alpha", "Bravo"]);
    }
}
