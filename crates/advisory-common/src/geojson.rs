//! GeoJSON types for advisory datasets.
//!
//! Advisory feeds are GeoJSON `FeatureCollection`s of polygons with a free-form
//! attribute bag. Attributes are kept as raw JSON values; the map core reads
//! them defensively and never assumes a field is present.

use serde::{Deserialize, Serialize};

use crate::error::{AdvisoryError, AdvisoryResult};

/// Free-form feature attributes.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Array of features.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    /// Add a feature to the collection.
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Parse a collection from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> AdvisoryResult<Self> {
        let collection: FeatureCollection = serde_json::from_slice(bytes)?;
        if collection.type_ != "FeatureCollection" {
            return Err(AdvisoryError::InvalidGeoJson(format!(
                "expected FeatureCollection, got {}",
                collection.type_
            )));
        }
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional feature identifier (string or number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    /// Geometry; GeoJSON allows null.
    pub geometry: Option<Geometry>,

    /// Attribute bag; GeoJSON allows null.
    pub properties: Option<Properties>,
}

impl Feature {
    /// Create a polygon feature from a single exterior ring of (lon, lat) pairs.
    pub fn polygon(ring: &[(f64, f64)]) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry: Some(Geometry::Polygon {
                coordinates: vec![ring.iter().map(|&(lon, lat)| Position::new(lon, lat)).collect()],
            }),
            properties: None,
        }
    }

    /// Set the attribute bag.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Whether the feature's geometry covers the given point.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry
            .as_ref()
            .map(|g| g.contains(lon, lat))
            .unwrap_or(false)
    }
}

/// A longitude/latitude position. Extra ordinates (altitude) are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = AdvisoryError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        match value.as_slice() {
            [lon, lat, ..] => Ok(Self::new(*lon, *lat)),
            _ => Err(AdvisoryError::InvalidGeoJson(format!(
                "position needs at least 2 ordinates, got {}",
                value.len()
            ))),
        }
    }
}

impl From<Position> for Vec<f64> {
    fn from(p: Position) -> Self {
        vec![p.lon, p.lat]
    }
}

/// GeoJSON geometry types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    /// Linear rings; the first is the exterior, the rest are holes.
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    /// Point-in-area test. Only areal geometries can contain a point.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match self {
            Geometry::Polygon { coordinates } => polygon_contains(coordinates, lon, lat),
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .any(|rings| polygon_contains(rings, lon, lat)),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().any(|g| g.contains(lon, lat))
            }
            _ => false,
        }
    }
}

fn polygon_contains(rings: &[Vec<Position>], lon: f64, lat: f64) -> bool {
    let Some((exterior, holes)) = rings.split_first() else {
        return false;
    };
    ring_contains(exterior, lon, lat) && !holes.iter().any(|h| ring_contains(h, lon, lat))
}

/// Even-odd ray casting.
fn ring_contains(ring: &[Position], lon: f64, lat: f64) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > lat) != (b.lat > lat)
            && lon < (b.lon - a.lon) * (lat - a.lat) / (b.lat - a.lat) + a.lon
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
