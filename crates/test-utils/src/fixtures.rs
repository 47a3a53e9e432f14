//! Common test fixtures for advisory-map tests.
//!
//! The geometry fixtures are laid out for the default viewport (center 0,0,
//! zoom 2) on an 800x600 canvas, so the pixel constants in [`pixels`] land on
//! known features.

use serde_json::{json, Value};

/// Canvas and viewport used by the fixtures.
pub mod viewport {
    pub const WIDTH: u32 = 800;
    pub const HEIGHT: u32 = 600;
    pub const CENTER: (f64, f64) = (0.0, 0.0);
    pub const ZOOM: f64 = 2.0;
}

/// Screen points relative to the fixture polygons.
pub mod pixels {
    /// (5.27, 5.27): inside the SIGMET square and the AIRSIGMET square.
    pub const OVERLAP: (f64, f64) = (430.0, 270.0);

    /// (-5.27, -5.27): inside the SIGMET square only.
    pub const SIGMET_ONLY: (f64, f64) = (370.0, 330.0);

    /// (28.1, 0.0): inside the base-only SIGMET strip.
    pub const BASE_ONLY_SIGMET: (f64, f64) = (560.0, 300.0);

    /// (52.7, 33.1): no advisory.
    pub const EMPTY: (f64, f64) = (700.0, 100.0);

    /// Canvas center, (0, 0).
    pub const CENTER: (f64, f64) = (400.0, 300.0);
}

/// A fixed validity window (2024-03-01T18:55Z to 22:55Z).
pub mod time {
    pub const VALID_FROM: &str = "2024-03-01T18:55:00Z";
    pub const VALID_TO: &str = "2024-03-01T22:55:00Z";
    pub const VALID_FROM_DISPLAY: &str = "2024-03-01 18:55 UTC";
    pub const VALID_TO_DISPLAY: &str = "2024-03-01 22:55 UTC";
}

fn square(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [min_lon, min_lat],
            [max_lon, min_lat],
            [max_lon, max_lat],
            [min_lon, max_lat],
            [min_lon, min_lat]
        ]]
    })
}

/// Attributes of the SIGMET square covering (-10..10, -10..10).
pub fn sigmet_turbulence_properties() -> Value {
    json!({
        "icaoId": "KKCI",
        "hazard": "TURB",
        "base": 10000,
        "top": 30000,
        "validTimeFrom": time::VALID_FROM,
        "validTimeTo": time::VALID_TO,
        "rawSigmet": "WSUS32 KKCI 011855\nSIGW\nCONVECTIVE SIGMET 12W"
    })
}

/// Two SIGMETs: a turbulence square at the origin and a base-only strip
/// (20..40, -5..5) reporting no top.
pub fn sigmet_collection() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "sigmet-1",
                "geometry": square(-10.0, -10.0, 10.0, 10.0),
                "properties": sigmet_turbulence_properties()
            },
            {
                "type": "Feature",
                "id": "sigmet-2",
                "geometry": square(20.0, -5.0, 40.0, 5.0),
                "properties": {
                    "hazard": "ICE",
                    "base": 25000,
                    "validTimeFrom": time::VALID_FROM,
                    "validTimeTo": time::VALID_TO
                }
            }
        ]
    })
}

/// One AIRSIGMET square covering (0..20, 0..20).
pub fn airsigmet_collection() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "airsigmet-1",
                "geometry": square(0.0, 0.0, 20.0, 20.0),
                "properties": {
                    "hazard": "IFR",
                    "altitudeLow1": 8000,
                    "altitudeHi1": 12000,
                    "altitudeHi2": 18000,
                    "validTimeFrom": time::VALID_FROM,
                    "validTimeTo": time::VALID_TO,
                    "rawAirSigmet": "WAUS45 KKCI 011845\nSLCS WA 011845"
                }
            }
        ]
    })
}

/// An empty FeatureCollection, as returned on upstream failure.
pub fn empty_collection() -> Value {
    json!({"type": "FeatureCollection", "features": []})
}

/// Serialize a fixture to bytes.
pub fn to_bytes(value: &Value) -> Vec<u8> {
    value.to_string().into_bytes()
}
