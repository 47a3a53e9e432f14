//! Web Mercator viewport math for screen-space picking.
//!
//! Uses 512 px tiles like MapLibre: the world is `512 * 2^zoom` pixels wide
//! and the viewport center sits in the middle of the canvas.

use std::f64::consts::PI;

use crate::engine::{LngLat, ScreenPoint};

/// Tile size in pixels at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A camera over a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LngLat,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(center: LngLat, zoom: f64, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn to_world(&self, lng_lat: LngLat) -> (f64, f64) {
        let size = self.world_size();
        let lat = lng_lat.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (lng_lat.lng + 180.0) / 360.0 * size;
        let y = (1.0 - lat.tan().asinh() / PI) / 2.0 * size;
        (x, y)
    }

    fn from_world(&self, x: f64, y: f64) -> LngLat {
        let size = self.world_size();
        let lng = x / size * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
        LngLat::new(lng, lat)
    }

    /// Geographic position to canvas pixel.
    pub fn project(&self, lng_lat: LngLat) -> ScreenPoint {
        let (cx, cy) = self.to_world(self.center);
        let (x, y) = self.to_world(lng_lat);
        ScreenPoint::new(
            x - cx + self.width as f64 / 2.0,
            y - cy + self.height as f64 / 2.0,
        )
    }

    /// Canvas pixel to geographic position.
    pub fn unproject(&self, point: ScreenPoint) -> LngLat {
        let (cx, cy) = self.to_world(self.center);
        self.from_world(
            cx + point.x - self.width as f64 / 2.0,
            cy + point.y - self.height as f64 / 2.0,
        )
    }
}
