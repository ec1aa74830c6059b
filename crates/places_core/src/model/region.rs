//! Map camera targets handed to the presentation layer.

use super::place::Coordinates;

/// Initial map center (Bangkok) used before any location fix.
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    latitude: 13.736717,
    longitude: 100.523186,
};
/// Zoom span of the initial map region.
pub const DEFAULT_DELTA: f64 = 0.01;

/// Visible map area: a center plus latitude/longitude spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Square region centered on `center`.
    pub fn around(center: Coordinates, delta: f64) -> Self {
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
            latitude_delta: delta,
            longitude_delta: delta,
        }
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

impl Default for MapRegion {
    fn default() -> Self {
        Self::around(DEFAULT_CENTER, DEFAULT_DELTA)
    }
}

/// Animated camera move request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMove {
    pub region: MapRegion,
    pub duration_ms: u32,
}
