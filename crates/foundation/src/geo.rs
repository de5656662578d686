use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees.
///
/// `new` does not validate; candidate positions produced during a fit may
/// briefly leave the valid range. Use `try_new` for external input.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `None` unless `lat` is in [-90, 90] and `lng` in [-180, 180].
    pub fn try_new(lat: f64, lng: f64) -> Option<Self> {
        let p = Self::new(lat, lng);
        p.is_valid().then_some(p)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn offset(self, d_lat: f64, d_lng: f64) -> Self {
        Self::new(self.lat + d_lat, self.lng + d_lng)
    }
}

/// Pixel position measured from the image's top-left corner, in natural
/// (unscaled) pixels. Y grows downward.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_within(&self, width: u32, height: u32) -> bool {
        (0.0..=f64::from(width)).contains(&self.x) && (0.0..=f64::from(height)).contains(&self.y)
    }
}
