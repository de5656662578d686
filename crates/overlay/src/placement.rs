use foundation::GeoPoint;
use foundation::math::meters_per_pixel;
use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// Metadata of the decoded raster handed over by the image loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.width == 0 || self.height == 0 {
            return Err(OverlayError::InvalidImage {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Natural width over natural height.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    pub fn diagonal_px(&self) -> f64 {
        f64::from(self.width).hypot(f64::from(self.height))
    }
}

/// Where and how large the active image is drawn.
///
/// `zoom` is the map zoom the placement was computed at; the overlay's
/// ground size depends on it through the meters-per-pixel factor.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlacement {
    pub center: GeoPoint,
    pub scale: f64,
    pub opacity: f64,
    pub image_width: u32,
    pub image_height: u32,
    pub zoom: u32,
}

impl OverlayPlacement {
    pub fn new(
        image: &ImageInfo,
        center: GeoPoint,
        scale: f64,
        opacity: f64,
        zoom: u32,
    ) -> Result<Self, OverlayError> {
        image.validate()?;
        Ok(Self {
            center,
            scale,
            opacity,
            image_width: image.width,
            image_height: image.height,
            zoom,
        })
    }

    pub fn with_center(self, center: GeoPoint) -> Self {
        Self { center, ..self }
    }

    pub fn with_scale(self, scale: f64) -> Self {
        Self { scale, ..self }
    }

    pub fn meters_per_pixel(&self) -> f64 {
        meters_per_pixel(self.center.lat, self.zoom)
    }

    pub fn image_size(&self) -> (f64, f64) {
        (f64::from(self.image_width), f64::from(self.image_height))
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageInfo, OverlayPlacement};
    use crate::error::OverlayError;
    use foundation::GeoPoint;

    #[test]
    fn zero_sized_image_is_rejected() {
        let err = OverlayPlacement::new(
            &ImageInfo::new(0, 500),
            GeoPoint::new(34.85, 135.47),
            0.3,
            0.5,
            15,
        )
        .unwrap_err();
        assert_eq!(
            err,
            OverlayError::InvalidImage {
                width: 0,
                height: 500
            }
        );
    }

    #[test]
    fn aspect_and_diagonal() {
        let img = ImageInfo::new(300, 400).with_file_name("map.png");
        assert_eq!(img.aspect_ratio(), 0.75);
        assert_eq!(img.diagonal_px(), 500.0);
        assert_eq!(img.file_name.as_deref(), Some("map.png"));
    }
}
