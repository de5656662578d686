use foundation::math::{haversine_km, lat_deg_to_meters, lng_deg_to_meters, meters_per_pixel};
use foundation::math::{MAX_ZOOM, Vec2, meters_to_lat_deg, meters_to_lng_deg};
use foundation::{Corner, GeoBounds, GeoPoint};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::placement::{ImageInfo, OverlayPlacement};
use crate::transform::GeoTransform;

/// Result of a corner drag, for the on-map size readout.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ResizeInfo {
    pub bounds: GeoBounds,
    pub center: GeoPoint,
    pub scale: f64,
    pub width_km: f64,
    pub height_km: f64,
}

pub fn validate_scale(value: f64) -> Result<f64, OverlayError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(OverlayError::InvalidScale(value))
    }
}

/// Out-of-range finite values are clamped; NaN and infinities are errors.
pub fn validate_opacity(value: f64) -> Result<f64, OverlayError> {
    if value.is_finite() {
        Ok(value.clamp(0.0, 1.0))
    } else {
        Err(OverlayError::InvalidOpacity(value))
    }
}

/// The single active overlay and the live control values.
///
/// Scale, opacity and zoom exist before any image is loaded (they are the
/// control values the next image is placed with). The center only becomes
/// an overlay center once an image is loaded.
#[derive(Debug, Clone)]
pub struct OverlayState {
    image: Option<ImageInfo>,
    center: GeoPoint,
    scale: f64,
    opacity: f64,
    zoom: u32,
    default_opacity: f64,
}

impl OverlayState {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            image: None,
            center: config.initial_center,
            scale: validate_scale(config.default_scale).unwrap_or(crate::config::DEFAULT_SCALE),
            opacity: validate_opacity(config.default_opacity)
                .unwrap_or(crate::config::DEFAULT_OPACITY),
            zoom: config.map_zoom.min(MAX_ZOOM),
            default_opacity: validate_opacity(config.default_opacity)
                .unwrap_or(crate::config::DEFAULT_OPACITY),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn image(&self) -> Option<&ImageInfo> {
        self.image.as_ref()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn placement(&self) -> Option<OverlayPlacement> {
        let image = self.image.as_ref()?;
        OverlayPlacement::new(image, self.center, self.scale, self.opacity, self.zoom).ok()
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoTransform::bounds(&self.placement()?).ok()
    }

    /// Replace the active image. The new overlay is centered on `map_center`
    /// and sized by the current scale and zoom.
    pub fn load_image(
        &mut self,
        image: ImageInfo,
        map_center: GeoPoint,
    ) -> Result<OverlayPlacement, OverlayError> {
        if !map_center.is_valid() {
            return Err(OverlayError::InvalidCenter {
                lat: map_center.lat,
                lng: map_center.lng,
            });
        }
        let placement =
            OverlayPlacement::new(&image, map_center, self.scale, self.opacity, self.zoom)?;
        info!(
            width = image.width,
            height = image.height,
            file = image.file_name.as_deref().unwrap_or("-"),
            "image loaded"
        );
        self.image = Some(image);
        self.center = map_center;
        Ok(placement)
    }

    /// Returns `false` (and changes nothing) without a loaded image or for an
    /// invalid coordinate.
    pub fn set_center(&mut self, center: GeoPoint) -> bool {
        if !self.is_loaded() || !center.is_valid() {
            return false;
        }
        self.center = center;
        true
    }

    /// Move the overlay by a lat/lng delta (center-marker drag).
    pub fn translate(&mut self, d_lat: f64, d_lng: f64) -> bool {
        self.set_center(self.center.offset(d_lat, d_lng))
    }

    /// Live scale input. Invalid values are ignored and the last valid scale
    /// is kept.
    pub fn set_scale(&mut self, value: f64) -> bool {
        match validate_scale(value) {
            Ok(v) => {
                self.scale = v;
                true
            }
            Err(e) => {
                debug!("keeping scale {}: {e}", self.scale);
                false
            }
        }
    }

    /// Live opacity input, clamped to [0, 1]; non-numbers reset to the
    /// default. Returns the opacity now in effect.
    pub fn set_opacity(&mut self, value: f64) -> f64 {
        self.opacity = validate_opacity(value).unwrap_or_else(|e| {
            debug!("resetting opacity: {e}");
            self.default_opacity
        });
        self.opacity
    }

    /// Zoom levels past `MAX_ZOOM` are clamped. Returns `true` if the zoom
    /// changed.
    pub fn set_map_zoom(&mut self, zoom: u32) -> bool {
        let zoom = zoom.min(MAX_ZOOM);
        let changed = self.zoom != zoom;
        self.zoom = zoom;
        changed
    }

    /// Apply a fitted center and scale together, or neither.
    pub fn apply_fit(
        &mut self,
        center: GeoPoint,
        scale: f64,
    ) -> Result<OverlayPlacement, OverlayError> {
        if !self.is_loaded() {
            return Err(OverlayError::ImageNotLoaded);
        }
        let scale = validate_scale(scale)?;
        if !center.is_valid() {
            return Err(OverlayError::InvalidCenter {
                lat: center.lat,
                lng: center.lng,
            });
        }
        self.center = center;
        self.scale = scale;
        self.placement().ok_or(OverlayError::ImageNotLoaded)
    }

    /// Drag `corner` to `to`, keeping the opposite corner fixed and the
    /// image's natural aspect ratio. The scale is re-derived from the new
    /// bounds so that placement and bounds never disagree.
    pub fn resize_by_corner(
        &mut self,
        corner: Corner,
        to: GeoPoint,
    ) -> Result<ResizeInfo, OverlayError> {
        let image = self.image.as_ref().ok_or(OverlayError::ImageNotLoaded)?;
        let placement = self.placement().ok_or(OverlayError::ImageNotLoaded)?;
        if !to.is_finite() {
            return Err(OverlayError::DegenerateResize);
        }

        let anchor = GeoTransform::bounds(&placement)?.corner(corner.opposite());

        // Dragged extent along each axis, measured independently.
        let mid_lat = (to.lat + anchor.lat) / 2.0;
        let height_m = lat_deg_to_meters((to.lat - anchor.lat).abs());
        let width_m = lng_deg_to_meters((to.lng - anchor.lng).abs(), mid_lat);

        // Shrink whichever axis overshoots the natural aspect ratio.
        let ratio = image.aspect_ratio();
        let (height_m, width_m) = if width_m / height_m > ratio {
            (height_m, height_m * ratio)
        } else {
            (width_m / ratio, width_m)
        };

        let lat_delta = meters_to_lat_deg(height_m);
        let (south, north) = if corner.is_north() {
            (anchor.lat, anchor.lat + lat_delta)
        } else {
            (anchor.lat - lat_delta, anchor.lat)
        };
        let center_lat = (south + north) / 2.0;
        let lng_delta = meters_to_lng_deg(width_m, center_lat);
        let (west, east) = if corner.is_east() {
            (anchor.lng, anchor.lng + lng_delta)
        } else {
            (anchor.lng - lng_delta, anchor.lng)
        };

        let bounds = GeoBounds::new(south, west, north, east);
        if !bounds.is_valid() {
            return Err(OverlayError::DegenerateResize);
        }
        let center = bounds.center();
        if !center.is_valid() {
            return Err(OverlayError::DegenerateResize);
        }

        let ground_diagonal = Vec2::new(width_m, height_m).length();
        let ground_per_px = meters_per_pixel(center.lat, self.zoom);
        let scale = ground_diagonal / (image.diagonal_px() * ground_per_px);
        let scale = validate_scale(scale).map_err(|_| OverlayError::DegenerateResize)?;

        self.center = center;
        self.scale = scale;

        let width_km = haversine_km(
            GeoPoint::new(center.lat, bounds.west),
            GeoPoint::new(center.lat, bounds.east),
        );
        let height_km = haversine_km(
            GeoPoint::new(bounds.south, center.lng),
            GeoPoint::new(bounds.north, center.lng),
        );
        debug!(?corner, scale, width_km, height_km, "overlay resized");

        Ok(ResizeInfo {
            bounds,
            center,
            scale,
            width_km,
            height_km,
        })
    }
}
