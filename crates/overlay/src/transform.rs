//! Pixel <-> geographic conversion for a placed image.
//!
//! All math uses a spherical Earth: meter offsets become degree offsets with
//! the WGS84 semi-major axis as radius, and the meters-per-pixel factor is
//! the Web-Mercator one evaluated at the placement's center latitude. The
//! approximation is deliberate; fit results depend on it.

use foundation::GeoBounds;
use foundation::math::{
    MAX_ZOOM, Vec2, lat_deg_to_meters, lng_deg_to_meters, meters_to_lat_deg, meters_to_lng_deg,
};
use foundation::{GeoPoint, ImagePoint};

use crate::error::OverlayError;
use crate::placement::OverlayPlacement;

pub struct GeoTransform;

impl GeoTransform {
    /// Rejects placements no transform can be computed for.
    pub fn check(placement: &OverlayPlacement) -> Result<(), OverlayError> {
        if placement.image_width == 0 || placement.image_height == 0 {
            return Err(OverlayError::InvalidImage {
                width: placement.image_width,
                height: placement.image_height,
            });
        }
        if !placement.scale.is_finite() || placement.scale <= 0.0 {
            return Err(OverlayError::InvalidScale(placement.scale));
        }
        let mpp = placement.meters_per_pixel();
        if placement.zoom > MAX_ZOOM || !mpp.is_finite() || mpp <= 0.0 {
            return Err(OverlayError::InvalidResolution {
                lat: placement.center.lat,
                zoom: placement.zoom,
            });
        }
        Ok(())
    }

    pub fn image_to_geo(
        point: ImagePoint,
        placement: &OverlayPlacement,
    ) -> Result<GeoPoint, OverlayError> {
        Self::check(placement)?;
        Ok(project(point, placement))
    }

    pub fn geo_to_image(
        point: GeoPoint,
        placement: &OverlayPlacement,
    ) -> Result<ImagePoint, OverlayError> {
        Self::check(placement)?;
        let c = placement.center;
        let north = lat_deg_to_meters(point.lat - c.lat);
        let east = lng_deg_to_meters(point.lng - c.lng, c.lat);
        let px_per_m = 1.0 / (placement.scale * placement.meters_per_pixel());
        let p = image_center(placement) + Vec2::new(east, -north) * px_per_m;
        Ok(ImagePoint::new(p.x, p.y))
    }

    /// Geographic rectangle covered by the image.
    pub fn bounds(placement: &OverlayPlacement) -> Result<GeoBounds, OverlayError> {
        Self::check(placement)?;
        let c = placement.center;
        let (w, h) = placement.image_size();
        let m = placement.scale * placement.meters_per_pixel();
        let lat_offset = meters_to_lat_deg(h * m / 2.0);
        let lng_offset = meters_to_lng_deg(w * m / 2.0, c.lat);
        Ok(GeoBounds::new(
            c.lat - lat_offset,
            c.lng - lng_offset,
            c.lat + lat_offset,
            c.lng + lng_offset,
        ))
    }
}

/// East/north meters of `point` from the image center. Caller has validated
/// the placement.
fn ground_offset(point: ImagePoint, placement: &OverlayPlacement) -> Vec2 {
    let m = placement.scale * placement.meters_per_pixel();
    let px = Vec2::new(point.x, point.y) - image_center(placement);
    // Image y grows downward, latitude grows northward.
    Vec2::new(px.x, -px.y) * m
}

fn image_center(placement: &OverlayPlacement) -> Vec2 {
    let (w, h) = placement.image_size();
    Vec2::new(w / 2.0, h / 2.0)
}

pub(crate) fn project(point: ImagePoint, placement: &OverlayPlacement) -> GeoPoint {
    let c = placement.center;
    let offset = ground_offset(point, placement);
    GeoPoint::new(
        c.lat + meters_to_lat_deg(offset.y),
        c.lng + meters_to_lng_deg(offset.x, c.lat),
    )
}
