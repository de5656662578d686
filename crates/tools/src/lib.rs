//! Report builders behind the `georef` binary. Each returns a serializable
//! report; the binary prints it as JSON.

use foundation::dms::{Axis, to_dms};
use foundation::math::{tile_x, tile_y};
use foundation::{GeoBounds, GeoPoint, ImagePoint};
use formats::{GpsTable, PointsDocument, ReferenceMismatch};
use overlay::{
    GeoTransform, ImageInfo, MatchSummary, MatchedPair, OptimizationResult, OverlayConfig,
    OverlayController, OverlayPlacement, ResolvedMarker, match_points,
};
use serde::Serialize;

/// Command-line overrides on top of `OverlayConfig`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewOverrides {
    pub center: Option<GeoPoint>,
    pub zoom: Option<u32>,
    pub scale: Option<f64>,
}

/// A controller with `image` loaded at the configured (or overridden) view.
pub fn load_controller(
    config: &OverlayConfig,
    image: ImageInfo,
    view: ViewOverrides,
) -> Result<OverlayController, String> {
    let mut controller = OverlayController::new(config.clone());
    controller.set_map_view(
        view.center.unwrap_or(config.initial_center),
        view.zoom.unwrap_or(config.map_zoom),
    );
    if let Some(scale) = view.scale {
        if !controller.set_scale(scale) {
            return Err(format!("invalid scale: {scale}"));
        }
    }
    controller.load_image(image).map_err(|e| e.to_string())?;
    Ok(controller)
}

#[derive(Debug, Serialize)]
pub struct FitReport {
    pub placement: OverlayPlacement,
    pub bounds: Option<GeoBounds>,
    pub fit: Option<OptimizationResult>,
    pub matches: MatchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reference_mismatch: Option<ReferenceMismatch>,
    pub points_skipped: usize,
    pub gps_rows_skipped: usize,
    pub markers: Vec<ResolvedMarker>,
}

pub fn fit(
    controller: &mut OverlayController,
    points: &PointsDocument,
    gps: GpsTable,
) -> Result<FitReport, String> {
    let attached = points.attach_to(controller).map_err(|e| e.to_string())?;
    let gps_rows_skipped = gps.skipped.len();
    controller.load_references(gps.points);
    let placement = controller.auto_align().map_err(|e| e.to_string())?;
    Ok(FitReport {
        placement,
        bounds: controller.bounds(),
        fit: controller.last_fit().cloned(),
        matches: controller.match_summary(),
        image_reference_mismatch: attached.mismatch,
        points_skipped: attached.skipped,
        gps_rows_skipped,
        markers: controller.marker_positions().map_err(|e| e.to_string())?,
    })
}

#[derive(Debug, Serialize)]
pub struct MatchReport {
    pub summary: MatchSummary,
    pub pairs: Vec<MatchedPair>,
}

pub fn match_report(points: &PointsDocument, gps: &GpsTable) -> MatchReport {
    let annotated = points.annotated_points();
    MatchReport {
        summary: MatchSummary::new(&annotated, &gps.points),
        pairs: match_points(&annotated, &gps.points),
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectReport {
    pub image: ImagePoint,
    pub geo: GeoPoint,
    pub lat_dms: String,
    pub lng_dms: String,
    pub zoom: u32,
    pub tile_x: u32,
    pub tile_y: u32,
    pub inside_image: bool,
}

pub fn project(placement: &OverlayPlacement, image: ImagePoint) -> Result<ProjectReport, String> {
    let geo = GeoTransform::image_to_geo(image, placement).map_err(|e| e.to_string())?;
    Ok(ProjectReport {
        image,
        geo,
        lat_dms: to_dms(geo.lat, Axis::Latitude),
        lng_dms: to_dms(geo.lng, Axis::Longitude),
        zoom: placement.zoom,
        tile_x: tile_x(geo.lng, placement.zoom),
        tile_y: tile_y(geo.lat, placement.zoom),
        inside_image: image.is_within(placement.image_width, placement.image_height),
    })
}

#[derive(Debug, Serialize)]
pub struct BoundsReport {
    pub bounds: GeoBounds,
    /// NW, NE, SE, SW.
    pub corners: [GeoPoint; 4],
    pub width_m: f64,
    pub height_m: f64,
    pub meters_per_pixel: f64,
}

pub fn bounds(placement: &OverlayPlacement) -> Result<BoundsReport, String> {
    let bounds = GeoTransform::bounds(placement).map_err(|e| e.to_string())?;
    Ok(BoundsReport {
        bounds,
        corners: bounds.corners(),
        width_m: bounds.width_meters(),
        height_m: bounds.height_meters(),
        meters_per_pixel: placement.meters_per_pixel() * placement.scale,
    })
}
