use foundation::{GeoPoint, ImagePoint, PointId};
use serde::Serialize;
use tracing::warn;

use crate::error::OverlayError;
use crate::matcher::AnnotatedPoint;
use crate::placement::OverlayPlacement;
use crate::transform::GeoTransform;

/// What changed in a placement notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PlacementChange {
    ImageLoaded,
    Moved,
    Rescaled,
    Resized,
    ZoomChanged,
    OpacityChanged,
    Fitted,
}

/// Emitted after every change to the active placement. Carries the
/// placement as it was right after the change so observers can replay
/// events in order.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PlacementEvent {
    pub change: PlacementChange,
    pub placement: OverlayPlacement,
}

/// Receives placement events in emission order.
pub trait PlacementObserver {
    fn placement_changed(&mut self, seq: u64, event: &PlacementEvent);
}

/// Annotated point with its geographic position under some placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMarker {
    pub id: PointId,
    pub image_pos: ImagePoint,
    pub geo_pos: GeoPoint,
}

pub fn resolve_markers(
    points: &[AnnotatedPoint],
    placement: &OverlayPlacement,
) -> Result<Vec<ResolvedMarker>, OverlayError> {
    points
        .iter()
        .map(|p| {
            Ok(ResolvedMarker {
                id: p.id.clone(),
                image_pos: p.image_pos,
                geo_pos: GeoTransform::image_to_geo(p.image_pos, placement)?,
            })
        })
        .collect()
}

/// Map markers for annotated points.
///
/// Points are kept in image space; geographic positions are re-resolved on
/// every placement event and never carried over from an older placement.
#[derive(Debug, Default, Clone)]
pub struct PointMarkers {
    points: Vec<AnnotatedPoint>,
    resolved: Vec<ResolvedMarker>,
    last_seq: Option<u64>,
}

impl PointMarkers {
    pub fn new(points: Vec<AnnotatedPoint>) -> Self {
        Self {
            points,
            resolved: Vec::new(),
            last_seq: None,
        }
    }

    /// Replace the whole annotation set. Positions stay empty until the next
    /// placement event (or `refresh`).
    pub fn replace_points(&mut self, points: Vec<AnnotatedPoint>) {
        self.points = points;
        self.resolved.clear();
    }

    pub fn refresh(&mut self, placement: &OverlayPlacement) {
        self.resolved = match resolve_markers(&self.points, placement) {
            Ok(markers) => markers,
            Err(e) => {
                warn!("dropping point markers: {e}");
                Vec::new()
            }
        };
    }

    pub fn points(&self) -> &[AnnotatedPoint] {
        &self.points
    }

    pub fn markers(&self) -> &[ResolvedMarker] {
        &self.resolved
    }

    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }
}

impl PlacementObserver for PointMarkers {
    fn placement_changed(&mut self, seq: u64, event: &PlacementEvent) {
        if event.change != PlacementChange::OpacityChanged {
            self.refresh(&event.placement);
        }
        self.last_seq = Some(seq);
    }
}
