//! Single owner of the active overlay.
//!
//! Every mutation goes through the controller, which applies it to the
//! `OverlayState` and queues a `PlacementEvent`. Dependent displays (point
//! markers, drag handles) receive those events in order via `dispatch`.
//!
//! Hosts are expected to `dispatch` or `drain_events` after each batch of
//! mutations. The queue holds at most `MAX_PENDING_EVENTS`; past that the
//! oldest events are dropped and observers see a gap in sequence numbers.

use foundation::{Corner, GeoBounds, GeoPoint};
use runtime::{CancellationToken, EventBus, Sequenced};
use tracing::info;

use crate::config::OverlayConfig;
use crate::error::{OptimizerError, OverlayError};
use crate::markers::{
    PlacementChange, PlacementEvent, PlacementObserver, ResolvedMarker, resolve_markers,
};
use crate::matcher::{AnnotatedPoint, MatchSummary, MatchedPair, ReferencePoint, match_points};
use crate::optimizer::{OptimizationResult, Optimizer, OptimizerConfig};
use crate::placement::{ImageInfo, OverlayPlacement};
use crate::state::{OverlayState, ResizeInfo};

pub const MAX_PENDING_EVENTS: usize = 256;

#[derive(Debug)]
pub struct OverlayController {
    state: OverlayState,
    map_center: GeoPoint,
    annotations: Vec<AnnotatedPoint>,
    references: Vec<ReferencePoint>,
    optimizer: Optimizer,
    events: EventBus<PlacementEvent>,
    last_fit: Option<OptimizationResult>,
}

impl OverlayController {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            state: OverlayState::new(&config),
            map_center: config.initial_center,
            annotations: Vec::new(),
            references: Vec::new(),
            optimizer: Optimizer::default(),
            events: EventBus::bounded(MAX_PENDING_EVENTS),
            last_fit: None,
        }
    }

    pub fn with_optimizer(mut self, config: OptimizerConfig) -> Self {
        self.optimizer = Optimizer::new(config);
        self
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn placement(&self) -> Option<OverlayPlacement> {
        self.state.placement()
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.state.bounds()
    }

    pub fn map_center(&self) -> GeoPoint {
        self.map_center
    }

    /// Track the base map view. New images are placed at the view center.
    pub fn set_map_view(&mut self, center: GeoPoint, zoom: u32) {
        if center.is_valid() {
            self.map_center = center;
        }
        self.set_map_zoom(zoom);
    }

    pub fn load_image(&mut self, image: ImageInfo) -> Result<OverlayPlacement, OverlayError> {
        let placement = self.state.load_image(image, self.map_center)?;
        self.last_fit = None;
        self.emit(PlacementChange::ImageLoaded);
        Ok(placement)
    }

    /// Replace the annotation set. Requires a loaded image.
    pub fn load_annotations(&mut self, points: Vec<AnnotatedPoint>) -> Result<usize, OverlayError> {
        if !self.state.is_loaded() {
            return Err(OverlayError::ImageNotLoaded);
        }
        info!(count = points.len(), "annotations replaced");
        self.annotations = points;
        Ok(self.annotations.len())
    }

    pub fn annotations(&self) -> &[AnnotatedPoint] {
        &self.annotations
    }

    /// Replace the active GPS reference set.
    pub fn load_references(&mut self, references: Vec<ReferencePoint>) -> usize {
        info!(count = references.len(), "gps references replaced");
        self.references = references;
        self.references.len()
    }

    pub fn references(&self) -> &[ReferencePoint] {
        &self.references
    }

    pub fn matched_pairs(&self) -> Vec<MatchedPair> {
        match_points(&self.annotations, &self.references)
    }

    pub fn match_summary(&self) -> MatchSummary {
        MatchSummary::new(&self.annotations, &self.references)
    }

    /// Geographic positions of the annotated points under the current
    /// placement, computed fresh on every call.
    pub fn marker_positions(&self) -> Result<Vec<ResolvedMarker>, OverlayError> {
        let placement = self.state.placement().ok_or(OverlayError::ImageNotLoaded)?;
        resolve_markers(&self.annotations, &placement)
    }

    pub fn set_center(&mut self, center: GeoPoint) -> bool {
        let changed = self.state.set_center(center);
        if changed {
            self.emit(PlacementChange::Moved);
        }
        changed
    }

    pub fn translate(&mut self, d_lat: f64, d_lng: f64) -> bool {
        let changed = self.state.translate(d_lat, d_lng);
        if changed {
            self.emit(PlacementChange::Moved);
        }
        changed
    }

    pub fn set_scale(&mut self, value: f64) -> bool {
        let changed = self.state.set_scale(value);
        if changed {
            self.emit(PlacementChange::Rescaled);
        }
        changed
    }

    pub fn set_opacity(&mut self, value: f64) -> f64 {
        let applied = self.state.set_opacity(value);
        self.emit(PlacementChange::OpacityChanged);
        applied
    }

    pub fn set_map_zoom(&mut self, zoom: u32) -> bool {
        let changed = self.state.set_map_zoom(zoom);
        if changed {
            self.emit(PlacementChange::ZoomChanged);
        }
        changed
    }

    pub fn resize_by_corner(
        &mut self,
        corner: Corner,
        to: GeoPoint,
    ) -> Result<ResizeInfo, OverlayError> {
        let info = self.state.resize_by_corner(corner, to)?;
        self.emit(PlacementChange::Resized);
        Ok(info)
    }

    /// Fit the overlay to `pairs` and apply the result. On any error the
    /// placement is left untouched.
    pub fn apply_optimization_result(
        &mut self,
        pairs: &[MatchedPair],
    ) -> Result<OverlayPlacement, OptimizerError> {
        self.apply_optimization_result_with_cancel(pairs, &CancellationToken::new())
    }

    pub fn apply_optimization_result_with_cancel(
        &mut self,
        pairs: &[MatchedPair],
        cancel: &CancellationToken,
    ) -> Result<OverlayPlacement, OptimizerError> {
        let base = self.state.placement().ok_or(OptimizerError::ImageNotLoaded)?;
        let result = self.optimizer.solve_with_cancel(pairs, &base, cancel)?;
        let placement = self.state.apply_fit(result.center, result.scale)?;
        info!(
            lat = result.center.lat,
            lng = result.center.lng,
            scale = result.scale,
            rms_m = result.rms_error_m(),
            "overlay aligned to gps"
        );
        self.last_fit = Some(result);
        self.emit(PlacementChange::Fitted);
        Ok(placement)
    }

    /// Match the loaded annotations against the loaded references and fit.
    pub fn auto_align(&mut self) -> Result<OverlayPlacement, OptimizerError> {
        let pairs = self.matched_pairs();
        self.apply_optimization_result(&pairs)
    }

    pub fn last_fit(&self) -> Option<&OptimizationResult> {
        self.last_fit.as_ref()
    }

    pub fn pending_events(&self) -> &[Sequenced<PlacementEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Sequenced<PlacementEvent>> {
        self.events.drain()
    }

    /// Events lost because nobody drained the queue in time.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    /// Deliver queued events, in order, to every observer. Returns the number
    /// of events delivered.
    pub fn dispatch(&mut self, observers: &mut [&mut dyn PlacementObserver]) -> usize {
        let events = self.events.drain();
        for e in &events {
            for observer in observers.iter_mut() {
                observer.placement_changed(e.seq, &e.event);
            }
        }
        events.len()
    }

    fn emit(&mut self, change: PlacementChange) {
        if let Some(placement) = self.state.placement() {
            self.events.emit(PlacementEvent { change, placement });
        }
    }
}

impl Default for OverlayController {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_PENDING_EVENTS, OverlayController};
    use crate::config::OverlayConfig;
    use crate::error::{OptimizerError, OverlayError};
    use crate::markers::{PlacementChange, PlacementObserver, PointMarkers};
    use crate::matcher::{AnnotatedPoint, ReferencePoint};
    use crate::optimizer::OptimizerConfig;
    use crate::placement::{ImageInfo, OverlayPlacement};
    use crate::transform::GeoTransform;
    use foundation::{Corner, GeoPoint};
    use pretty_assertions::assert_eq;

    fn controller_with_image() -> OverlayController {
        let mut c = OverlayController::new(OverlayConfig::default());
        c.set_map_view(GeoPoint::new(34.8537, 135.4720), 15);
        c.load_image(ImageInfo::new(1000, 500).with_file_name("trail.png"))
            .unwrap();
        c
    }

    /// References placed where `truth` puts each annotated pixel.
    fn references_for(truth: &OverlayPlacement, points: &[AnnotatedPoint]) -> Vec<ReferencePoint> {
        points
            .iter()
            .map(|p| {
                let g = GeoTransform::image_to_geo(p.image_pos, truth).unwrap();
                ReferencePoint::new(p.id.clone(), g.lat, g.lng)
            })
            .collect()
    }

    fn corner_points() -> Vec<AnnotatedPoint> {
        vec![
            AnnotatedPoint::new("P1", 100.0, 50.0),
            AnnotatedPoint::new("P2", 900.0, 50.0),
            AnnotatedPoint::new("P3", 100.0, 450.0),
            AnnotatedPoint::new("P4", 900.0, 450.0),
        ]
    }

    #[test]
    fn image_is_placed_at_map_center() {
        let c = controller_with_image();
        let p = c.placement().unwrap();
        assert_eq!(p.center, GeoPoint::new(34.8537, 135.4720));
        assert_eq!(p.scale, 0.3);
        assert_eq!(p.zoom, 15);
        assert_eq!(c.pending_events().len(), 1);
        assert_eq!(c.pending_events()[0].event.change, PlacementChange::ImageLoaded);
    }

    #[test]
    fn annotations_require_an_image() {
        let mut c = OverlayController::default();
        assert_eq!(
            c.load_annotations(corner_points()),
            Err(OverlayError::ImageNotLoaded)
        );
        assert!(c.marker_positions().is_err());
    }

    #[test]
    fn annotations_are_replaced_not_merged() {
        let mut c = controller_with_image();
        c.load_annotations(corner_points()).unwrap();
        c.load_annotations(vec![AnnotatedPoint::new("Q", 1.0, 1.0)])
            .unwrap();
        assert_eq!(c.annotations().len(), 1);
    }

    #[test]
    fn auto_align_moves_overlay_onto_gps() {
        let mut c = controller_with_image();
        let points = corner_points();
        let truth = c
            .placement()
            .unwrap()
            .with_center(GeoPoint::new(34.8541, 135.4733))
            .with_scale(0.55);
        let refs = references_for(&truth, &points);
        c.load_annotations(points).unwrap();
        c.load_references(refs.clone());
        c.drain_events();

        let placement = c.auto_align().unwrap();
        assert!((placement.scale - 0.55).abs() < 1e-3);
        assert!((placement.center.lat - 34.8541).abs() < 1e-6);
        assert!((placement.center.lng - 135.4733).abs() < 1e-6);
        assert!(c.last_fit().unwrap().total_error <= c.last_fit().unwrap().initial_error);

        for (marker, reference) in c.marker_positions().unwrap().iter().zip(&refs) {
            assert_eq!(marker.id, reference.id);
            assert!((marker.geo_pos.lat - reference.geo_pos.lat).abs() < 1e-6);
            assert!((marker.geo_pos.lng - reference.geo_pos.lng).abs() < 1e-6);
        }

        let events = c.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.change, PlacementChange::Fitted);
    }

    #[test]
    fn failed_fit_leaves_placement_untouched() {
        let mut c = controller_with_image();
        c.load_annotations(vec![
            AnnotatedPoint::new("A", 300.0, 200.0),
            AnnotatedPoint::new("B", 300.0, 200.0),
        ])
        .unwrap();
        c.load_references(vec![
            ReferencePoint::new("A", 34.850, 135.470),
            ReferencePoint::new("B", 34.852, 135.474),
        ]);
        let before = c.placement().unwrap();
        c.drain_events();

        assert!(matches!(
            c.auto_align(),
            Err(OptimizerError::OptimizationFailed { .. })
        ));
        assert_eq!(c.placement().unwrap(), before);
        assert!(c.pending_events().is_empty());
        assert!(c.last_fit().is_none());
    }

    #[test]
    fn single_match_is_insufficient() {
        let mut c = controller_with_image();
        c.load_annotations(corner_points()).unwrap();
        c.load_references(vec![ReferencePoint::new("P2", 34.85, 135.47)]);
        assert_eq!(
            c.auto_align(),
            Err(OptimizerError::InsufficientMatches { found: 1 })
        );
        assert_eq!(c.match_summary().matched, 1);
    }

    #[test]
    fn fit_without_image_is_rejected() {
        let mut c = OverlayController::default();
        assert_eq!(
            c.apply_optimization_result(&[]),
            Err(OptimizerError::ImageNotLoaded)
        );
    }

    #[test]
    fn observers_see_every_change_in_order() {
        let mut c = controller_with_image();
        c.load_annotations(corner_points()).unwrap();
        let mut markers = PointMarkers::new(c.annotations().to_vec());

        c.set_center(GeoPoint::new(34.86, 135.48));
        assert!(!c.set_scale(f64::NAN));
        c.set_scale(0.6);
        let ne = c.bounds().unwrap().corner(Corner::NorthEast);
        c.resize_by_corner(Corner::NorthEast, GeoPoint::new(ne.lat + 0.001, ne.lng + 0.002))
            .unwrap();

        let delivered = c.dispatch(&mut [&mut markers as &mut dyn PlacementObserver]);
        assert_eq!(delivered, 4);
        assert_eq!(markers.last_seq(), Some(3));
        assert_eq!(markers.markers(), c.marker_positions().unwrap().as_slice());
        assert!(c.pending_events().is_empty());
    }

    #[test]
    fn placement_changes_reposition_markers() {
        let mut c = controller_with_image();
        c.load_annotations(vec![AnnotatedPoint::new("C", 500.0, 250.0)])
            .unwrap();
        assert_eq!(
            c.marker_positions().unwrap()[0].geo_pos,
            GeoPoint::new(34.8537, 135.4720)
        );

        c.translate(0.001, -0.002);
        let moved = c.marker_positions().unwrap()[0].geo_pos;
        assert!((moved.lat - 34.8547).abs() < 1e-9);
        assert!((moved.lng - 135.4700).abs() < 1e-9);

        let back = GeoTransform::geo_to_image(moved, &c.placement().unwrap()).unwrap();
        assert!((back.x - 500.0).abs() < 1e-6 && (back.y - 250.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_change_is_an_event_only_when_loaded() {
        let mut c = OverlayController::default();
        assert!(c.set_map_zoom(12));
        assert!(c.pending_events().is_empty());

        let mut c = controller_with_image();
        c.drain_events();
        assert!(c.set_map_zoom(16));
        assert_eq!(c.drain_events()[0].event.placement.zoom, 16);
    }

    #[test]
    fn undrained_events_are_capped() {
        let mut c = controller_with_image();
        for i in 0..(MAX_PENDING_EVENTS + 10) {
            c.set_opacity(if i % 2 == 0 { 0.2 } else { 0.8 });
        }
        assert_eq!(c.pending_events().len(), MAX_PENDING_EVENTS);
        assert_eq!(c.dropped_events(), 11);
        let last = c.pending_events().last().unwrap().seq;
        assert_eq!(last, MAX_PENDING_EVENTS as u64 + 10);
    }

    #[test]
    fn optimizer_config_is_honoured() {
        let mut c = controller_with_image().with_optimizer(OptimizerConfig {
            iterations: 0,
            ..OptimizerConfig::default()
        });
        c.load_annotations(corner_points()).unwrap();
        c.load_references(vec![
            ReferencePoint::new("P1", 34.8560, 135.4700),
            ReferencePoint::new("P4", 34.8540, 135.4760),
        ]);
        let placement = c.auto_align().unwrap();
        // No search steps: the fit stays at the mean reference and the
        // current scale.
        let mean = GeoPoint::new((34.8560 + 34.8540) / 2.0, (135.4700 + 135.4760) / 2.0);
        assert_eq!(placement.center, mean);
        assert_eq!(placement.scale, 0.3);
        assert_eq!(c.last_fit().unwrap().evaluations, 0);
    }
}
