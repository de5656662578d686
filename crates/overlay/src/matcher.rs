use std::collections::{HashMap, HashSet};

use foundation::{GeoPoint, ImagePoint, PointId};
use serde::{Deserialize, Serialize};

/// A point marked on the image by the annotation source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPoint {
    pub id: PointId,
    pub image_pos: ImagePoint,
}

impl AnnotatedPoint {
    pub fn new(id: impl Into<PointId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            image_pos: ImagePoint::new(x, y),
        }
    }
}

/// A surveyed GPS position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub id: PointId,
    pub geo_pos: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl ReferencePoint {
    pub fn new(id: impl Into<PointId>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            geo_pos: GeoPoint::new(lat, lng),
            altitude: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub annotated: AnnotatedPoint,
    pub reference: ReferencePoint,
}

/// Join annotated points to references by exact id.
///
/// Output follows `annotated` order. When several references share an id the
/// first one wins. Unmatched points on either side are dropped.
pub fn match_points(
    annotated: &[AnnotatedPoint],
    references: &[ReferencePoint],
) -> Vec<MatchedPair> {
    if annotated.is_empty() || references.is_empty() {
        return Vec::new();
    }

    let mut by_id: HashMap<&PointId, &ReferencePoint> = HashMap::with_capacity(references.len());
    for r in references {
        by_id.entry(&r.id).or_insert(r);
    }

    annotated
        .iter()
        .filter_map(|a| {
            by_id.get(&a.id).map(|r| MatchedPair {
                annotated: a.clone(),
                reference: (*r).clone(),
            })
        })
        .collect()
}

/// Counts shown next to the match button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub annotated_total: usize,
    pub reference_total: usize,
    pub matched: usize,
    pub unmatched_annotated: Vec<PointId>,
    pub unmatched_references: Vec<PointId>,
}

impl MatchSummary {
    pub fn new(annotated: &[AnnotatedPoint], references: &[ReferencePoint]) -> Self {
        let pairs = match_points(annotated, references);
        let annotated_ids: HashSet<&PointId> = annotated.iter().map(|a| &a.id).collect();
        let reference_ids: HashSet<&PointId> = references.iter().map(|r| &r.id).collect();

        Self {
            annotated_total: annotated.len(),
            reference_total: references.len(),
            matched: pairs.len(),
            unmatched_annotated: annotated
                .iter()
                .filter(|a| !reference_ids.contains(&a.id))
                .map(|a| a.id.clone())
                .collect(),
            unmatched_references: references
                .iter()
                .filter(|r| !annotated_ids.contains(&r.id))
                .map(|r| r.id.clone())
                .collect(),
        }
    }
}
