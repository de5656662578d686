//! Annotated-point documents: `{"points": [{"id", "x", "y"}], "imageReference"}`.

use std::path::Path;

use foundation::PointId;
use overlay::{AnnotatedPoint, ImageInfo, OverlayController, OverlayError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FormatError, read_file};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsDocument {
    #[serde(default)]
    pub points: Vec<RawPoint>,
    #[serde(
        default,
        rename = "imageReference",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_reference: Option<String>,
}

/// The document names a different image than the one loaded. Loading still
/// proceeds; this is surfaced to the user as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceMismatch {
    pub document: String,
    pub loaded: Option<String>,
}

impl std::fmt::Display for ReferenceMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.loaded {
            Some(loaded) => write!(
                f,
                "points reference image {:?} but {:?} is loaded",
                self.document, loaded
            ),
            None => write!(
                f,
                "points reference image {:?} but the loaded image has no name",
                self.document
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointsAttached {
    pub loaded: usize,
    pub skipped: usize,
    pub mismatch: Option<ReferenceMismatch>,
}

impl PointsDocument {
    pub fn from_json_str(s: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        Self::from_json_str(&read_file(path.as_ref())?)
    }

    /// Points with both coordinates, in document order. A missing id falls
    /// back to the point's 1-based position in the document.
    pub fn annotated_points(&self) -> Vec<AnnotatedPoint> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let (x, y) = (p.x?, p.y?);
                let id = p
                    .id
                    .as_ref()
                    .and_then(id_from_value)
                    .unwrap_or_else(|| PointId::new((i + 1).to_string()));
                Some(AnnotatedPoint::new(id, x, y))
            })
            .collect()
    }

    pub fn check_image_reference(&self, image: &ImageInfo) -> Option<ReferenceMismatch> {
        let document = self.image_reference.as_deref().filter(|r| !r.is_empty())?;
        if image.file_name.as_deref() == Some(document) {
            return None;
        }
        let mismatch = ReferenceMismatch {
            document: document.to_string(),
            loaded: image.file_name.clone(),
        };
        warn!("{mismatch}");
        Some(mismatch)
    }

    /// Replace the controller's annotations with this document's points.
    /// Fails with `ImageNotLoaded` before any image is loaded.
    pub fn attach_to(
        &self,
        controller: &mut OverlayController,
    ) -> Result<PointsAttached, OverlayError> {
        let image = controller
            .state()
            .image()
            .cloned()
            .ok_or(OverlayError::ImageNotLoaded)?;
        let mismatch = self.check_image_reference(&image);
        let points = self.annotated_points();
        let skipped = self.points.len() - points.len();
        if skipped > 0 {
            debug!(skipped, "points without x/y ignored");
        }
        let loaded = controller.load_annotations(points)?;
        Ok(PointsAttached {
            loaded,
            skipped,
            mismatch,
        })
    }
}

fn id_from_value(v: &Value) -> Option<PointId> {
    match v {
        Value::String(s) if !s.is_empty() => Some(PointId::new(s.clone())),
        Value::Number(n) => Some(PointId::new(n.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{PointsDocument, ReferenceMismatch};
    use foundation::{GeoPoint, PointId};
    use overlay::{ImageInfo, OverlayConfig, OverlayController, OverlayError};
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"{
        "imageReference": "trail.png",
        "points": [
            {"id": "A-1", "x": 10.5, "y": 20},
            {"id": 7, "x": 100, "y": 200},
            {"id": "no-y", "x": 3},
            {"x": 4, "y": 5}
        ]
    }"#;

    #[test]
    fn reads_points_and_stringifies_ids() {
        let doc = PointsDocument::from_json_str(DOC).unwrap();
        let points = doc.annotated_points();
        let ids: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["A-1", "7", "4"]);
        assert_eq!(points[0].image_pos.x, 10.5);
        assert_eq!(points[1].image_pos.y, 200.0);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(PointsDocument::from_json_str("{\"points\": [").is_err());
    }

    #[test]
    fn mismatch_is_a_warning_not_an_error() {
        let doc = PointsDocument::from_json_str(DOC).unwrap();
        assert_eq!(
            doc.check_image_reference(&ImageInfo::new(10, 10).with_file_name("trail.png")),
            None
        );
        assert_eq!(
            doc.check_image_reference(&ImageInfo::new(10, 10).with_file_name("other.png")),
            Some(ReferenceMismatch {
                document: "trail.png".to_string(),
                loaded: Some("other.png".to_string()),
            })
        );

        let unnamed = PointsDocument::from_json_str(r#"{"points": []}"#).unwrap();
        assert_eq!(
            unnamed.check_image_reference(&ImageInfo::new(10, 10)),
            None
        );
    }

    #[test]
    fn attaching_requires_an_image() {
        let doc = PointsDocument::from_json_str(DOC).unwrap();
        let mut controller = OverlayController::new(OverlayConfig::default());
        assert_eq!(
            doc.attach_to(&mut controller),
            Err(OverlayError::ImageNotLoaded)
        );

        controller.set_map_view(GeoPoint::new(34.85, 135.47), 15);
        controller
            .load_image(ImageInfo::new(400, 300).with_file_name("other.png"))
            .unwrap();
        let attached = doc.attach_to(&mut controller).unwrap();
        assert_eq!(attached.loaded, 3);
        assert_eq!(attached.skipped, 1);
        assert!(attached.mismatch.is_some());
        assert_eq!(controller.annotations()[1].id, PointId::new("7"));
    }
}
