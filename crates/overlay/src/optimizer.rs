//! Center/scale fit of the overlay against matched GPS references.
//!
//! Greedy hill-climbing on a shrinking 3x3 grid of candidate centers. For
//! every candidate center the scale has a closed form (projection of the
//! reference distances onto the unit-scale predicted distances), so only the
//! center is searched. The search is local; it can stop in a local minimum.

use foundation::math::{Vec2, haversine_km};
use foundation::{GeoPoint, ImagePoint};
use runtime::CancellationToken;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::OptimizerError;
use crate::matcher::MatchedPair;
use crate::placement::OverlayPlacement;
use crate::transform::{GeoTransform, project};

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub iterations: u32,
    /// Grid step in degrees at iteration 0.
    pub initial_step_deg: f64,
    /// Step multiplier applied per iteration.
    pub step_decay: f64,
    /// Pairs beyond this count are ignored.
    pub max_pairs: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            initial_step_deg: 0.0001,
            step_decay: 0.9,
            max_pairs: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub center: GeoPoint,
    pub scale: f64,
    /// Sum of squared haversine distances, km².
    pub total_error: f64,
    /// Error of the starting guess (mean reference position, current scale).
    pub initial_error: f64,
    pub pairs_used: usize,
    pub evaluations: usize,
}

impl OptimizationResult {
    /// Root-mean-square residual in meters.
    pub fn rms_error_m(&self) -> f64 {
        if self.pairs_used == 0 {
            return 0.0;
        }
        (self.total_error / self.pairs_used as f64).sqrt() * 1000.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Fit center and scale. `base` supplies image size, zoom and the
    /// starting scale.
    pub fn solve(
        &self,
        pairs: &[MatchedPair],
        base: &OverlayPlacement,
    ) -> Result<OptimizationResult, OptimizerError> {
        self.solve_with_cancel(pairs, base, &CancellationToken::new())
    }

    /// As `solve`, polling `cancel` once per iteration.
    pub fn solve_with_cancel(
        &self,
        pairs: &[MatchedPair],
        base: &OverlayPlacement,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult, OptimizerError> {
        if pairs.len() < 2 {
            return Err(OptimizerError::InsufficientMatches { found: pairs.len() });
        }
        GeoTransform::check(base)?;

        let pairs = if pairs.len() > self.config.max_pairs {
            warn!(
                total = pairs.len(),
                used = self.config.max_pairs,
                "too many matched pairs, extra pairs ignored"
            );
            &pairs[..self.config.max_pairs]
        } else {
            pairs
        };

        if image_spread(pairs) <= 0.0 {
            return Err(OptimizerError::failed(
                "matched points have no separation in the image",
            ));
        }

        let objective = Objective { pairs, base };
        let start = mean_reference(pairs);
        let initial_error = objective.total_error(start, base.scale);
        if !start.is_finite() || !initial_error.is_finite() {
            return Err(OptimizerError::failed("initial guess is not finite"));
        }

        let mut best = Candidate {
            center: start,
            scale: base.scale,
            error: initial_error,
        };
        let mut evaluations = 0usize;

        for k in 0..self.config.iterations {
            if cancel.is_cancelled() {
                return Err(OptimizerError::Cancelled);
            }
            let step = self.config.initial_step_deg * self.config.step_decay.powi(k as i32);
            let origin = best.center;
            for d_lat in [-1.0, 0.0, 1.0] {
                for d_lng in [-1.0, 0.0, 1.0] {
                    evaluations += 1;
                    let center = origin.offset(d_lat * step, d_lng * step);
                    let Some(scale) = objective.optimal_scale(center) else {
                        continue;
                    };
                    let error = objective.total_error(center, scale);
                    if error < best.error {
                        best = Candidate {
                            center,
                            scale,
                            error,
                        };
                    }
                }
            }
        }

        if !best.center.is_finite() || !best.scale.is_finite() || best.scale <= 0.0 {
            return Err(OptimizerError::failed(format!(
                "non-finite or non-positive result (scale {})",
                best.scale
            )));
        }
        if !best.error.is_finite() {
            return Err(OptimizerError::failed("residual error is not finite"));
        }

        debug!(
            pairs = pairs.len(),
            evaluations,
            initial_error,
            final_error = best.error,
            scale = best.scale,
            "fit finished"
        );

        Ok(OptimizationResult {
            center: best.center,
            scale: best.scale,
            total_error: best.error,
            initial_error,
            pairs_used: pairs.len(),
            evaluations,
        })
    }
}

#[derive(Debug, Copy, Clone)]
struct Candidate {
    center: GeoPoint,
    scale: f64,
    error: f64,
}

struct Objective<'a> {
    pairs: &'a [MatchedPair],
    base: &'a OverlayPlacement,
}

impl Objective<'_> {
    fn predict(&self, image_pos: ImagePoint, center: GeoPoint, scale: f64) -> GeoPoint {
        project(image_pos, &self.base.with_center(center).with_scale(scale))
    }

    /// Least-squares scale for a fixed center; `None` when undefined.
    fn optimal_scale(&self, center: GeoPoint) -> Option<f64> {
        let mut num = 0.0;
        let mut den = 0.0;
        for pair in self.pairs {
            let unit = haversine_km(center, self.predict(pair.annotated.image_pos, center, 1.0));
            let target = haversine_km(center, pair.reference.geo_pos);
            num += target * unit;
            den += unit * unit;
        }
        if den.is_nan() || den <= 0.0 {
            return None;
        }
        let scale = num / den;
        (scale.is_finite() && scale > 0.0).then_some(scale)
    }

    fn total_error(&self, center: GeoPoint, scale: f64) -> f64 {
        self.pairs
            .iter()
            .map(|pair| {
                let predicted = self.predict(pair.annotated.image_pos, center, scale);
                let d = haversine_km(predicted, pair.reference.geo_pos);
                d * d
            })
            .sum()
    }
}

fn mean_reference(pairs: &[MatchedPair]) -> GeoPoint {
    let n = pairs.len() as f64;
    let (lat, lng) = pairs.iter().fold((0.0, 0.0), |(lat, lng), p| {
        (lat + p.reference.geo_pos.lat, lng + p.reference.geo_pos.lng)
    });
    GeoPoint::new(lat / n, lng / n)
}

/// Sum of squared pixel distances from the annotated points' centroid.
fn image_spread(pairs: &[MatchedPair]) -> f64 {
    let pixel = |p: &MatchedPair| Vec2::new(p.annotated.image_pos.x, p.annotated.image_pos.y);
    let sum = pairs.iter().map(pixel).fold(Vec2::default(), |acc, v| acc + v);
    let centroid = sum * (1.0 / pairs.len() as f64);
    pairs
        .iter()
        .map(|p| (pixel(p) - centroid).length_squared())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::{Optimizer, OptimizerConfig};
    use crate::error::OptimizerError;
    use crate::matcher::{AnnotatedPoint, MatchedPair, ReferencePoint};
    use crate::placement::{ImageInfo, OverlayPlacement};
    use crate::transform::GeoTransform;
    use foundation::{GeoPoint, ImagePoint};
    use runtime::CancellationToken;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn placement(center: GeoPoint, scale: f64) -> OverlayPlacement {
        OverlayPlacement::new(&ImageInfo::new(1000, 500), center, scale, 0.5, 15).unwrap()
    }

    fn pair(id: &str, x: f64, y: f64, geo: GeoPoint) -> MatchedPair {
        MatchedPair {
            annotated: AnnotatedPoint::new(id, x, y),
            reference: ReferencePoint::new(id, geo.lat, geo.lng),
        }
    }

    /// Pairs whose references are exactly where `truth` puts the pixels.
    fn synthetic(truth: &OverlayPlacement, pixels: &[(f64, f64)]) -> Vec<MatchedPair> {
        pixels
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let geo = GeoTransform::image_to_geo(ImagePoint::new(x, y), truth).unwrap();
                pair(&i.to_string(), x, y, geo)
            })
            .collect()
    }

    #[test]
    fn fewer_than_two_pairs_is_rejected() {
        let base = placement(GeoPoint::new(34.85, 135.47), 0.3);
        let one = vec![pair("A", 1.0, 1.0, GeoPoint::new(34.85, 135.47))];
        assert_eq!(
            Optimizer::default().solve(&one, &base),
            Err(OptimizerError::InsufficientMatches { found: 1 })
        );
        assert_eq!(
            Optimizer::default().solve(&[], &base),
            Err(OptimizerError::InsufficientMatches { found: 0 })
        );
    }

    #[test]
    fn identical_image_points_fail() {
        let base = placement(GeoPoint::new(34.85, 135.47), 0.3);
        let pairs = vec![
            pair("A", 200.0, 100.0, GeoPoint::new(34.850, 135.470)),
            pair("B", 200.0, 100.0, GeoPoint::new(34.852, 135.473)),
        ];
        assert!(matches!(
            Optimizer::default().solve(&pairs, &base),
            Err(OptimizerError::OptimizationFailed { .. })
        ));
    }

    #[test]
    fn recovers_symmetric_ground_truth() {
        let truth = placement(GeoPoint::new(34.8537, 135.4720), 0.5);
        let pairs = synthetic(
            &truth,
            &[(100.0, 50.0), (900.0, 50.0), (100.0, 450.0), (900.0, 450.0)],
        );
        let base = placement(GeoPoint::new(34.80, 135.40), 0.3);
        let result = Optimizer::default().solve(&pairs, &base).unwrap();

        assert_close(result.center.lat, 34.8537, 1e-6);
        assert_close(result.center.lng, 135.4720, 1e-6);
        assert_close(result.scale, 0.5, 1e-3);
        assert!(result.rms_error_m() < 1.0, "rms {}", result.rms_error_m());
        assert_eq!(result.evaluations, 50 * 9);
    }

    #[test]
    fn never_worse_than_initial_guess() {
        let truth = placement(GeoPoint::new(35.0116, 135.7681), 0.42);
        let mut pairs = synthetic(
            &truth,
            &[(10.0, 20.0), (640.0, 80.0), (300.0, 410.0), (950.0, 470.0)],
        );
        // Noise on one reference.
        pairs[2].reference.geo_pos.lat += 0.0003;
        let base = placement(GeoPoint::new(35.0, 135.7), 0.3);
        let result = Optimizer::default().solve(&pairs, &base).unwrap();
        assert!(result.total_error <= result.initial_error);
        assert!(result.scale > 0.0);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let truth = placement(GeoPoint::new(34.8537, 135.4720), 0.7);
        let pairs = synthetic(&truth, &[(0.0, 0.0), (500.0, 120.0), (880.0, 499.0)]);
        let base = placement(GeoPoint::new(34.85, 135.47), 0.3);
        let a = Optimizer::default().solve(&pairs, &base).unwrap();
        let b = Optimizer::default().solve(&pairs, &base).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cancelled_before_first_iteration() {
        let truth = placement(GeoPoint::new(34.8537, 135.4720), 0.5);
        let pairs = synthetic(&truth, &[(0.0, 0.0), (1000.0, 500.0)]);
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            Optimizer::default().solve_with_cancel(&pairs, &truth, &token),
            Err(OptimizerError::Cancelled)
        );
    }

    #[test]
    fn pair_cap_limits_work() {
        let truth = placement(GeoPoint::new(34.8537, 135.4720), 0.5);
        let pixels: Vec<(f64, f64)> = (0..10).map(|i| (i as f64 * 100.0, 250.0)).collect();
        let pairs = synthetic(&truth, &pixels);
        let optimizer = Optimizer::new(OptimizerConfig {
            max_pairs: 3,
            ..OptimizerConfig::default()
        });
        let result = optimizer.solve(&pairs, &truth).unwrap();
        assert_eq!(result.pairs_used, 3);
    }

    #[test]
    fn zero_sized_image_is_reported() {
        let mut base = placement(GeoPoint::new(34.85, 135.47), 0.3);
        base.image_width = 0;
        let pairs = vec![
            pair("A", 0.0, 0.0, GeoPoint::new(34.850, 135.470)),
            pair("B", 1.0, 1.0, GeoPoint::new(34.852, 135.473)),
        ];
        assert_eq!(
            Optimizer::default().solve(&pairs, &base),
            Err(OptimizerError::InvalidImage {
                width: 0,
                height: 500
            })
        );
    }
}
