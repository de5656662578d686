use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::math::{lat_deg_to_meters, lng_deg_to_meters};

/// Corners of an overlay, indexed clockwise from the north-west.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    NorthWest = 0,
    NorthEast = 1,
    SouthEast = 2,
    SouthWest = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthEast,
        Corner::SouthWest,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    pub fn is_north(self) -> bool {
        matches!(self, Corner::NorthWest | Corner::NorthEast)
    }

    pub fn is_east(self) -> bool {
        matches!(self, Corner::NorthEast | Corner::SouthEast)
    }
}

/// Axis-aligned lat/lng rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Bounds spanning two opposite corners given in any order.
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        Self::new(
            a.lat.min(b.lat),
            a.lng.min(b.lng),
            a.lat.max(b.lat),
            a.lng.max(b.lng),
        )
    }

    /// Finite, non-empty and within the valid coordinate range.
    pub fn is_valid(&self) -> bool {
        let finite = [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.north > self.south
            && self.east > self.west
            && self.south >= -90.0
            && self.north <= 90.0
            && self.west >= -180.0
            && self.east <= 180.0
    }

    pub fn corner(&self, corner: Corner) -> GeoPoint {
        match corner {
            Corner::NorthWest => GeoPoint::new(self.north, self.west),
            Corner::NorthEast => GeoPoint::new(self.north, self.east),
            Corner::SouthEast => GeoPoint::new(self.south, self.east),
            Corner::SouthWest => GeoPoint::new(self.south, self.west),
        }
    }

    /// Corners in NW, NE, SE, SW order.
    pub fn corners(&self) -> [GeoPoint; 4] {
        Corner::ALL.map(|c| self.corner(c))
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn height_meters(&self) -> f64 {
        lat_deg_to_meters(self.north - self.south)
    }

    /// East-west extent measured along the parallel through the center.
    pub fn width_meters(&self) -> f64 {
        lng_deg_to_meters(self.east - self.west, self.center().lat)
    }
}

#[cfg(test)]
mod tests {
    use super::{Corner, GeoBounds};
    use crate::geo::GeoPoint;
    use pretty_assertions::assert_eq;

    #[test]
    fn opposite_corners() {
        assert_eq!(Corner::NorthWest.opposite(), Corner::SouthEast);
        assert_eq!(Corner::NorthEast.opposite(), Corner::SouthWest);
        assert_eq!(Corner::SouthEast.opposite(), Corner::NorthWest);
        assert_eq!(Corner::SouthWest.opposite(), Corner::NorthEast);
        assert_eq!(Corner::from_index(2), Some(Corner::SouthEast));
        assert_eq!(Corner::from_index(4), None);
    }

    #[test]
    fn from_corners_normalizes_order() {
        let b = GeoBounds::from_corners(GeoPoint::new(35.0, 136.0), GeoPoint::new(34.0, 135.0));
        assert_eq!(b, GeoBounds::new(34.0, 135.0, 35.0, 136.0));
        assert_eq!(b.corner(Corner::NorthEast), GeoPoint::new(35.0, 136.0));
        assert_eq!(b.center(), GeoPoint::new(34.5, 135.5));
    }

    #[test]
    fn degenerate_bounds_are_invalid() {
        assert!(GeoBounds::new(34.0, 135.0, 35.0, 136.0).is_valid());
        assert!(!GeoBounds::new(34.0, 135.0, 34.0, 136.0).is_valid());
        assert!(!GeoBounds::new(34.0, 135.0, 35.0, f64::NAN).is_valid());
    }

    #[test]
    fn bounds_past_the_antimeridian_are_invalid() {
        assert!(GeoBounds::new(10.0, 179.0, 11.0, 180.0).is_valid());
        assert!(!GeoBounds::new(10.0, 179.99, 10.01, 180.004).is_valid());
        assert!(!GeoBounds::new(10.0, -180.5, 10.01, -179.9).is_valid());
    }

    #[test]
    fn width_shrinks_away_from_equator() {
        let eq = GeoBounds::new(-0.5, 0.0, 0.5, 1.0);
        let north = GeoBounds::new(59.5, 0.0, 60.5, 1.0);
        assert!((north.width_meters() / eq.width_meters() - 0.5).abs() < 1e-3);
        assert!((north.height_meters() - eq.height_meters()).abs() < 1e-6);
    }
}
