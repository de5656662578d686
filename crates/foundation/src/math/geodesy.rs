use crate::geo::GeoPoint;

/// WGS84 semi-major axis (meters). Used as the sphere radius when turning
/// meter offsets into degree offsets.
pub const WGS84_A: f64 = 6_378_137.0;

/// Mean Earth radius (kilometers) used for haversine distances.
pub const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers on a sphere of `MEAN_EARTH_RADIUS_KM`.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + a.lat.to_radians().cos()
            * b.lat.to_radians().cos()
            * (d_lng / 2.0).sin()
            * (d_lng / 2.0).sin();
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    MEAN_EARTH_RADIUS_KM * c
}

/// Northward meters to a latitude delta in degrees.
#[inline]
pub fn meters_to_lat_deg(north_m: f64) -> f64 {
    (north_m / WGS84_A).to_degrees()
}

/// Eastward meters at `lat_deg` to a longitude delta in degrees.
#[inline]
pub fn meters_to_lng_deg(east_m: f64, lat_deg: f64) -> f64 {
    (east_m / (WGS84_A * lat_deg.to_radians().cos())).to_degrees()
}

#[inline]
pub fn lat_deg_to_meters(d_lat: f64) -> f64 {
    d_lat.to_radians() * WGS84_A
}

/// Length in meters of a longitude delta measured along the parallel at `lat_deg`.
#[inline]
pub fn lng_deg_to_meters(d_lng: f64, lat_deg: f64) -> f64 {
    d_lng.to_radians() * WGS84_A * lat_deg.to_radians().cos()
}
