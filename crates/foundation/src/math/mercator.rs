//! Web-Mercator screen constants.

/// Ground meters covered by one pixel at the equator at zoom 0.
pub const EQUATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

/// Deepest slippy-map zoom level.
pub const MAX_ZOOM: u32 = 30;

/// Local ground distance of one screen pixel at `lat_deg` and `zoom`.
pub fn meters_per_pixel(lat_deg: f64, zoom: u32) -> f64 {
    EQUATOR_METERS_PER_PIXEL * lat_deg.to_radians().cos() / 2f64.powi(zoom as i32)
}

/// Slippy-map tile column containing `lng_deg`.
pub fn tile_x(lng_deg: f64, zoom: u32) -> u32 {
    let n = 2f64.powi(zoom as i32);
    ((lng_deg + 180.0) / 360.0 * n).floor().clamp(0.0, n - 1.0) as u32
}

/// Slippy-map tile row containing `lat_deg`.
pub fn tile_y(lat_deg: f64, zoom: u32) -> u32 {
    let n = 2f64.powi(zoom as i32);
    let lat_rad = lat_deg.to_radians();
    let y = (1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n;
    y.floor().clamp(0.0, n - 1.0) as u32
}
