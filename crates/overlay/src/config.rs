use std::env;

use foundation::GeoPoint;

/// Scale used until the user enters a valid one.
pub const DEFAULT_SCALE: f64 = 0.3;
/// Opacity used when the user input is not a number.
pub const DEFAULT_OPACITY: f64 = 0.5;
pub const DEFAULT_MAP_ZOOM: u32 = 15;
/// Minoh falls, where the base map opens.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 34.853667,
    lng: 135.472041,
};

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub initial_center: GeoPoint,
    pub map_zoom: u32,
    pub default_scale: f64,
    pub default_opacity: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            initial_center: DEFAULT_CENTER,
            map_zoom: DEFAULT_MAP_ZOOM,
            default_scale: DEFAULT_SCALE,
            default_opacity: DEFAULT_OPACITY,
        }
    }
}

impl OverlayConfig {
    /// Defaults overridden by `GEOREF_*` environment variables. Unparsable or
    /// out-of-range values fall back to the default.
    pub fn from_env() -> Self {
        let d = Self::default();
        let center = GeoPoint::try_new(
            env_var_f64("GEOREF_CENTER_LAT", d.initial_center.lat),
            env_var_f64("GEOREF_CENTER_LNG", d.initial_center.lng),
        )
        .unwrap_or(d.initial_center);
        let scale = env_var_f64("GEOREF_SCALE", d.default_scale);
        let opacity = env_var_f64("GEOREF_OPACITY", d.default_opacity);

        Self {
            initial_center: center,
            map_zoom: env_var_u32("GEOREF_ZOOM", d.map_zoom),
            default_scale: if scale.is_finite() && scale > 0.0 {
                scale
            } else {
                d.default_scale
            },
            default_opacity: if (0.0..=1.0).contains(&opacity) {
                opacity
            } else {
                d.default_opacity
            },
        }
    }
}

fn env_var_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
