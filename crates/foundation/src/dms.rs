//! Degree/minute/second formatting for point information display.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Format decimal degrees as `34°51'13.20"N`.
pub fn to_dms(decimal: f64, axis: Axis) -> String {
    // Round in hundredths of a second, then split.
    let centiseconds = (decimal.abs() * 360_000.0).round() as u64;
    let degrees = centiseconds / 360_000;
    let minutes = centiseconds % 360_000 / 6_000;
    let seconds = (centiseconds % 6_000) as f64 / 100.0;
    let direction = match (axis, decimal >= 0.0) {
        (Axis::Latitude, true) => 'N',
        (Axis::Latitude, false) => 'S',
        (Axis::Longitude, true) => 'E',
        (Axis::Longitude, false) => 'W',
    };
    format!(
        "{}°{:02}'{:05.2}\"{}",
        degrees, minutes, seconds, direction
    )
}

/// Parse the `to_dms` format back to signed decimal degrees.
pub fn parse_dms(s: &str) -> Option<f64> {
    let s = s.trim();
    let (deg, rest) = s.split_once('°')?;
    let (min, rest) = rest.split_once('\'')?;
    let (sec, dir) = rest.split_once('"')?;

    let all_digits = |v: &str| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit());
    if !all_digits(deg) || !all_digits(min) {
        return None;
    }
    if sec.is_empty() || !sec.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let value = deg.parse::<f64>().ok()?
        + min.parse::<f64>().ok()? / 60.0
        + sec.parse::<f64>().ok()? / 3600.0;

    match dir {
        "N" | "E" => Some(value),
        "S" | "W" => Some(-value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, parse_dms, to_dms};

    #[test]
    fn formats_with_padding_and_direction() {
        assert_eq!(to_dms(34.5, Axis::Latitude), "34°30'00.00\"N");
        assert_eq!(to_dms(-0.0125, Axis::Longitude), "0°00'45.00\"W");
    }

    #[test]
    fn seconds_carry_into_minutes_and_degrees() {
        assert_eq!(to_dms(34.9999999, Axis::Latitude), "35°00'00.00\"N");
        assert_eq!(to_dms(34.4999999, Axis::Latitude), "34°30'00.00\"N");
        assert_eq!(to_dms(-135.0166666, Axis::Longitude), "135°01'00.00\"W");
    }

    #[test]
    fn parses_signed_values() {
        let v = parse_dms("135°28'19.35\"E").unwrap();
        assert!((v - (135.0 + 28.0 / 60.0 + 19.35 / 3600.0)).abs() < 1e-12);
        let s = parse_dms("33°52'00.00\"S").unwrap();
        assert!((s + (33.0 + 52.0 / 60.0)).abs() < 1e-12);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(parse_dms("34.5"), None);
        assert_eq!(parse_dms("34°30'00.00\"Q"), None);
        assert_eq!(parse_dms("-34°30'00.00\"N"), None);
    }

    #[test]
    fn format_parse_round_trip() {
        let s = to_dms(34.853667, Axis::Latitude);
        let back = parse_dms(&s).unwrap();
        assert!((back - 34.853667).abs() < 1e-5);
    }
}
