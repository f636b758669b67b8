//! `pathsense-geo` – great-circle geometry for the cane.
//!
//! Pure, deterministic functions on WGS-84-ish coordinates treated as
//! points on a sphere of radius 6 371 000 m.  Everything the mapping and
//! guidance layers need reduces to two primitives:
//!
//! - [`distance_m`] – haversine great-circle distance, and
//! - [`bearing_deg`] – initial bearing along the great-circle path.
//!
//! The haversine intermediate is clamped to `[0, 1]` before the inverse
//! trig step so near-zero and near-antipodal deltas never produce NaN.
//!
//! # Example
//!
//! ```rust
//! use pathsense_geo::{distance_m, bearing_deg};
//!
//! // One degree of longitude at the equator is ~111.2 km.
//! let d = distance_m(0.0, 0.0, 0.0, 1.0);
//! assert!((d - 111_195.0).abs() < 50.0);
//!
//! // Due east.
//! assert!((bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-6);
//! ```

/// Mean Earth radius in metres (spherical model).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ────────────────────────────────────────────────────────────────────────────
// Distance and bearing
// ────────────────────────────────────────────────────────────────────────────

/// Great-circle distance in metres between two coordinate pairs
/// (haversine formula).
pub fn distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Floating-point rounding can push `a` a hair outside [0, 1] for
    // near-zero and near-antipodal separations.
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial bearing in degrees `[0, 360)` along the great-circle path from
/// point 1 toward point 2.
pub fn bearing_deg(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0).rem_euclid(360.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Angle helpers for guidance
// ────────────────────────────────────────────────────────────────────────────

/// Normalise a relative angle into `(-180, 180]` degrees.
///
/// Used to express "destination bearing minus current heading" as a
/// left/right steering offset.
pub fn normalize_relative_deg(deg: f64) -> f64 {
    let mut d = deg.rem_euclid(360.0);
    if d > 180.0 {
        d -= 360.0;
    }
    d
}

/// Eight-wind compass name for an absolute bearing.
pub fn compass_point(bearing_deg: f64) -> &'static str {
    const WINDS: [&str; 8] = [
        "North",
        "Northeast",
        "East",
        "Southeast",
        "South",
        "Southwest",
        "West",
        "Northwest",
    ];
    let idx = ((bearing_deg.rem_euclid(360.0) / 45.0).round() as usize) % 8;
    WINDS[idx]
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── distance_m ───────────────────────────────────────────────────────────

    #[test]
    fn one_degree_longitude_at_equator() {
        let d = distance_m(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(distance_m(52.52, 13.405, 52.52, 13.405), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_m(48.8566, 2.3522, 51.5074, -0.1278);
        let ba = distance_m(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((ab - ba).abs() < 1e-6);
        // Paris–London is roughly 344 km.
        assert!((ab - 344_000.0).abs() < 2_000.0, "got {ab}");
    }

    #[test]
    fn near_antipodal_stays_finite() {
        // Almost exactly half the circumference: π * R ≈ 20 015 km.
        let d = distance_m(0.0, 0.0, 0.0, 179.999_999);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 100.0);
    }

    #[test]
    fn tiny_separation_stays_finite_and_positive() {
        let d = distance_m(45.0, 45.0, 45.0, 45.000_000_01);
        assert!(d.is_finite());
        assert!(d >= 0.0);
        assert!(d < 0.01);
    }

    // ── bearing_deg ──────────────────────────────────────────────────────────

    #[test]
    fn cardinal_bearings() {
        assert!((bearing_deg(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-6); // north
        assert!((bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-6); // east
        assert!((bearing_deg(1.0, 0.0, 0.0, 0.0) - 180.0).abs() < 1e-6); // south
        assert!((bearing_deg(0.0, 1.0, 0.0, 0.0) - 270.0).abs() < 1e-6); // west
    }

    #[test]
    fn bearing_always_in_range() {
        let cases = [
            (10.0, 10.0, -45.0, -120.0),
            (-80.0, 170.0, 80.0, -170.0),
            (0.0, 0.0, 0.0, -0.000001),
        ];
        for (a, b, c, d) in cases {
            let bearing = bearing_deg(a, b, c, d);
            assert!((0.0..360.0).contains(&bearing), "got {bearing}");
        }
    }

    // ── normalize_relative_deg ───────────────────────────────────────────────

    #[test]
    fn relative_angle_wraps_into_half_open_interval() {
        assert_eq!(normalize_relative_deg(0.0), 0.0);
        assert_eq!(normalize_relative_deg(180.0), 180.0);
        assert_eq!(normalize_relative_deg(181.0), -179.0);
        assert_eq!(normalize_relative_deg(-181.0), 179.0);
        assert_eq!(normalize_relative_deg(540.0), 180.0);
        assert_eq!(normalize_relative_deg(-90.0), -90.0);
    }

    // ── compass_point ────────────────────────────────────────────────────────

    #[test]
    fn compass_names_for_wind_centres() {
        assert_eq!(compass_point(0.0), "North");
        assert_eq!(compass_point(45.0), "Northeast");
        assert_eq!(compass_point(90.0), "East");
        assert_eq!(compass_point(225.0), "Southwest");
        assert_eq!(compass_point(315.0), "Northwest");
    }

    #[test]
    fn compass_rounds_to_nearest_wind() {
        assert_eq!(compass_point(22.0), "North");
        assert_eq!(compass_point(23.0), "Northeast");
        assert_eq!(compass_point(359.0), "North");
    }
}
