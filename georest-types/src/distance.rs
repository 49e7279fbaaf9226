//! Approximate conversion of distances in meters into decimal degrees.

use std::f64::consts::PI;

/// Equatorial earth radius used by the conversion, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_160.0;

/// Converts `meters` into decimal degrees near the given latitude.
///
/// A degree of latitude is roughly constant in length while a degree of longitude shrinks with
/// `cos(latitude)`. The result averages the two, so at high latitudes it is too short north-south
/// and too long east-west.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat = latitude.abs();
    let latitude_correction = 0.5 * (1.0 + (lat * PI / 180.0).cos());
    meters / (EARTH_RADIUS_METERS * latitude_correction) * (180.0 / PI)
}
