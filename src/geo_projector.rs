//! Geodetic coordinates to a local, heading-aligned ground plane
//!
//! `meters_offset` is an equirectangular approximation and only holds for
//! separations of a few kilometres. `haversine_distance` is the great-circle
//! distance and is valid everywhere.

use crate::types::{Coordinate, Heading, PlanarPoint, Rot2};

/// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// East/north offset in metres of `target` relative to `reference`.
///
/// East-west distance is scaled by the cosine of the mean latitude of the two
/// points.
pub fn meters_offset(reference: Coordinate, target: Coordinate) -> PlanarPoint {
    let lat1 = reference.latitude.to_radians();
    let lat2 = target.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (target.longitude - reference.longitude).to_radians();

    let x = d_lon * ((lat1 + lat2) / 2.0).cos() * EARTH_RADIUS_M;
    let y = d_lat * EARTH_RADIUS_M;
    PlanarPoint::new(x, y)
}

/// Counter-clockwise rotation of a planar point
pub fn rotate(point: PlanarPoint, angle_degrees: f64) -> PlanarPoint {
    let rotation = Rot2::new(angle_degrees.to_radians());
    PlanarPoint::from_vector(rotation * point.to_vector())
}

/// Great-circle distance in metres
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Clamp guards sqrt(1 - h) against h drifting just above 1.0
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `from` to `to`, degrees in [0, 360)
pub fn initial_bearing(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let x = d_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    x.atan2(y).to_degrees().rem_euclid(360.0)
}

/// Project every target onto the viewer's plane, rotated by `heading`.
///
/// Output order matches input order; an empty slice gives an empty vec.
pub fn project(reference: Coordinate, heading: Heading, targets: &[Coordinate]) -> Vec<PlanarPoint> {
    targets
        .iter()
        .map(|&target| rotate(meters_offset(reference, target), heading.degrees()))
        .collect()
}
