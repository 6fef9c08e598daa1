//! WGS84 ellipsoid: geodetic <-> ECEF conversion and the local NWU frame.

use super::{Mat3, Quat, Vec3};

/// WGS84 semi-major axis, metres.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared, `f * (2 - f)`.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Convert geodetic `(lat, lon)` in radians and altitude above the
/// ellipsoid in metres to ECEF metres.
pub fn geodetic_to_ecef(lat: f64, lon: f64, alt: f64) -> Vec3 {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Vec3::new(
        (n + alt) * cos_lat * cos_lon,
        (n + alt) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + alt) * sin_lat,
    )
}

/// Convert ECEF metres back to geodetic `(lat, lon)` radians and altitude
/// above the ellipsoid in metres. Closed-form iteration, a handful of steps
/// is enough to converge for any altitude relevant to a flight recording.
pub fn ecef_to_geodetic(p: Vec3) -> (f64, f64, f64) {
    let lon = p.y.atan2(p.x);
    let p_xy = (p.x * p.x + p.y * p.y).sqrt();

    let mut lat = (p.z / (p_xy * (1.0 - WGS84_E2))).atan();
    let mut alt = 0.0;
    for _ in 0..8 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        alt = p_xy / lat.cos() - n;
        lat = (p.z / (p_xy * (1.0 - WGS84_E2 * n / (n + alt)))).atan();
    }
    (lat, lon, alt)
}

/// Outward-pointing unit normal to the ellipsoid surface at ECEF point `p`.
pub fn surface_normal(p: Vec3) -> Vec3 {
    let (lat, lon, _alt) = ecef_to_geodetic(p);
    local_up(lat, lon)
}

/// Ellipsoid-normal "up" direction at geodetic `(lat, lon)`, in ECEF.
pub fn local_up(lat: f64, lon: f64) -> Vec3 {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Vec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

/// The NWU (north, west, up) basis at geodetic `(lat, lon)`, expressed as
/// columns of a rotation matrix that carries local NWU coordinates into
/// ECEF — the "fixed-frame-at-position" rotation orientation synthesis and
/// the trajectory builder compose attitude against.
pub fn local_frame_nwu(lat: f64, lon: f64) -> Mat3 {
    let up = local_up(lat, lon);
    let (sin_lon, cos_lon) = lon.sin_cos();
    let east = Vec3::new(-sin_lon, cos_lon, 0.0);
    let north = up.cross(east).normalized();
    let west = -east;
    Mat3::from_cols(north, west, up)
}

/// Heading/pitch/roll (radians, local NWU frame) to a world-frame unit
/// quaternion: `R_z(-heading) . R_y(-pitch) . R_x(roll)` composed with the
/// fixed-frame-at-position rotation.
pub fn hpr_to_world_quat(lat: f64, lon: f64, heading: f64, pitch: f64, roll: f64) -> Quat {
    let body_to_nwu = Mat3::rotation_z(-heading)
        .mul_mat(Mat3::rotation_y(-pitch))
        .mul_mat(Mat3::rotation_x(roll));
    let world = local_frame_nwu(lat, lon).mul_mat(body_to_nwu);
    Quat::from_matrix(world)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geodetic_roundtrip_equator() {
        let p = geodetic_to_ecef(0.0, 0.0, 0.0);
        assert!((p.x - WGS84_A).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);

        let (lat, lon, alt) = ecef_to_geodetic(p);
        assert!(lat.abs() < 1e-9);
        assert!(lon.abs() < 1e-9);
        assert!(alt.abs() < 1e-6);
    }

    #[test]
    fn test_geodetic_roundtrip_general_point() {
        let lat = 45f64.to_radians();
        let lon = 10f64.to_radians();
        let alt = 1234.5;
        let p = geodetic_to_ecef(lat, lon, alt);
        let (lat2, lon2, alt2) = ecef_to_geodetic(p);
        assert!((lat - lat2).abs() < 1e-9);
        assert!((lon - lon2).abs() < 1e-9);
        assert!((alt - alt2).abs() < 1e-4);
    }

    #[test]
    fn test_local_frame_orthonormal() {
        let m = local_frame_nwu(45f64.to_radians(), 10f64.to_radians());
        for i in 0..3 {
            for j in 0..3 {
                let d = m.col(i).dot(m.col(j));
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((d - expected).abs() < 1e-9, "col{i}.col{j} = {d}");
            }
        }
    }

    #[test]
    fn test_up_matches_surface_normal() {
        let lat = 12f64.to_radians();
        let lon = -34f64.to_radians();
        let p = geodetic_to_ecef(lat, lon, 500.0);
        let n = surface_normal(p);
        let up = local_up(lat, lon);
        assert!(n.approx_eq(up, 1e-6));
    }

    #[test]
    fn test_hpr_zero_matches_local_frame() {
        let lat = 30f64.to_radians();
        let lon = 60f64.to_radians();
        let q = hpr_to_world_quat(lat, lon, 0.0, 0.0, 0.0);
        let expected = Quat::from_matrix(local_frame_nwu(lat, lon));
        assert!(q.approx_eq(expected, 1e-9));
    }

    #[test]
    fn test_hpr_heading_points_north() {
        let lat = 0.0;
        let lon = 0.0;
        let q = hpr_to_world_quat(lat, lon, 0.0, 0.0, 0.0);
        let forward = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        let north = local_frame_nwu(lat, lon).col(0);
        assert!(forward.approx_eq(north, 1e-9));
    }
}
