//! Unit quaternion, `(x, y, z, w)` convention.

use super::{Mat3, Vec3};
use std::ops::Mul;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    #[inline]
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Quat { x, y, z, w }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn normalized(&self) -> Quat {
        let n = self.norm();
        Quat::new(self.x / n, self.y / n, self.z / n, self.w / n)
    }

    /// Rotation of `angle` radians about unit axis `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Quat {
        let half = angle / 2.0;
        let (s, c) = half.sin_cos();
        Quat::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Build the quaternion representing the rotation matrix `m` (columns an
    /// orthonormal basis). Shepherd's method, numerically stable across the
    /// four quadrants of trace sign.
    pub fn from_matrix(m: Mat3) -> Quat {
        let (m00, m10, m20) = (m.cols[0].x, m.cols[0].y, m.cols[0].z);
        let (m01, m11, m21) = (m.cols[1].x, m.cols[1].y, m.cols[1].z);
        let (m02, m12, m22) = (m.cols[2].x, m.cols[2].y, m.cols[2].z);

        let trace = m00 + m11 + m22;
        if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Quat::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, s / 4.0)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Quat::new(s / 4.0, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Quat::new((m01 + m10) / s, s / 4.0, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Quat::new((m02 + m20) / s, (m12 + m21) / s, s / 4.0, (m10 - m01) / s)
        }
    }

    /// Rotate a vector by this unit quaternion.
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let uv = u.cross(v);
        let uuv = u.cross(uv);
        v + uv * (2.0 * self.w) + uuv * 2.0
    }

    /// Componentwise equality within `eps`, used by the trajectory sample
    /// dedup check.
    pub fn approx_eq(&self, rhs: Quat, eps: f64) -> bool {
        (self.x - rhs.x).abs() < eps
            && (self.y - rhs.y).abs() < eps
            && (self.z - rhs.z).abs() < eps
            && (self.w - rhs.w).abs() < eps
    }
}

/// Quaternion composition: `self * rhs` applies `rhs` first, then `self`.
impl Mul for Quat {
    type Output = Quat;
    fn mul(self, rhs: Quat) -> Quat {
        Quat::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_roundtrip_matrix() {
        let q = Quat::from_matrix(Mat3::IDENTITY);
        assert!(q.approx_eq(Quat::IDENTITY, 1e-9));
    }

    #[test]
    fn test_axis_angle_quarter_turn_about_z() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let m = Mat3::rotation_z(FRAC_PI_2);
        let q2 = Quat::from_matrix(m);
        assert!(q.approx_eq(q2, 1e-9) || q.approx_eq(Quat::new(-q2.x, -q2.y, -q2.z, -q2.w), 1e-9));
    }

    #[test]
    fn test_composition_identity() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 0.3);
        let r = q * Quat::IDENTITY;
        assert!(r.approx_eq(q, 1e-12));
    }

    #[test]
    fn test_rotate_matches_matrix() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let v = Quat::rotate(&q, Vec3::new(1.0, 0.0, 0.0));
        let expected = Mat3::rotation_z(FRAC_PI_2).mul_vec(Vec3::new(1.0, 0.0, 0.0));
        assert!(v.approx_eq(expected, 1e-9));
    }
}
