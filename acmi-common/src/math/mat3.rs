//! 3×3 matrix, column-major, used to build rotations from orthonormal bases.

use super::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3 {
    /// Columns.
    pub cols: [Vec3; 3],
}

impl Mat3 {
    #[inline]
    pub fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Mat3 { cols: [c0, c1, c2] }
    }

    pub const IDENTITY: Mat3 = Mat3 {
        cols: [
            Vec3 { x: 1.0, y: 0.0, z: 0.0 },
            Vec3 { x: 0.0, y: 1.0, z: 0.0 },
            Vec3 { x: 0.0, y: 0.0, z: 1.0 },
        ],
    };

    #[inline]
    pub fn col(&self, i: usize) -> Vec3 {
        self.cols[i]
    }

    /// Row `i` as a `Vec3` (rows 0/1/2 only).
    fn row(&self, i: usize) -> Vec3 {
        Vec3::new(
            match i {
                0 => self.cols[0].x,
                1 => self.cols[0].y,
                _ => self.cols[0].z,
            },
            match i {
                0 => self.cols[1].x,
                1 => self.cols[1].y,
                _ => self.cols[1].z,
            },
            match i {
                0 => self.cols[2].x,
                1 => self.cols[2].y,
                _ => self.cols[2].z,
            },
        )
    }

    pub fn mul_vec(&self, v: Vec3) -> Vec3 {
        Vec3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }

    pub fn mul_mat(&self, rhs: Mat3) -> Mat3 {
        Mat3::from_cols(
            self.mul_vec(rhs.cols[0]),
            self.mul_vec(rhs.cols[1]),
            self.mul_vec(rhs.cols[2]),
        )
    }

    /// Transpose; for an orthonormal rotation matrix this is also its inverse.
    pub fn transpose(&self) -> Mat3 {
        Mat3::from_cols(self.row(0), self.row(1), self.row(2))
    }

    /// Elementary rotation about the local Z axis, angle in radians.
    pub fn rotation_z(angle: f64) -> Mat3 {
        let (s, c) = angle.sin_cos();
        Mat3::from_cols(
            Vec3::new(c, s, 0.0),
            Vec3::new(-s, c, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        )
    }

    /// Elementary rotation about the local Y axis, angle in radians.
    pub fn rotation_y(angle: f64) -> Mat3 {
        let (s, c) = angle.sin_cos();
        Mat3::from_cols(
            Vec3::new(c, 0.0, -s),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(s, 0.0, c),
        )
    }

    /// Elementary rotation about the local X axis, angle in radians.
    pub fn rotation_x(angle: f64) -> Mat3 {
        let (s, c) = angle.sin_cos();
        Mat3::from_cols(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, c, s),
            Vec3::new(0.0, -s, c),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_z_quarter_turn() {
        let r = Mat3::rotation_z(FRAC_PI_2);
        let v = r.mul_vec(Vec3::new(1.0, 0.0, 0.0));
        assert!(v.approx_eq(Vec3::new(0.0, 1.0, 0.0), 1e-9));
    }

    #[test]
    fn test_identity_mul() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v, Mat3::IDENTITY.mul_vec(v));
    }
}
