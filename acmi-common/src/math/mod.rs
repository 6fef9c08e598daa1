//! Math primitives: 3-vectors, 3×3 matrices, quaternions, and the WGS84
//! ellipsoid. Hand-rolled rather than pulled from `nalgebra`/`glam` since
//! this is the core transform logic the rest of the crate builds on (see
//! DESIGN.md).

pub mod ellipsoid;
pub mod mat3;
pub mod quat;
pub mod vec3;

pub use ellipsoid::*;
pub use mat3::*;
pub use quat::*;
pub use vec3::*;
