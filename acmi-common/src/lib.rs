//! Ambient stack and geodesy primitives shared by the ACMI decoder and
//! trajectory builder: error kinds, absolute time, cancellation, logging,
//! 3-vector/matrix/quaternion math, the WGS84 ellipsoid, and the geoid grid.

mod cancel;
mod error;
mod geoid;
mod logging;
pub mod math;
mod time;

pub use cancel::*;
pub use error::*;
pub use geoid::*;
pub use logging::*;
pub use time::*;
