//! ACMI (TacView text format) flight-recording decoder and trajectory
//! builder.
//!
//! [`parse`] turns a possibly-ZIP-wrapped byte stream into a structured
//! [`model::AcmiData`]: header, global properties, the per-entity property
//! table, and the chronological frame list. From there,
//! [`model::AcmiData::create_sampled_trajectories`] (see [`trajectory`])
//! derives time-sampled ECEF trajectories, synthesizing orientation from
//! position derivatives when the source lacks it.

mod decoder;
mod facade;
pub mod model;
mod orientation;
mod scanner;
pub mod trajectory;

pub mod container;

pub use facade::{parse, ParseOptions};
pub use model::*;
pub use trajectory::*;
