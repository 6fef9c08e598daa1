//! Frame walk → per-entity trajectory samples: geodetic→ECEF conversion,
//! timeline resampling, dedup, and optional orientation synthesis.

use std::collections::HashMap;

use acmi_common::math::{ellipsoid, Quat, Vec3};
use acmi_common::Instant;

use crate::model::{AcmiData, Frame};
use crate::orientation;

/// Dedup position tolerance, metres.
const EPS_POS: f64 = 1e-6;
/// Dedup orientation tolerance, componentwise.
const EPS_QUAT: f64 = 1e-6;

/// Position, and orientation when the source (or the synthesizer) supplied one.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateVector {
    pub position_ecef: Vec3,
    pub orientation: Option<Quat>,
}

/// One time-stamped sample of an entity's derived state.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrajectorySample {
    pub time: Instant,
    pub state: StateVector,
}

/// Strictly time-increasing sequence of samples for one entity.
pub type Trajectory = Vec<TrajectorySample>;

/// Options accepted by [`AcmiData::create_sampled_trajectories`].
#[derive(Clone, Copy, Debug)]
pub struct TrajectoryOptions {
    /// Resampling interval, seconds.
    pub sample_rate: f64,
    /// Synthesize heading/pitch/roll from position derivatives for entities
    /// whose source transforms never carried a `yaw`.
    pub emulate_orientation: bool,
}

impl Default for TrajectoryOptions {
    fn default() -> Self {
        TrajectoryOptions { sample_rate: 1.0, emulate_orientation: false }
    }
}

impl AcmiData {
    /// Builds a time-sampled trajectory per entity. Returns an empty map for
    /// an invalid time span or an empty frame list rather than erroring — the
    /// trajectory builder never fails.
    pub fn create_sampled_trajectories(&self, options: TrajectoryOptions) -> HashMap<u64, Trajectory> {
        let mut out: HashMap<u64, Trajectory> = HashMap::new();

        if !self.time_span.is_valid() || self.frames.is_empty() {
            return out;
        }
        let start = self.time_span.start.expect("validated above");
        let duration = self.time_span.duration();

        let mut time_stamp = 0.0f64;
        let mut reached_end = false;
        while time_stamp <= duration + 1e-9 {
            let time = start + seconds_to_duration(time_stamp);
            self.emit_at(time, &mut out, false);
            if (time_stamp - duration).abs() < 1e-9 {
                reached_end = true;
            }
            time_stamp += options.sample_rate;
        }
        if !reached_end {
            let end_time = start + seconds_to_duration(duration);
            self.emit_at(end_time, &mut out, true);
        }

        if options.emulate_orientation {
            for trajectory in out.values_mut() {
                let lacks_orientation = trajectory.first().map(|s| s.state.orientation.is_none()).unwrap_or(false);
                if lacks_orientation {
                    orientation::synthesize(trajectory, true);
                }
            }
        }

        out
    }

    /// Largest-timestamp-not-after `time` frame lookup via binary search.
    /// Valid only inside `[referenceTime, referenceTime + end]`; undefined
    /// (returns `None`) outside that span.
    fn get_frame(&self, time: Instant) -> Option<&Frame> {
        let reference_time = self.global.reference_time?;
        let elapsed = (time - reference_time).num_milliseconds() as f64 / 1000.0;
        let idx = self.frames.partition_point(|f| f.time_stamp <= elapsed);
        if idx == 0 {
            None
        } else {
            Some(&self.frames[idx - 1])
        }
    }

    fn emit_at(&self, time: Instant, out: &mut HashMap<u64, Trajectory>, last_frame: bool) {
        let Some(frame) = self.get_frame(time) else { return };

        for (id, transform) in frame.scene.iter() {
            let lat_rad = transform.latitude.to_radians();
            let lon_rad = transform.longitude.to_radians();
            let position_ecef = ellipsoid::geodetic_to_ecef(lat_rad, lon_rad, transform.altitude);

            let orientation = transform.yaw.map(|yaw| {
                let pitch = transform.pitch.unwrap_or(0.0);
                let roll = transform.roll.unwrap_or(0.0);
                ellipsoid::hpr_to_world_quat(lat_rad, lon_rad, yaw, pitch, roll)
            });

            let state = StateVector { position_ecef, orientation };
            let trajectory = out.entry(id).or_default();

            if !last_frame {
                if let Some(previous) = trajectory.last() {
                    let position_close = previous.state.position_ecef.approx_eq(position_ecef, EPS_POS);
                    let orientation_equal = match (previous.state.orientation, orientation) {
                        (Some(a), Some(b)) => a.approx_eq(b, EPS_QUAT),
                        (None, None) => true,
                        _ => false,
                    };
                    if position_close && orientation_equal {
                        continue;
                    }
                }
            }

            trajectory.push(TrajectorySample { time, state });
        }
    }
}

fn seconds_to_duration(t: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((t * 1000.0).round() as i64)
}
