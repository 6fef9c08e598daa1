//! Position-derivative attitude synthesis with a coordinated-turn roll
//! model and exponential smoothing, used when source data lacks
//! orientation.

use acmi_common::math::{ellipsoid, hpr_to_world_quat, Mat3, Quat, Vec3};

use crate::trajectory::TrajectorySample;

const EPS_SPEED: f64 = 1e-6;
const ROLL_SMOOTHING_ALPHA: f64 = 0.05;
const GRAVITY: f64 = 9.806_65;
const ONE_DEGREE: f64 = std::f64::consts::PI / 180.0;

/// Synthesizes an orientation for every sample from position derivatives.
/// Requires at least 3 samples; with fewer, every sample gets the default
/// heading=pitch=roll=0 quaternion for its local frame.
pub fn synthesize(samples: &mut [TrajectorySample], with_roll: bool) {
    let n = samples.len();
    if n < 3 {
        for sample in samples.iter_mut() {
            let (lat, lon, _alt) = ellipsoid::ecef_to_geodetic(sample.state.position_ecef);
            sample.state.orientation = Some(hpr_to_world_quat(lat, lon, 0.0, 0.0, 0.0));
        }
        return;
    }

    let mut last_roll = 0.0f64;
    let mut last_q = Quat::IDENTITY;

    for i in 0..=(n - 3) {
        let p0 = samples[i].state.position_ecef;
        let p1 = samples[i + 1].state.position_ecef;
        let p2 = samples[i + 2].state.position_ecef;
        let t0 = samples[i].time;
        let t1 = samples[i + 1].time;
        let t2 = samples[i + 2].time;

        let dt0 = (t1 - t0).num_milliseconds() as f64 / 1000.0;
        let v0 = (p1 - p0) / dt0;
        let speed = v0.norm();

        let q_i = if speed <= EPS_SPEED {
            let (lat, lon, _) = ellipsoid::ecef_to_geodetic(p0);
            hpr_to_world_quat(lat, lon, 0.0, 0.0, 0.0)
        } else {
            let v0_hat = v0 / speed;
            let r0 = rotation_from_position_velocity(p0, v0_hat);
            let q0 = Quat::from_matrix(r0);

            let mut roll = 0.0;
            if with_roll {
                let dt1 = (t2 - t1).num_milliseconds() as f64 / 1000.0;
                let v1 = (p2 - p1) / dt1;
                let speed1 = v1.norm();
                if speed1 > EPS_SPEED {
                    let v1_hat = v1 / speed1;
                    let r1 = rotation_from_position_velocity(p1, v1_hat);
                    let q1 = Quat::from_matrix(r1);
                    roll = compute_roll(p0, q0, p1, q1, speed, dt0, &mut last_roll);
                }
            }

            let q_rot = Quat::from_axis_angle(v0_hat, roll);
            q_rot * q0
        };

        samples[i].state.orientation = Some(q_i);
        last_q = q_i;
    }

    samples[n - 2].state.orientation = Some(last_q);
    samples[n - 1].state.orientation = Some(last_q);
}

/// Columns `(v̂, right, up)`: `up` starts as the ellipsoid surface normal,
/// `right := up × v̂` normalized, then `up` is re-orthogonalized as `v̂ × right`.
fn rotation_from_position_velocity(p: Vec3, v_hat: Vec3) -> Mat3 {
    let up_initial = ellipsoid::surface_normal(p);
    let right = up_initial.cross(v_hat).normalized();
    let up = v_hat.cross(right);
    Mat3::from_cols(v_hat, right, up)
}

/// Coordinated-turn approximation of bank angle from two consecutive
/// heading samples, exponentially smoothed against `last_roll`.
fn compute_roll(p0: Vec3, q0: Quat, p1: Vec3, q1: Quat, speed: f64, dt: f64, last_roll: &mut f64) -> f64 {
    let (lat0, lon0, _) = ellipsoid::ecef_to_geodetic(p0);
    let (lat1, lon1, _) = ellipsoid::ecef_to_geodetic(p1);

    let forward0 = q0.rotate(Vec3::new(1.0, 0.0, 0.0));
    let forward1 = q1.rotate(Vec3::new(1.0, 0.0, 0.0));

    let h0 = local_heading(lat0, lon0, forward0).rem_euclid(std::f64::consts::TAU);
    let h1 = local_heading(lat1, lon1, forward1).rem_euclid(std::f64::consts::TAU);

    let mut delta = h1 - h0;
    if delta.abs() > std::f64::consts::PI {
        let angle = std::f64::consts::TAU - delta.abs();
        delta = if delta > 0.0 { -angle } else { angle };
    }

    let raw = (speed * delta / (GRAVITY * dt)).atan();
    let smooth = ROLL_SMOOTHING_ALPHA * raw + (1.0 - ROLL_SMOOTHING_ALPHA) * *last_roll;
    let smooth = if smooth.abs() < ONE_DEGREE { 0.0 } else { smooth };
    *last_roll = smooth;
    smooth
}

/// Compass-style heading (radians, clockwise from north) of `v_hat` in the
/// local NWU frame at `(lat, lon)`.
fn local_heading(lat: f64, lon: f64, v_hat: Vec3) -> f64 {
    let frame = ellipsoid::local_frame_nwu(lat, lon);
    let north = frame.col(0);
    let west = frame.col(1);
    let north_component = v_hat.dot(north);
    let east_component = -v_hat.dot(west);
    east_component.atan2(north_component)
}
