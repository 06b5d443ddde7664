//! Junction speed limits from the direction change between two blocks.
//!
//! The corner is modelled as a circular arc tangent to both segments whose
//! closest point lies `junction_deviation` from the sharp corner. The
//! junction speed is the speed at which the centripetal acceleration on that
//! arc equals the acceleration available in the direction of the turn. No
//! trig calls are needed: `sin(θ/2)` comes from the half-angle identity.

use libm::{fabsf, sqrtf};

use super::{MINIMUM_JUNCTION_SPEED, SOME_LARGE_VALUE};
use crate::N_AXIS;

/// Normalize `vector` in place and return its original magnitude.
///
/// A zero vector is left as zeros.
pub fn unit_vector(vector: &mut [f32; N_AXIS]) -> f32 {
    let mut magnitude_sqr = 0.0;
    for v in vector.iter() {
        magnitude_sqr += v * v;
    }
    let magnitude = sqrtf(magnitude_sqr);
    if magnitude > 0.0 {
        let inv_magnitude = 1.0 / magnitude;
        for v in vector.iter_mut() {
            *v *= inv_magnitude;
        }
    }
    magnitude
}

/// Largest value along `unit_vec` such that no axis component exceeds its
/// own maximum in `max_value`.
///
/// Axes that do not move along `unit_vec` impose no limit.
pub fn limit_by_axis_maximum(max_value: &[f32; N_AXIS], unit_vec: &[f32; N_AXIS]) -> f32 {
    let mut limit = SOME_LARGE_VALUE;
    for (max, component) in max_value.iter().zip(unit_vec.iter()) {
        if *component != 0.0 {
            let axis_limit = fabsf(max / component);
            if axis_limit < limit {
                limit = axis_limit;
            }
        }
    }
    limit
}

/// Maximum junction speed² between a block heading along
/// `previous_unit_vec` and the next heading along `unit_vec`.
///
/// - Straight continuation: [`SOME_LARGE_VALUE`]; nominal speeds bound it.
/// - Full reversal: [`MINIMUM_JUNCTION_SPEED`]², a full stop.
/// - Otherwise `a·δ·sin(θ/2) / (1 - sin(θ/2))`, never below the minimum.
pub fn max_junction_speed_sqr(
    previous_unit_vec: &[f32; N_AXIS],
    unit_vec: &[f32; N_AXIS],
    acceleration: &[f32; N_AXIS],
    junction_deviation: f32,
) -> f32 {
    // cos θ of the corner angle: θ = 180° for a straight line, 0° for a
    // reversal. The dot product of the directions is -cos θ.
    let mut junction_cos_theta = 0.0;
    let mut junction_unit_vec = [0.0; N_AXIS];
    for idx in 0..N_AXIS {
        junction_cos_theta -= previous_unit_vec[idx] * unit_vec[idx];
        junction_unit_vec[idx] = unit_vec[idx] - previous_unit_vec[idx];
    }

    let min_sqr = MINIMUM_JUNCTION_SPEED * MINIMUM_JUNCTION_SPEED;
    if junction_cos_theta > 0.999_999 {
        return min_sqr;
    }
    if junction_cos_theta < -0.999_999 {
        return SOME_LARGE_VALUE;
    }

    unit_vector(&mut junction_unit_vec);
    let junction_acceleration = limit_by_axis_maximum(acceleration, &junction_unit_vec);
    // Always positive.
    let sin_theta_d2 = sqrtf(0.5 * (1.0 - junction_cos_theta));
    let limit = (junction_acceleration * junction_deviation * sin_theta_d2) / (1.0 - sin_theta_d2);

    if limit > min_sqr {
        limit
    } else {
        min_sqr
    }
}
