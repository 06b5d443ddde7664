//! Per-block velocity profile.
//!
//! Turns a planned block (entry speed, exit speed, nominal speed,
//! acceleration and length) into the distances where it ramps and cruises.
//! Speeds are in mm/min, acceleration in mm/min², distances in mm.

use libm::{fabsf, sqrtf};

/// Current phase of motion execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Speeding up towards the cruise speed or the exit speed.
    Accelerating,
    /// Moving at constant cruise speed.
    Cruising,
    /// Slowing down, either to the exit speed or from an entry speed above
    /// the (overridden) nominal speed.
    Decelerating,
    /// Block fully traversed.
    Complete,
}

/// Shape of a block's speed profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileShape {
    /// Accelerate, cruise at the nominal speed, decelerate. Any phase may
    /// be empty.
    Trapezoid,
    /// Accelerate straight into deceleration without reaching nominal.
    Triangle,
    /// Entered above the nominal speed, e.g. after lowering an override:
    /// decelerate to nominal first.
    DecelOverride,
    /// Accelerating over the whole block.
    AccelOnly,
    /// Decelerating over the whole block.
    DecelOnly,
}

/// Computed speed profile for one block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockProfile {
    /// Block length in mm.
    pub millimeters: f32,

    /// Speed at the start of the block.
    pub entry_speed: f32,

    /// Highest (or, for a deceleration override, cruise) speed reached.
    pub peak_speed: f32,

    /// Speed at the end of the block.
    pub exit_speed: f32,

    /// Acceleration in mm/min².
    pub acceleration: f32,

    /// Distance from the start where the first ramp ends.
    pub ramp_up_until: f32,

    /// Distance from the start where the final deceleration begins.
    pub ramp_down_after: f32,

    /// Profile shape.
    pub shape: ProfileShape,
}

impl BlockProfile {
    /// Build the profile of a block.
    ///
    /// `entry_speed_sqr` and `exit_speed_sqr` come from the planner and are
    /// always reachable; `nominal_speed` is the cruise ceiling.
    pub fn new(
        entry_speed_sqr: f32,
        exit_speed_sqr: f32,
        nominal_speed: f32,
        acceleration: f32,
        millimeters: f32,
    ) -> Self {
        if millimeters <= 0.0 || acceleration <= 0.0 {
            return Self::zero();
        }

        let entry_speed_sqr = entry_speed_sqr.max(0.0);
        let exit_speed_sqr = exit_speed_sqr.max(0.0);
        let nominal_speed_sqr = nominal_speed * nominal_speed;
        let inv_2_accel = 0.5 / acceleration;

        let mut profile = Self {
            millimeters,
            entry_speed: sqrtf(entry_speed_sqr),
            peak_speed: nominal_speed,
            exit_speed: sqrtf(exit_speed_sqr),
            acceleration,
            ramp_up_until: 0.0,
            ramp_down_after: millimeters,
            shape: ProfileShape::Trapezoid,
        };

        let decelerate_length = (nominal_speed_sqr - exit_speed_sqr) * inv_2_accel;

        if entry_speed_sqr > nominal_speed_sqr {
            // Slow down to nominal first.
            let override_length = (entry_speed_sqr - nominal_speed_sqr) * inv_2_accel;
            if override_length >= millimeters {
                profile.shape = ProfileShape::DecelOnly;
                profile.peak_speed = profile.entry_speed;
                profile.ramp_down_after = 0.0;
                profile.exit_speed =
                    sqrtf((entry_speed_sqr - 2.0 * acceleration * millimeters).max(0.0));
            } else {
                profile.shape = ProfileShape::DecelOverride;
                profile.ramp_up_until = override_length;
                profile.ramp_down_after = (millimeters - decelerate_length).max(override_length);
            }
            return profile;
        }

        let accelerate_length = (nominal_speed_sqr - entry_speed_sqr) * inv_2_accel;
        if accelerate_length + decelerate_length <= millimeters {
            profile.ramp_up_until = accelerate_length;
            profile.ramp_down_after = millimeters - decelerate_length;
            return profile;
        }

        // Nominal speed not reachable: find where the ramps meet.
        let intersect = 0.5 * (millimeters + inv_2_accel * (exit_speed_sqr - entry_speed_sqr));
        if intersect <= 0.0 {
            profile.shape = ProfileShape::DecelOnly;
            profile.peak_speed = profile.entry_speed;
            profile.ramp_down_after = 0.0;
        } else if intersect >= millimeters {
            profile.shape = ProfileShape::AccelOnly;
            profile.peak_speed = profile.exit_speed;
            profile.ramp_up_until = millimeters;
            profile.ramp_down_after = millimeters;
        } else {
            profile.shape = ProfileShape::Triangle;
            profile.peak_speed = sqrtf(entry_speed_sqr + 2.0 * acceleration * intersect);
            profile.ramp_up_until = intersect;
            profile.ramp_down_after = intersect;
        }
        profile
    }

    /// A zero-length profile (no motion).
    pub fn zero() -> Self {
        Self {
            millimeters: 0.0,
            entry_speed: 0.0,
            peak_speed: 0.0,
            exit_speed: 0.0,
            acceleration: 0.0,
            ramp_up_until: 0.0,
            ramp_down_after: 0.0,
            shape: ProfileShape::Trapezoid,
        }
    }

    /// Check if this is a zero-length profile.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.millimeters <= 0.0
    }

    /// Length of the constant-speed section.
    #[inline]
    pub fn cruise_length(&self) -> f32 {
        self.ramp_down_after - self.ramp_up_until
    }

    /// Get the phase at `distance` mm into the block.
    pub fn phase_at(&self, distance: f32) -> MotionPhase {
        if distance >= self.millimeters {
            MotionPhase::Complete
        } else if distance < self.ramp_up_until {
            if self.shape == ProfileShape::DecelOverride {
                MotionPhase::Decelerating
            } else {
                MotionPhase::Accelerating
            }
        } else if distance < self.ramp_down_after {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }

    /// Speed at `distance` mm into the block.
    pub fn speed_at(&self, distance: f32) -> f32 {
        let distance = distance.clamp(0.0, self.millimeters);
        let entry_sqr = self.entry_speed * self.entry_speed;
        let peak_sqr = self.peak_speed * self.peak_speed;
        let two_a = 2.0 * self.acceleration;

        let speed_sqr = if distance < self.ramp_up_until {
            if self.shape == ProfileShape::DecelOverride {
                entry_sqr - two_a * distance
            } else {
                entry_sqr + two_a * distance
            }
        } else if distance < self.ramp_down_after {
            peak_sqr
        } else {
            peak_sqr - two_a * (distance - self.ramp_down_after)
        };
        sqrtf(speed_sqr.max(0.0))
    }

    /// Estimate the time to traverse the block, in minutes.
    pub fn estimated_duration_min(&self) -> f32 {
        if self.is_zero() {
            return 0.0;
        }

        // Ramps: Δv / a
        let ramp_up = if self.ramp_up_until > 0.0 {
            fabsf(self.peak_speed - self.entry_speed) / self.acceleration
        } else {
            0.0
        };
        let ramp_down = if self.ramp_down_after < self.millimeters {
            fabsf(self.peak_speed - self.exit_speed) / self.acceleration
        } else {
            0.0
        };
        let cruise = if self.peak_speed > 0.0 {
            self.cruise_length() / self.peak_speed
        } else {
            0.0
        };

        ramp_up + cruise + ramp_down
    }
}
