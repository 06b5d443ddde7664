//! Planner state carried from one queued block to the next.

use crate::N_AXIS;

/// Feed override at 100%.
pub const DEFAULT_FEED_OVERRIDE: u8 = 100;
/// Lowest feed override.
pub const MIN_FEED_OVERRIDE: u8 = 10;
/// Highest feed override.
pub const MAX_FEED_OVERRIDE: u8 = 200;

/// Rapid override at 100%.
pub const DEFAULT_RAPID_OVERRIDE: u8 = 100;
/// Medium rapid override.
pub const RAPID_OVERRIDE_MEDIUM: u8 = 50;
/// Low rapid override; also the floor.
pub const RAPID_OVERRIDE_LOW: u8 = 25;

/// Runtime speed overrides, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Overrides {
    /// Scales the programmed feed rate of feed moves.
    pub feed: u8,
    /// Scales the rapid rate of rapid moves.
    pub rapid: u8,
}

impl Overrides {
    /// Feed override as a factor.
    #[inline]
    pub fn feed_factor(&self) -> f32 {
        0.01 * self.feed as f32
    }

    /// Rapid override as a factor.
    #[inline]
    pub fn rapid_factor(&self) -> f32 {
        0.01 * self.rapid as f32
    }
}

impl Default for Overrides {
    fn default() -> Self {
        Self {
            feed: DEFAULT_FEED_OVERRIDE,
            rapid: DEFAULT_RAPID_OVERRIDE,
        }
    }
}

/// Producer-side planner state.
///
/// `position` is the planner's own idea of where the tool ends up after
/// the last queued block, in absolute steps. It is kept apart from any
/// program-level position so multi-block moves (arcs, canned cycles)
/// accumulate without rounding drift.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlannerState {
    pub(crate) position: [i32; N_AXIS],
    pub(crate) previous_unit_vec: [f32; N_AXIS],
    pub(crate) previous_nominal_speed: f32,
    pub(crate) overrides: Overrides,
}

impl PlannerState {
    /// Planner position in absolute steps.
    #[inline]
    pub fn position(&self) -> &[i32; N_AXIS] {
        &self.position
    }

    /// Direction of the last queued block.
    #[inline]
    pub fn previous_unit_vec(&self) -> &[f32; N_AXIS] {
        &self.previous_unit_vec
    }

    /// Nominal speed of the last queued block, in mm/min.
    #[inline]
    pub fn previous_nominal_speed(&self) -> f32 {
        self.previous_nominal_speed
    }

    /// Active overrides.
    #[inline]
    pub fn overrides(&self) -> Overrides {
        self.overrides
    }

    /// Back to the origin with overrides at 100%.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_overrides_are_unity() {
        let o = Overrides::default();
        assert!((o.feed_factor() - 1.0).abs() < 1e-6);
        assert!((o.rapid_factor() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut state = PlannerState {
            position: [1, 2, 3, 4],
            previous_unit_vec: [1.0, 0.0, 0.0, 0.0],
            previous_nominal_speed: 300.0,
            overrides: Overrides { feed: 50, rapid: 25 },
        };
        state.reset();
        assert_eq!(state.position, [0; N_AXIS]);
        assert_eq!(state.previous_nominal_speed, 0.0);
        assert_eq!(state.overrides, Overrides::default());
    }
}
