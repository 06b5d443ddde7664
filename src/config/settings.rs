//! Planner settings derived from machine configuration.

use super::machine::MachineConfig;
use super::units::StepsPerMm;
use crate::N_AXIS;

/// Derived planner parameters computed from machine configuration.
///
/// These are computed once at initialization and read by every planning
/// call. Rates are in mm/min and accelerations in mm/min².
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlannerSettings {
    /// Resolution of each axis.
    pub steps_per_mm: [StepsPerMm; N_AXIS],

    /// Maximum rate per axis in mm/min.
    pub max_rate: [f32; N_AXIS],

    /// Maximum acceleration per axis in mm/min².
    pub acceleration: [f32; N_AXIS],

    /// Junction deviation in mm.
    pub junction_deviation: f32,
}

impl PlannerSettings {
    /// Compute planner settings from machine configuration.
    pub fn from_config(config: &MachineConfig) -> Self {
        let mut steps_per_mm = [StepsPerMm::default(); N_AXIS];
        let mut max_rate = [0.0; N_AXIS];
        let mut acceleration = [0.0; N_AXIS];

        for (idx, axis) in config.axes.iter().enumerate() {
            steps_per_mm[idx] = axis.steps_per_mm;
            max_rate[idx] = axis.max_rate.0;
            acceleration[idx] = axis.acceleration.to_mm_per_min2();
        }

        Self {
            steps_per_mm,
            max_rate,
            acceleration,
            junction_deviation: config.junction_deviation.0,
        }
    }

    /// Convert an absolute position in mm to steps on every axis.
    #[inline]
    pub fn mm_to_steps(&self, target: &[f32; N_AXIS]) -> [i32; N_AXIS] {
        let mut steps = [0; N_AXIS];
        for idx in 0..N_AXIS {
            steps[idx] = self.steps_per_mm[idx].mm_to_steps(target[idx]);
        }
        steps
    }

    /// Convert a step position on every axis to mm.
    #[inline]
    pub fn steps_to_mm(&self, steps: &[i32; N_AXIS]) -> [f32; N_AXIS] {
        let mut mm = [0.0; N_AXIS];
        for idx in 0..N_AXIS {
            mm[idx] = self.steps_per_mm[idx].steps_to_mm(steps[idx]);
        }
        mm
    }
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self::from_config(&MachineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::{MmPerMin, MmPerSec2};
    use crate::config::AxisConfig;

    fn make_test_config() -> MachineConfig {
        let mut config = MachineConfig::default();
        config.axes[2] = AxisConfig::new("Z", StepsPerMm::new(400.0).unwrap(), MmPerMin(300.0), MmPerSec2(5.0));
        config
    }

    #[test]
    fn test_acceleration_is_per_minute_squared() {
        let settings = PlannerSettings::from_config(&make_test_config());

        // 10 mm/s² * 3600 = 36000 mm/min²
        assert!((settings.acceleration[0] - 36_000.0).abs() < 1e-3);
        assert!((settings.acceleration[2] - 18_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_rates_copied_per_axis() {
        let settings = PlannerSettings::from_config(&make_test_config());
        assert_eq!(settings.max_rate, [500.0, 500.0, 300.0, 500.0]);
        assert!((settings.junction_deviation - 0.01).abs() < 1e-7);
    }

    #[test]
    fn test_position_conversion() {
        let settings = PlannerSettings::from_config(&make_test_config());
        let steps = settings.mm_to_steps(&[1.0, -2.0, 0.5, 0.0]);
        assert_eq!(steps, [250, -500, 200, 0]);

        let mm = settings.steps_to_mm(&steps);
        assert!((mm[1] + 2.0).abs() < 1e-6);
        assert!((mm[2] - 0.5).abs() < 1e-6);
    }
}
