//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::{AxisConfig, MachineConfig};

/// Validate a machine configuration.
///
/// Checks:
/// - Steps per mm, max rate and acceleration are positive on every axis
/// - Junction deviation is not negative
///
/// A zero acceleration would make every block unplannable, so it is caught
/// here rather than inside the planner.
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    for (idx, axis) in config.axes.iter().enumerate() {
        validate_axis(idx, axis)?;
    }

    let deviation = config.junction_deviation.0;
    if !deviation.is_finite() || deviation < 0.0 {
        return Err(Error::Config(ConfigError::InvalidJunctionDeviation(deviation)));
    }

    Ok(())
}

fn validate_axis(idx: usize, axis: &AxisConfig) -> Result<()> {
    let steps_per_mm = axis.steps_per_mm.value();
    if !super::units::StepsPerMm::is_valid(steps_per_mm) {
        return Err(Error::Config(ConfigError::InvalidStepsPerMm {
            axis: idx,
            value: steps_per_mm,
        }));
    }

    if !axis.max_rate.0.is_finite() || axis.max_rate.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidMaxRate {
            axis: idx,
            value: axis.max_rate.0,
        }));
    }

    if !axis.acceleration.0.is_finite() || axis.acceleration.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration {
            axis: idx,
            value: axis.acceleration.0,
        }));
    }

    Ok(())
}
