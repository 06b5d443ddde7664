//! Unit types for physical quantities.
//!
//! Configuration is written in the units machinists use (mm, mm/min,
//! mm/sec²). The planner works in mm and mm/min throughout, so acceleration
//! is converted to mm/min² once when settings are derived.

use core::ops::{Add, Mul, Sub};

use serde::Deserialize;

use crate::error::ConfigError;

/// Seconds per minute squared; converts mm/sec² to mm/min².
pub const SEC_PER_MIN_SQR: f32 = 60.0 * 60.0;

/// Linear distance in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Millimeters(pub f32);

impl Millimeters {
    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Add for Millimeters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Millimeters {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Feed rate in millimeters per minute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct MmPerMin(pub f32);

impl MmPerMin {
    /// Create a new MmPerMin value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Mul<f32> for MmPerMin {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Acceleration in millimeters per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct MmPerSec2(pub f32);

impl MmPerSec2 {
    /// Create a new MmPerSec2 value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Convert to mm/min², the unit the planner computes in.
    #[inline]
    pub fn to_mm_per_min2(self) -> f32 {
        self.0 * SEC_PER_MIN_SQR
    }
}

/// Axis resolution in steps per millimeter.
///
/// Validated at construction to be finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepsPerMm(f32);

impl StepsPerMm {
    /// Create a new StepsPerMm value with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidStepsPerMm` if the value is not a
    /// positive finite number. The axis index is reported as 0; callers that
    /// know the axis re-tag the error.
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if Self::is_valid(value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidStepsPerMm { axis: 0, value })
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Check if a value is valid.
    #[inline]
    pub fn is_valid(value: f32) -> bool {
        value.is_finite() && value > 0.0
    }

    /// Convert a position in millimeters to the nearest whole step.
    #[inline]
    pub fn mm_to_steps(self, mm: f32) -> i32 {
        libm::roundf(mm * self.0) as i32
    }

    /// Convert a step count to millimeters.
    #[inline]
    pub fn steps_to_mm(self, steps: i32) -> f32 {
        steps as f32 / self.0
    }
}

impl Default for StepsPerMm {
    fn default() -> Self {
        Self(250.0)
    }
}

impl TryFrom<f32> for StepsPerMm {
    type Error = ConfigError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for StepsPerMm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = f32::deserialize(deserializer)?;
        StepsPerMm::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_per_mm_rejects_non_positive() {
        assert!(StepsPerMm::new(250.0).is_ok());
        assert!(StepsPerMm::new(0.0).is_err());
        assert!(StepsPerMm::new(-80.0).is_err());
        assert!(StepsPerMm::new(f32::NAN).is_err());
        assert!(StepsPerMm::new(f32::INFINITY).is_err());
    }

    #[test]
    fn test_mm_to_steps_rounds_to_nearest() {
        let spm = StepsPerMm::new(80.0).unwrap();
        assert_eq!(spm.mm_to_steps(10.0), 800);
        assert_eq!(spm.mm_to_steps(0.0124), 1);
        assert_eq!(spm.mm_to_steps(-0.0124), -1);
        assert_eq!(spm.mm_to_steps(0.006), 0);
    }

    #[test]
    fn test_steps_to_mm() {
        let spm = StepsPerMm::new(250.0).unwrap();
        assert!((spm.steps_to_mm(2500) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_acceleration_to_per_minute() {
        let a = MmPerSec2::new(10.0);
        assert!((a.to_mm_per_min2() - 36_000.0).abs() < 1e-3);
    }
}
