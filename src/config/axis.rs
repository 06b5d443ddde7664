//! Per-axis configuration from TOML.

use heapless::String;
use serde::Deserialize;

use super::units::{MmPerMin, MmPerSec2, StepsPerMm};

/// Complete axis configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Axis letter or short label (max 8 chars).
    pub name: String<8>,

    /// Steps the drive takes to move the axis one millimeter.
    pub steps_per_mm: StepsPerMm,

    /// Maximum traverse rate in millimeters per minute.
    #[serde(rename = "max_rate_mm_per_min")]
    pub max_rate: MmPerMin,

    /// Maximum acceleration in millimeters per second squared.
    #[serde(rename = "acceleration_mm_per_sec2")]
    pub acceleration: MmPerSec2,
}

impl AxisConfig {
    /// Create an axis configuration.
    ///
    /// Names longer than 8 characters are truncated.
    pub fn new(name: &str, steps_per_mm: StepsPerMm, max_rate: MmPerMin, acceleration: MmPerSec2) -> Self {
        let mut label = String::new();
        for c in name.chars() {
            if label.push(c).is_err() {
                break;
            }
        }
        Self {
            name: label,
            steps_per_mm,
            max_rate,
            acceleration,
        }
    }

    /// Shortest time, in minutes, to reach the max rate from rest.
    pub fn time_to_max_rate(&self) -> f32 {
        self.max_rate.0 / self.acceleration.to_mm_per_min2()
    }
}
